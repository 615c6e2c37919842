//! Registry dump decoding.
//!
//! The dump is `;`-separated text in a legacy single-byte codepage
//! (windows-1251). [`DecodingReader`] transcodes the raw bytes to UTF-8
//! and [`RecordReader`] splits the result into [`Entry`] values.

mod codepage;
mod reader;

pub use codepage::{DecodeError, DecodingReader};
pub use reader::{Entry, RecordReader, FIELD_DELIMITER};
