//! zi - transcode the blocked-resource registry dump into restore scripts.
//!
//! The registry dump is a `;`-separated, windows-1251 encoded file with one
//! blocked resource per line:
//!
//! ```text
//! addresses;domain;urls;authority;unclassified;date
//! ```
//!
//! Addresses and URLs are lists joined with ` | `. Each record becomes a
//! block of `##` comments plus address rules in one of two dialects:
//!
//! - **Set**: `add -! "<set>" "<address>" [timeout N]` lines for `ipset restore`
//! - **Chain**: batched `-A <chain> -d a,b,c,d -p tcp -j REDIRECT --to-port N`
//!   rules in the nat table for `iptables-restore -n`
//!
//! # Quick Start
//!
//! ```
//! use zi::{transcode, Config};
//!
//! let dump = b"1.2.3.4 | 10.0.0.0/8;example.com;;dept;x;2018-04-16\n";
//! let config = Config {
//!     entry_timeout: Some(3600),
//!     ..Config::default()
//! };
//!
//! let mut script = Vec::new();
//! let stats = transcode(&dump[..], &mut script, &config)?;
//! assert_eq!(stats.rules, 2);
//! # Ok::<(), zi::Error>(())
//! ```
//!
//! # Failure Model
//!
//! Lines with the wrong number of fields are skipped with a `# ignored
//! record` diagnostic, and URLs longer than the restore tools' line buffer
//! are truncated with a warning comment. Everything else (undecodable bytes,
//! read or write errors) aborts the run with an [`Error`].

mod config;
mod dialect;
mod error;
mod pipeline;

pub mod decoder;
pub mod emitter;
pub mod record;

// Re-export core types
pub use config::{Config, Preset, DEFAULT_CHAIN_NAME, DEFAULT_SET_NAME};
pub use dialect::{ChainSetup, Dialect};
pub use error::{Error, Result};
pub use record::Record;

// Re-export the pipeline
pub use emitter::{Emitter, Stats, Written};
pub use pipeline::transcode;
