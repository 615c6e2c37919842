//! Error types for zi.

use thiserror::Error;

use crate::decoder::DecodeError;

/// Error type for zi operations.
///
/// Every variant is fatal for the run. Per-record problems (wrong field
/// count, oversized URLs) are reported on the output stream instead.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error on the input or output stream
    #[error("IO error: {0}")]
    Io(std::io::Error),

    /// Input bytes are not valid in the declared codepage
    #[error("malformed {encoding} sequence at byte offset {offset}")]
    Decode {
        encoding: &'static str,
        offset: u64,
    },

    /// Delimited-text reader error
    #[error("CSV error: {0}")]
    Csv(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Unknown encoding label
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode {
            encoding: e.encoding,
            offset: e.offset,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        let decode = e
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<DecodeError>())
            .cloned();
        match decode {
            Some(d) => d.into(),
            None => Error::Io(e),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        if !e.is_io_error() {
            return Error::Csv(e.to_string());
        }
        match e.into_kind() {
            csv::ErrorKind::Io(io) => io.into(),
            other => Error::Csv(format!("{:?}", other)),
        }
    }
}

/// Result type alias for zi operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_decode_error_surfaces_through_io() {
        let io = io::Error::new(
            io::ErrorKind::InvalidData,
            DecodeError {
                encoding: "windows-1251",
                offset: 17,
            },
        );
        let csv_err = csv::Error::from(io);
        match Error::from(csv_err) {
            Error::Decode { encoding, offset } => {
                assert_eq!(encoding, "windows-1251");
                assert_eq!(offset, 17);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_plain_io_error_stays_io() {
        let io = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        assert!(matches!(Error::from(csv::Error::from(io)), Error::Io(_)));
    }
}
