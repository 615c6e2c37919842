//! Streaming legacy codepage to UTF-8 conversion.

use encoding_rs::{Decoder, DecoderResult, Encoding};
use std::fmt;
use std::io::{self, Read};

/// Size of the raw and decoded staging buffers.
const BUFFER_SIZE: usize = 8 * 1024;

/// A byte sequence that is not valid in the source encoding.
///
/// Carried inside an [`io::Error`] of kind `InvalidData` so it can travel
/// through readers layered on top of [`DecodingReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    /// Name of the source encoding
    pub encoding: &'static str,
    /// Byte offset of the first malformed byte in the raw input
    pub offset: u64,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed {} sequence at byte offset {}",
            self.encoding, self.offset
        )
    }
}

impl std::error::Error for DecodeError {}

/// Reader adapter that transcodes its inner reader to UTF-8.
///
/// Malformed input is never replaced: the first malformed sequence fails
/// the read with a [`DecodeError`].
pub struct DecodingReader<R> {
    inner: R,
    encoding: &'static Encoding,
    decoder: Decoder,
    raw: Box<[u8]>,
    raw_start: usize,
    raw_end: usize,
    decoded: Box<[u8]>,
    decoded_start: usize,
    decoded_end: usize,
    /// Raw bytes handed to the decoder so far
    consumed: u64,
    /// Malformed input found after some bytes were already decoded
    pending: Option<DecodeError>,
    eof: bool,
    finished: bool,
}

impl<R: Read> DecodingReader<R> {
    /// Wrap `inner`, decoding it from `encoding`.
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            decoder: encoding.new_decoder_without_bom_handling(),
            raw: vec![0; BUFFER_SIZE].into_boxed_slice(),
            raw_start: 0,
            raw_end: 0,
            decoded: vec![0; BUFFER_SIZE].into_boxed_slice(),
            decoded_start: 0,
            decoded_end: 0,
            consumed: 0,
            pending: None,
            eof: false,
            finished: false,
        }
    }

    /// Decode the next chunk into the staging buffer.
    ///
    /// Leaves the staging buffer empty only at end of input.
    fn fill(&mut self) -> io::Result<()> {
        self.decoded_start = 0;
        self.decoded_end = 0;

        if let Some(e) = self.pending.take() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, e));
        }

        while self.decoded_end == 0 && !self.finished {
            if self.raw_start == self.raw_end && !self.eof {
                let n = match self.inner.read(&mut self.raw) {
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                self.raw_start = 0;
                self.raw_end = n;
                self.eof = n == 0;
            }

            let src = &self.raw[self.raw_start..self.raw_end];
            let (result, read, written) =
                self.decoder
                    .decode_to_utf8_without_replacement(src, &mut self.decoded, self.eof);
            self.raw_start += read;
            self.consumed += read as u64;
            self.decoded_end = written;

            match result {
                DecoderResult::InputEmpty => {
                    if self.eof {
                        self.finished = true;
                    }
                }
                DecoderResult::OutputFull => {}
                DecoderResult::Malformed(bad, after) => {
                    let e = DecodeError {
                        encoding: self.encoding.name(),
                        offset: self.consumed - u64::from(after) - u64::from(bad),
                    };
                    // Hand out what decoded cleanly before failing
                    if written > 0 {
                        self.pending = Some(e);
                        return Ok(());
                    }
                    return Err(io::Error::new(io::ErrorKind::InvalidData, e));
                }
            }
        }

        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.decoded_start == self.decoded_end {
            self.fill()?;
        }

        let available = &self.decoded[self.decoded_start..self.decoded_end];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.decoded_start += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1251};

    fn decode_all(bytes: &[u8], encoding: &'static Encoding) -> io::Result<String> {
        let mut out = String::new();
        DecodingReader::new(bytes, encoding).read_to_string(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_decode_windows_1251() {
        // "Роскомнадзор" in windows-1251
        let bytes = [
            0xD0, 0xEE, 0xF1, 0xEA, 0xEE, 0xEC, 0xED, 0xE0, 0xE4, 0xE7, 0xEE, 0xF0,
        ];
        assert_eq!(decode_all(&bytes, WINDOWS_1251).unwrap(), "Роскомнадзор");
    }

    #[test]
    fn test_ascii_passes_through() {
        let text = "1.2.3.4;example.com;;dept;x;2018-04-16\n";
        assert_eq!(decode_all(text.as_bytes(), WINDOWS_1251).unwrap(), text);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_all(b"", WINDOWS_1251).unwrap(), "");
    }

    #[test]
    fn test_input_larger_than_buffer() {
        // Every byte expands to two UTF-8 bytes
        let bytes = vec![0xC0u8; BUFFER_SIZE * 3 + 5];
        let text = decode_all(&bytes, WINDOWS_1251).unwrap();
        assert_eq!(text.chars().count(), bytes.len());
        assert!(text.chars().all(|c| c == 'А'));
    }

    #[test]
    fn test_small_reads() {
        let bytes = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]; // "Привет"
        let mut reader = DecodingReader::new(&bytes[..], WINDOWS_1251);
        let mut out = Vec::new();
        let mut buf = [0u8; 1];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "Привет");
    }

    #[test]
    fn test_clean_prefix_before_malformed_input() {
        let mut reader = DecodingReader::new(&b"abc\xFFdef"[..], UTF_8);
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert!(reader.read(&mut buf).is_err());
    }

    #[test]
    fn test_malformed_input_is_fatal() {
        let err = decode_all(b"abc\xFFdef", UTF_8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let inner = err
            .get_ref()
            .and_then(|e| e.downcast_ref::<DecodeError>())
            .copied()
            .unwrap();
        assert_eq!(inner.encoding, "UTF-8");
        assert_eq!(inner.offset, 3);
    }
}
