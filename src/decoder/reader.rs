//! Registry dump reader.

use encoding_rs::Encoding;
use std::io::Read;

use super::codepage::DecodingReader;
use crate::record::Record;
use crate::Result;

/// Field separator of the registry dump.
pub const FIELD_DELIMITER: u8 = b';';

/// One parsed line of the registry dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A well-formed record
    Record(Record),
    /// A line with the wrong number of fields, as read
    Ignored(Vec<String>),
}

/// Lazy reader of registry dump entries.
///
/// Decodes the input from its legacy codepage, then splits it into
/// `;`-separated fields with standard quoting rules. Quoted fields may
/// contain the separator or line breaks.
pub struct RecordReader<R: Read> {
    records: csv::StringRecordsIntoIter<DecodingReader<R>>,
}

impl<R: Read> RecordReader<R> {
    /// Create a reader over `input` encoded in `encoding`.
    pub fn new(input: R, encoding: &'static Encoding) -> Self {
        let records = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(DecodingReader::new(input, encoding))
            .into_records();
        Self { records }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let fields = match self.records.next()? {
            Ok(fields) => fields,
            Err(e) => return Some(Err(e.into())),
        };

        let fields: Vec<&str> = fields.iter().collect();
        let entry = match Record::from_fields(&fields[..]) {
            Some(record) => Entry::Record(record),
            None => Entry::Ignored(fields.into_iter().map(str::to_string).collect()),
        };
        Some(Ok(entry))
    }
}
