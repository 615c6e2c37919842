//! Dump-to-script transcoding.

use log::info;
use std::io::{Read, Write};

use crate::decoder::{Entry, RecordReader};
use crate::emitter::{Emitter, Stats};
use crate::{Config, Result};

/// Transcode a registry dump from `input` into a restore script on `output`.
///
/// Records are decoded and emitted one at a time. The first fatal error
/// (undecodable input, read or write failure) aborts the run; whatever was
/// already written must then be discarded by the caller.
pub fn transcode<R: Read, W: Write>(input: R, output: W, config: &Config) -> Result<Stats> {
    config.validate()?;

    let mut emitter = Emitter::new(output, config);
    emitter.begin()?;

    for entry in RecordReader::new(input, config.encoding()?) {
        match entry? {
            Entry::Record(record) => emitter.emit(&record)?,
            Entry::Ignored(fields) => emitter.ignored(&fields)?,
        }
    }

    let (_, stats) = emitter.finish()?;
    info!(
        "Transcoded {} records ({} ignored) into {} {} rules for {}",
        stats.records,
        stats.ignored,
        stats.rules,
        config.dialect,
        config.target_name()
    );
    Ok(stats)
}
