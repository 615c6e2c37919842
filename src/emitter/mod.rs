//! Script emission.
//!
//! Every record becomes a block of `##` comments followed by the address
//! rules of the configured [`Dialect`]:
//!
//! ```text
//! ## <authority> <date>
//! ## <unclassified>
//! ## <domain>                          (when present)
//! ## ERROR: URL below is too long      (when truncated)
//! ## <url>                             (one per URL)
//! <address rules>
//! ```
//!
//! Lines that did not parse into a record become a single `#` diagnostic.

mod chain;
mod set;

pub use chain::ChainRules;
pub use set::SetRules;

use log::{debug, warn};
use std::io::{self, Write};

use crate::record::Record;
use crate::{Config, Dialect, Result};

/// Longest URL comment payload in bytes.
///
/// ipset and iptables-restore read lines into a 1024 byte buffer; the
/// `## ` prefix and the newline take the rest.
pub const MAX_URL_LEN: usize = 1020;

/// Strategy for turning a record's addresses into rule lines.
pub trait AddressRules {
    /// Write whatever must precede the first record.
    fn preamble(&self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    /// Write the rules for one record's addresses.
    ///
    /// Every rule must stay on a single line. Addresses the dialect cannot
    /// express are skipped and left out of the returned count.
    fn write_rules(&self, out: &mut dyn Write, addresses: &[String]) -> io::Result<Written>;

    /// Write whatever must follow the last record.
    fn trailer(&self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

/// What [`AddressRules::write_rules`] wrote for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Written {
    /// Rule lines
    pub rules: usize,
    /// Addresses covered by those lines
    pub addresses: usize,
}

/// Counters for one transcoding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Records emitted
    pub records: usize,
    /// Lines skipped for having the wrong field count
    pub ignored: usize,
    /// Address rule lines written
    pub rules: usize,
    /// Addresses covered by those rules
    pub addresses: usize,
    /// URLs cut to [`MAX_URL_LEN`]
    pub truncated_urls: usize,
}

/// Writes the script for a stream of records.
pub struct Emitter<W: Write> {
    out: W,
    rules: Box<dyn AddressRules>,
    stats: Stats,
}

impl<W: Write> Emitter<W> {
    /// Create an emitter for the dialect selected in `config`.
    pub fn new(out: W, config: &Config) -> Self {
        let rules: Box<dyn AddressRules> = match config.dialect {
            Dialect::Set => Box::new(SetRules::new(
                config.target_name(),
                config.entry_timeout,
            )),
            Dialect::Chain => Box::new(ChainRules::from_config(config)),
        };
        Self::with_rules(out, rules)
    }

    /// Create an emitter with a custom address rule strategy.
    pub fn with_rules(out: W, rules: Box<dyn AddressRules>) -> Self {
        Self {
            out,
            rules,
            stats: Stats::default(),
        }
    }

    /// Write the preamble. Call once, before the first record.
    pub fn begin(&mut self) -> Result<()> {
        self.rules.preamble(&mut self.out)?;
        Ok(())
    }

    /// Write the comments and address rules for one record.
    pub fn emit(&mut self, record: &Record) -> Result<()> {
        write_comment(
            &mut self.out,
            &format!("{} {}", record.authority, record.date_added),
        )?;
        write_comment(&mut self.out, &record.unclassified)?;
        if !record.domain.is_empty() {
            write_comment(&mut self.out, &record.domain)?;
        }

        for url in &record.urls {
            let (url, truncated) = truncate(url, MAX_URL_LEN);
            if truncated {
                warn!(
                    "URL truncated to {} bytes: {}...",
                    MAX_URL_LEN,
                    truncate(url, 64).0
                );
                writeln!(self.out, "## ERROR: URL below is too long")?;
                self.stats.truncated_urls += 1;
            }
            write_comment(&mut self.out, url)?;
        }

        let written = self.rules.write_rules(&mut self.out, &record.addresses)?;
        self.stats.rules += written.rules;
        self.stats.addresses += written.addresses;
        self.stats.records += 1;
        Ok(())
    }

    /// Write the diagnostic for a line with the wrong field count.
    pub fn ignored(&mut self, fields: &[String]) -> Result<()> {
        debug!("Ignoring record with {} fields", fields.len());
        writeln!(
            self.out,
            "# ignored record ({} fields): {:?}",
            fields.len(),
            fields
        )?;
        self.stats.ignored += 1;
        Ok(())
    }

    /// Get the counters so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Write the trailer and flush the output.
    pub fn finish(mut self) -> Result<(W, Stats)> {
        self.rules.trailer(&mut self.out)?;
        self.out.flush()?;
        Ok((self.out, self.stats))
    }
}

/// Write a `##` data comment on a single line.
fn write_comment(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "## {}", sanitize(text))
}

/// Replace line breaks so text stays on one comment line.
fn sanitize(text: &str) -> std::borrow::Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        text.replace(['\r', '\n'], " ").into()
    } else {
        text.into()
    }
}

/// Cut `s` to at most `max` bytes without splitting a character.
fn truncate(s: &str, max: usize) -> (&str, bool) {
    if s.len() <= max {
        return (s, false);
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    (&s[..end], true)
}
