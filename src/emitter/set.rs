//! ipset dialect.

use std::io::{self, Write};

use super::{AddressRules, Written};

/// Emits one idempotent `add -!` line per address.
///
/// ```text
/// add -! "zapret-info" "1.2.3.4" timeout 3600
/// ```
pub struct SetRules {
    name: String,
    timeout: Option<u64>,
}

impl SetRules {
    /// Create rules for the named set.
    ///
    /// Without a timeout the set's own default applies.
    pub fn new(name: impl Into<String>, timeout: Option<u64>) -> Self {
        Self {
            name: name.into(),
            timeout,
        }
    }
}

impl AddressRules for SetRules {
    fn write_rules(&self, out: &mut dyn Write, addresses: &[String]) -> io::Result<Written> {
        for addr in addresses {
            write!(out, "add -! {} {}", quote(&self.name), quote(addr))?;
            if let Some(timeout) = self.timeout {
                write!(out, " timeout {}", timeout)?;
            }
            writeln!(out)?;
        }
        Ok(Written {
            rules: addresses.len(),
            addresses: addresses.len(),
        })
    }
}

/// Double-quote `s` so it reads back as one token on one line.
///
/// Backslashes and quotes are escaped, control characters become `\n`,
/// `\r`, `\t` or `\xNN`/`\u{NNNN}` escapes. Other characters pass through.
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() && c.is_ascii() => {
                quoted.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => quoted.push_str(&format!("\\u{{{:04x}}}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
