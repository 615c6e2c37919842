//! iptables nat chain dialect.

use log::debug;
use std::io::{self, Write};

use super::{AddressRules, Written};
use crate::{ChainSetup, Config};

/// Emits batched REDIRECT rules into a nat chain.
///
/// ```text
/// *nat
/// :ZAPRET-INFO - [0:0]
/// -A ZAPRET-INFO -d 1.2.3.4,5.6.7.8 -p tcp -j REDIRECT --to-port 9040
/// -A ZAPRET-INFO -j RETURN
/// COMMIT
/// ```
///
/// A single rule can only match a bounded number of destinations, so each
/// record's addresses are split into batches of `batch_size`. Addresses that
/// cannot be a bare `-d` list element (whitespace, commas, quotes, control
/// characters) are skipped with a `# ignored address` diagnostic.
pub struct ChainRules {
    chain: String,
    batch_size: usize,
    port: u16,
    setup: ChainSetup,
    splice: bool,
}

impl ChainRules {
    /// Create rules for the named chain.
    pub fn new(chain: impl Into<String>, batch_size: usize, port: u16) -> Self {
        Self {
            chain: chain.into(),
            batch_size: batch_size.max(1),
            port,
            setup: ChainSetup::Declare,
            splice: false,
        }
    }

    /// Create rules from the chain settings in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.target_name(),
            config.max_addresses_per_rule,
            config.redirect_port,
        )
        .with_setup(config.chain_setup)
        .with_splice(config.splice)
    }

    /// Set how the preamble prepares the chain.
    pub fn with_setup(mut self, setup: ChainSetup) -> Self {
        self.setup = setup;
        self
    }

    /// Jump to the chain from PREROUTING and OUTPUT in the trailer.
    pub fn with_splice(mut self, splice: bool) -> Self {
        self.splice = splice;
        self
    }
}

impl AddressRules for ChainRules {
    fn preamble(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "*nat")?;
        match self.setup {
            ChainSetup::Declare => writeln!(out, ":{} - [0:0]", self.chain),
            ChainSetup::Flush => writeln!(out, "-F {}", self.chain),
        }
    }

    fn write_rules(&self, out: &mut dyn Write, addresses: &[String]) -> io::Result<Written> {
        let mut usable = Vec::with_capacity(addresses.len());
        for addr in addresses {
            if is_list_element(addr) {
                usable.push(addr.as_str());
            } else {
                debug!("Skipping address unusable in a rule: {:?}", addr);
                writeln!(out, "# ignored address: {:?}", addr)?;
            }
        }

        let mut rules = 0;
        for batch in usable.chunks(self.batch_size) {
            writeln!(
                out,
                "-A {} -d {} -p tcp -j REDIRECT --to-port {}",
                self.chain,
                batch.join(","),
                self.port
            )?;
            rules += 1;
        }
        if rules > 1 {
            debug!("Split {} addresses into {} rules", usable.len(), rules);
        }
        Ok(Written {
            rules,
            addresses: usable.len(),
        })
    }

    fn trailer(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "-A {} -j RETURN", self.chain)?;
        if self.splice {
            writeln!(out, "-I PREROUTING -p tcp -j {}", self.chain)?;
            writeln!(out, "-I OUTPUT -p tcp -j {}", self.chain)?;
        }
        writeln!(out, "COMMIT")
    }
}

/// Check that `addr` can stand in a comma-joined `-d` list.
fn is_list_element(addr: &str) -> bool {
    !addr.is_empty()
        && !addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ',' | '"' | '\''))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("10.0.0.{}", i)).collect()
    }

    fn render_rules(rules: &ChainRules, addresses: &[String]) -> (Vec<String>, Written) {
        let mut out = Vec::new();
        let n = rules.write_rules(&mut out, addresses).unwrap();
        let text = String::from_utf8(out).unwrap();
        (text.lines().map(str::to_string).collect(), n)
    }

    #[test]
    fn test_batching() {
        let rules = ChainRules::new("ZAPRET-INFO", 4, 9040);
        let addrs = addresses(10);
        let (lines, n) = render_rules(&rules, &addrs);
        assert_eq!(n.rules, 3);
        assert_eq!(n.addresses, 10);
        assert_eq!(
            lines,
            vec![
                "-A ZAPRET-INFO -d 10.0.0.1,10.0.0.2,10.0.0.3,10.0.0.4 -p tcp -j REDIRECT --to-port 9040",
                "-A ZAPRET-INFO -d 10.0.0.5,10.0.0.6,10.0.0.7,10.0.0.8 -p tcp -j REDIRECT --to-port 9040",
                "-A ZAPRET-INFO -d 10.0.0.9,10.0.0.10 -p tcp -j REDIRECT --to-port 9040",
            ]
        );
    }

    #[test]
    fn test_exact_batch() {
        let rules = ChainRules::new("TOR", 2, 9050);
        let (lines, n) = render_rules(&rules, &addresses(2));
        assert_eq!(n.rules, 1);
        assert_eq!(
            lines[0],
            "-A TOR -d 10.0.0.1,10.0.0.2 -p tcp -j REDIRECT --to-port 9050"
        );
    }

    #[test]
    fn test_no_addresses() {
        let rules = ChainRules::new("TOR", 4, 9040);
        let (lines, n) = render_rules(&rules, &[]);
        assert!(lines.is_empty());
        assert_eq!(n, Written::default());
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        let rules = ChainRules::new("TOR", 0, 9040);
        let (_, n) = render_rules(&rules, &addresses(3));
        assert_eq!(n.rules, 3);
    }

    #[test]
    fn test_unusable_addresses_skipped() {
        let rules = ChainRules::new("ZAPRET-INFO", 2, 9040);
        let addrs: Vec<String> = [
            "10.0.0.1",
            "1.2.3.4\nflush zapret-info",
            "10.0.0.2,10.0.0.3",
            "10.0.0.4",
            "a b",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let (lines, n) = render_rules(&rules, &addrs);

        assert_eq!(
            lines,
            vec![
                "# ignored address: \"1.2.3.4\\nflush zapret-info\"",
                "# ignored address: \"10.0.0.2,10.0.0.3\"",
                "# ignored address: \"a b\"",
                "-A ZAPRET-INFO -d 10.0.0.1,10.0.0.4 -p tcp -j REDIRECT --to-port 9040",
            ]
        );
        assert_eq!(n.rules, 1);
        assert_eq!(n.addresses, 2);
    }

    #[test]
    fn test_is_list_element() {
        assert!(is_list_element("10.0.0.0/8"));
        assert!(is_list_element("2001:db8::1"));
        assert!(!is_list_element(""));
        assert!(!is_list_element("1.2.3.4\r"));
        assert!(!is_list_element("1.2.3.4,5.6.7.8"));
    }

    #[test]
    fn test_preamble() {
        let mut out = Vec::new();
        ChainRules::new("TOR", 4, 9040).preamble(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "*nat\n:TOR - [0:0]\n");

        let mut out = Vec::new();
        ChainRules::new("TOR", 4, 9040)
            .with_setup(ChainSetup::Flush)
            .preamble(&mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "*nat\n-F TOR\n");
    }

    #[test]
    fn test_trailer() {
        let mut out = Vec::new();
        ChainRules::new("TOR", 4, 9040).trailer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "-A TOR -j RETURN\nCOMMIT\n");

        let mut out = Vec::new();
        ChainRules::new("TOR", 4, 9040)
            .with_splice(true)
            .trailer(&mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "-A TOR -j RETURN\n\
             -I PREROUTING -p tcp -j TOR\n\
             -I OUTPUT -p tcp -j TOR\n\
             COMMIT\n"
        );
    }
}
