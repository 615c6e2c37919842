//! Output dialects.

use serde::Deserialize;
use std::fmt;

/// Dialect of the generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `ipset restore` input: one `add` line per address
    #[default]
    Set,
    /// `iptables-restore -n` input: batched REDIRECT rules in a nat chain
    Chain,
}

impl Dialect {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Set => "set",
            Dialect::Chain => "chain",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a dialect (case-insensitive), accepting the tool names as aliases.
///
/// The error is a message, as clap shows it to the user.
impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "set" | "ipset" => Ok(Dialect::Set),
            "chain" | "iptables" => Ok(Dialect::Chain),
            _ => Err(format!("unknown dialect: {}", s)),
        }
    }
}

/// How the chain dialect prepares its target chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainSetup {
    /// `:CHAIN - [0:0]`, creating the chain or flushing it if it exists
    #[default]
    Declare,
    /// `-F CHAIN`, flushing a chain that must already exist
    Flush,
}

impl ChainSetup {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainSetup::Declare => "declare",
            ChainSetup::Flush => "flush",
        }
    }
}

impl fmt::Display for ChainSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a chain setup (case-insensitive); `create` is an alias of `declare`.
///
/// The error is a message, as clap shows it to the user.
impl std::str::FromStr for ChainSetup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "declare" | "create" => Ok(ChainSetup::Declare),
            "flush" => Ok(ChainSetup::Flush),
            _ => Err(format!("unknown chain setup: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("set".parse::<Dialect>(), Ok(Dialect::Set));
        assert_eq!("IPSET".parse::<Dialect>(), Ok(Dialect::Set));
        assert_eq!("Chain".parse::<Dialect>(), Ok(Dialect::Chain));
        assert_eq!("iptables".parse::<Dialect>(), Ok(Dialect::Chain));
        assert!("nft".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_dialect_display() {
        assert_eq!(Dialect::Set.to_string(), "set");
        assert_eq!(Dialect::Chain.to_string(), "chain");
    }

    #[test]
    fn test_chain_setup_from_str() {
        assert_eq!("declare".parse::<ChainSetup>(), Ok(ChainSetup::Declare));
        assert_eq!("create".parse::<ChainSetup>(), Ok(ChainSetup::Declare));
        assert_eq!("FLUSH".parse::<ChainSetup>(), Ok(ChainSetup::Flush));
        assert!("drop".parse::<ChainSetup>().is_err());
        assert_eq!(ChainSetup::default(), ChainSetup::Declare);
    }
}
