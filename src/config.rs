//! Transcoding configuration.

use encoding_rs::Encoding;
use serde::Deserialize;
use std::path::Path;

use crate::{ChainSetup, Dialect, Error, Result};

/// Default ipset name.
pub const DEFAULT_SET_NAME: &str = "zapret-info";

/// Default nat chain name.
pub const DEFAULT_CHAIN_NAME: &str = "ZAPRET-INFO";

/// Default number of destinations per REDIRECT rule.
pub const DEFAULT_MAX_ADDRESSES_PER_RULE: usize = 4;

/// Default local port for REDIRECT rules.
pub const DEFAULT_REDIRECT_PORT: u16 = 9040;

/// Default codepage of the registry dump.
pub const DEFAULT_ENCODING: &str = "windows-1251";

/// Named policy configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Populate an ipset
    Ipset,
    /// Declare a nat chain of REDIRECT rules, leave hooking it up to the admin
    Redirect,
    /// Declare a nat chain and jump to it from PREROUTING and OUTPUT
    RedirectSpliced,
    /// Refill an existing nat chain
    RedirectFlush,
}

impl Preset {
    /// Get the name of this preset.
    pub fn name(&self) -> &'static str {
        match self {
            Preset::Ipset => "ipset",
            Preset::Redirect => "redirect",
            Preset::RedirectSpliced => "redirect-spliced",
            Preset::RedirectFlush => "redirect-flush",
        }
    }

    /// Parse a preset from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ipset" | "set" => Some(Preset::Ipset),
            "redirect" => Some(Preset::Redirect),
            "redirect-spliced" | "redirect_spliced" => Some(Preset::RedirectSpliced),
            "redirect-flush" | "redirect_flush" => Some(Preset::RedirectFlush),
            _ => None,
        }
    }

    /// Get the Config for this preset.
    pub fn config(&self) -> Config {
        let chain = Config {
            dialect: Dialect::Chain,
            ..Config::default()
        };
        match self {
            Preset::Ipset => Config::default(),
            Preset::Redirect => chain,
            Preset::RedirectSpliced => Config {
                splice: true,
                ..chain
            },
            Preset::RedirectFlush => Config {
                chain_setup: ChainSetup::Flush,
                ..chain
            },
        }
    }
}

/// Configuration of one transcoding run.
///
/// Read once before processing starts and handed to the emitter at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Output dialect
    pub dialect: Dialect,
    /// ipset or chain name; the dialect's default when `None`
    pub target_name: Option<String>,
    /// ipset entry timeout in seconds; the set's own default when `None`
    pub entry_timeout: Option<u64>,
    /// Destinations per REDIRECT rule (chain dialect)
    pub max_addresses_per_rule: usize,
    /// Local port for REDIRECT rules (chain dialect)
    pub redirect_port: u16,
    /// Chain preparation in the preamble (chain dialect)
    pub chain_setup: ChainSetup,
    /// Jump to the chain from PREROUTING and OUTPUT (chain dialect)
    pub splice: bool,
    /// WHATWG label of the input codepage
    pub encoding: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::Set,
            target_name: None,
            entry_timeout: None,
            max_addresses_per_rule: DEFAULT_MAX_ADDRESSES_PER_RULE,
            redirect_port: DEFAULT_REDIRECT_PORT,
            chain_setup: ChainSetup::Declare,
            splice: false,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl Config {
    /// Parse a config from YAML content.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Get the ipset or chain name, falling back to the dialect's default.
    pub fn target_name(&self) -> &str {
        match (&self.target_name, self.dialect) {
            (Some(name), _) => name.as_str(),
            (None, Dialect::Set) => DEFAULT_SET_NAME,
            (None, Dialect::Chain) => DEFAULT_CHAIN_NAME,
        }
    }

    /// Resolve the input codepage.
    pub fn encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(self.encoding.clone()))
    }

    /// Check the configuration for values the emitter cannot honor.
    pub fn validate(&self) -> Result<()> {
        let name = self.target_name();
        if name.is_empty() {
            return Err(Error::Config("target name is empty".to_string()));
        }

        if self.dialect == Dialect::Chain {
            // Chain names are bare tokens in iptables-restore input
            if name.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
                return Err(Error::Config(format!("invalid chain name: {:?}", name)));
            }
            if self.max_addresses_per_rule == 0 {
                return Err(Error::Config(
                    "max addresses per rule must be at least 1".to_string(),
                ));
            }
            if self.redirect_port == 0 {
                return Err(Error::Config("redirect port must not be 0".to_string()));
            }
        }

        self.encoding()?;
        Ok(())
    }
}
