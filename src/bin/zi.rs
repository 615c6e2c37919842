//! zi: generate `ipset restore` / `iptables-restore -n` input from the registry dump.
//!
//! ```text
//! ipset create zapret-info hash:net maxelem 16777216
//! zi <dump.csv | ipset restore
//!
//! zi --preset redirect-spliced -i dump.csv | iptables-restore -n
//! ```

use clap::Parser;
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use zi::{ChainSetup, Config, Dialect, Preset};

#[derive(Parser)]
#[command(name = "zi")]
#[command(version = "0.1.0")]
#[command(about = "Generate ipset/iptables-restore input from the registry dump", long_about = None)]
struct Cli {
    /// Read the dump from FILE instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the script to FILE instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target set or chain name
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Set entry timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Start from a named configuration (ipset, redirect, redirect-spliced, redirect-flush)
    #[arg(long, value_parser = parse_preset)]
    preset: Option<Preset>,

    /// YAML config file, applied over the preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output dialect (set, chain)
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Destinations per REDIRECT rule
    #[arg(long)]
    batch: Option<usize>,

    /// Local port for REDIRECT rules
    #[arg(long)]
    port: Option<u16>,

    /// Chain preparation (declare, flush)
    #[arg(long)]
    chain_setup: Option<ChainSetup>,

    /// Jump to the chain from PREROUTING and OUTPUT
    #[arg(long)]
    splice: bool,

    /// Input codepage
    #[arg(long)]
    encoding: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_preset(s: &str) -> Result<Preset, String> {
    Preset::from_str(s).ok_or_else(|| format!("unknown preset: {}", s))
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&cli)?;

    let input: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(BufReader::new(fs::File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(fs::File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let stats = zi::transcode(input, output, &config)?;

    if cli.verbose {
        eprintln!(
            "{} records, {} ignored, {} rules for {} addresses, {} URLs truncated",
            stats.records, stats.ignored, stats.rules, stats.addresses, stats.truncated_urls
        );
    }
    Ok(())
}

/// Layer preset, config file and flags, in that order.
fn build_config(cli: &Cli) -> zi::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => cli.preset.map(|p| p.config()).unwrap_or_default(),
    };

    if let (Some(preset), Some(_)) = (cli.preset, &cli.config) {
        log::warn!(
            "Preset {} ignored in favour of the config file",
            preset.name()
        );
    }

    if let Some(name) = &cli.name {
        config.target_name = Some(name.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.entry_timeout = Some(timeout);
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    if let Some(batch) = cli.batch {
        config.max_addresses_per_rule = batch;
    }
    if let Some(port) = cli.port {
        config.redirect_port = port;
    }
    if let Some(setup) = cli.chain_setup {
        config.chain_setup = setup;
    }
    if cli.splice {
        config.splice = true;
    }
    if let Some(encoding) = &cli.encoding {
        config.encoding = encoding.clone();
    }

    config.validate()?;
    Ok(config)
}
