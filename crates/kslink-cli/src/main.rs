use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use kslink_core::{Conventions, Linker};

/// Environment variable naming an optional TOML conventions file
const CONFIG_ENV: &str = "KSLINK_CONFIG";

#[derive(Parser, Debug)]
#[command(name = "kslink")]
#[command(
    about = "Link a KerboScript program and the library functions it uses into one file",
    long_about = "Link a KerboScript program and the library functions it uses into one file.\n\n\
                  The merged script is written to standard output. Set KSLINK_CONFIG to a TOML \
                  file to override the recognized conventions, and RUST_LOG to control logging."
)]
struct Cli {
    /// Entry script to link
    script: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the merged script, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let conventions = load_conventions()?;
    let linker = Linker::new(conventions).context("Invalid linker configuration")?;

    let output = linker
        .link_file(&cli.script)
        .with_context(|| format!("Failed to link {}", cli.script.display()))?;

    for call in &output.unimported {
        warn!(
            "{} calls {}:{} without importing {}; the call was left as is",
            call.site, call.target_library, call.target, call.target_library
        );
    }
    debug!(
        "Kept {} functions, dropped {}, in {} rounds",
        output.stats.kept,
        output.stats.dropped(),
        output.stats.rounds
    );

    println!("{}", output.text);
    Ok(())
}

fn load_conventions() -> Result<Conventions> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            debug!("Loading conventions from {}", path.display());
            Conventions::from_file(&path)
                .with_context(|| format!("Failed to load {} from {}", CONFIG_ENV, path.display()))
        }
        None => Ok(Conventions::default()),
    }
}
