//! DNA-Lang command-line runner
//!
//! Parses organism files, checks them, and drives the evolution loop.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dna_lang::{Config, LogFormat};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dnalang")]
#[command(about = "DNA-Lang organism parser and evolution runner")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an organism file and print its structure
    Parse {
        /// Organism source file
        file: PathBuf,
        /// Print the parsed organism as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evolve an organism until its consciousness target or the generation cap
    Evolve {
        /// Organism source file
        file: PathBuf,
        /// Override the generation cap
        #[arg(short, long)]
        generations: Option<u64>,
        /// Print the final status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate an organism file without evolving it
    Check {
        /// Organism source file
        file: PathBuf,
        /// Reject duplicate genes and out-of-range expression levels
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    config.validate()?;

    init_logging(&config);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Parse { file, json } => {
            let source = read_source(&file)?;
            commands::parse::run(&source, &config, json)
        }
        Commands::Evolve {
            file,
            generations,
            json,
        } => {
            if let Some(generations) = generations {
                config.engine.max_generations = generations;
            }
            config.validate()?;
            let source = read_source(&file)?;
            commands::evolve::run(&source, &config, json)
        }
        Commands::Check { file, strict } => {
            if strict {
                config.parser.strict = true;
            }
            let source = read_source(&file)?;
            commands::check::run(&source, &config, &file.display().to_string())
        }
    }
}

/// File settings first, then `DNALANG_*` overrides.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = Config::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            config.apply_env()?;
            config
        }
        None => Config::from_env()?,
    };
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_evolve_arguments() {
        let cli = Cli::try_parse_from(["dnalang", "evolve", "org.dna", "-g", "7", "--json"]).unwrap();
        match cli.command {
            Commands::Evolve {
                file,
                generations,
                json,
            } => {
                assert_eq!(file, PathBuf::from("org.dna"));
                assert_eq!(generations, Some(7));
                assert!(json);
            }
            _ => panic!("expected evolve"),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\nstrict = true\n\n[engine]\nstop_on_target = false").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert!(config.parser.strict);
        assert!(!config.engine.stop_on_target);
        assert_eq!(config.engine.max_generations, 100);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Some(Path::new("/nonexistent/dnalang.toml"))).is_err());
    }
}
