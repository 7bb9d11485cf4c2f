use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bkm_core::PollOutcome;
use bkm_runner::scenario;
use bkm_runner::{Config, Runner, CONFIG_FILENAME};

#[derive(Parser)]
#[command(name = "bkm", version)]
struct Cli {
    /// Config file (default: first of /etc/bkm/bkm.toml, ~/.bkm/bkm.toml, ./bkm.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file (./bkm.toml unless --config is given)
    Init,

    /// Load config and bootstrap, print the backup configuration that would be submitted
    Check,

    /// Run one backup: resolve configuration, wake agent, start, wait, report
    Run,

    /// Replay a fixture scenario directory against a simulated clock
    Simulate { dir: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Init => {
            init_tracing(None)?;
            let path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
            if Runner::init(&path)? {
                println!("Wrote default config to {}", path.display());
            } else {
                println!("Config already exists at {}", path.display());
            }
        }
        Command::Check => {
            let path = Config::locate(cli.config.as_deref())?;
            init_tracing(Config::load_from(&path).ok().as_ref())?;
            let r = Runner::open(path)?;
            let conf = r.preview()?;
            println!("{}", serde_json::to_string_pretty(&conf)?);
        }
        Command::Run => {
            let path = Config::locate(cli.config.as_deref())?;
            init_tracing(Config::load_from(&path).ok().as_ref())?;
            let mut r = Runner::open(path)?;
            let outcome = r.run()?;
            info!(
                configuration_id = %outcome.configuration_id,
                snapshot_id = %outcome.snapshot_id,
                succeeded = outcome.succeeded(),
                "backup session finished"
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let PollOutcome::Failed { cause } = &outcome.poll {
                bail!("backup {} did not complete: {:?}", outcome.snapshot_id, cause);
            }
        }
        Command::Simulate { dir } => {
            init_tracing(None)?;
            let res = scenario::simulate(&dir)?;
            println!("{}", serde_json::to_string_pretty(&res)?);
            if dir.join("expected.yaml").exists() {
                scenario::load_expected(&dir)?.verify(&res)?;
                println!("OK");
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the config's level, written to its log file if set.
fn init_tracing(cfg: Option<&Config>) -> anyhow::Result<()> {
    let level = cfg.map(|c| c.logging.level.as_str()).unwrap_or("warn");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match cfg.and_then(Config::log_file) {
        Some(file) => {
            let writer = open_log(&file)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(writer))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn open_log(path: &Path) -> anyhow::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}
