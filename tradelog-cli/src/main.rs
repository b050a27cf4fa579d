use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tradelog_core::time::parse_tz;
use tradelog_core::{ParseOptions, Scanner, Session, Toggle};
use tradelog_dom::{parse_file, HistoryPage};

mod config;
mod runner;
mod sink;
mod state;

use sink::{make_sink, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "tradelog",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TRADELOG_BUILD_SHA"), ")"),
    about = "Extract and deduplicate trades from trade-history pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan saved page snapshots once; repeats across snapshots are reported once
    Scan {
        /// HTML snapshots, scanned in order through one dedup store
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        /// Record entries without emitting them (logging switched off)
        #[arg(long)]
        disabled: bool,
    },

    /// Follow a live page: debounced rescans, load-more pagination, stdin toggle
    Watch {
        /// Initial page
        first: PathBuf,

        /// Further pages revealed one per load-more activation
        more: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        /// Debounce delay after the last mutation (ms)
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Load-more activation interval (ms)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Start with logging switched off
        #[arg(long)]
        disabled: bool,

        /// Re-render the page whenever FIRST changes on disk
        #[arg(long)]
        follow: bool,

        /// Exit once every page is loaded and no rescan is pending
        #[arg(long)]
        exit_when_idle: bool,
    },

    /// Manage ~/.tradelog/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output format (default from config, else json)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// IANA timezone for page dates without an offset (default from config, else UTC)
    #[arg(long)]
    tz: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tradelog=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            files,
            output,
            disabled,
        } => {
            let cfg = config::load_config()?;
            let format = output.format.unwrap_or(cfg.output.format);
            let parse = ParseOptions {
                timezone: resolve_tz(output.tz.as_deref(), &cfg)?,
            };
            scan_files(&files, format, parse, !disabled)?;
        }

        Command::Watch {
            first,
            more,
            output,
            debounce_ms,
            interval_ms,
            disabled,
            follow,
            exit_when_idle,
        } => {
            let cfg = config::load_config()?;
            let format = output.format.unwrap_or(cfg.output.format);

            let mut session_cfg = cfg.session_config()?;
            session_cfg.parse.timezone = resolve_tz(output.tz.as_deref(), &cfg)?;
            if let Some(ms) = debounce_ms {
                session_cfg.debounce = Duration::from_millis(ms);
            }
            if let Some(ms) = interval_ms {
                if ms == 0 {
                    bail!("--interval-ms must be greater than zero");
                }
                session_cfg.load_more_interval = Duration::from_millis(ms);
            }
            if disabled {
                session_cfg.start_enabled = false;
            }

            let mut paths = vec![first.clone()];
            paths.extend(more);
            let page = HistoryPage::load_files(&paths)?;
            let session = Session::new(page, session_cfg);

            let mut sink = make_sink(format, io::stdout());
            let opts = runner::WatchOptions {
                follow: follow.then_some(first),
                follow_interval: Duration::from_secs(1),
                exit_when_idle,
            };
            runner::watch(session, sink.as_mut(), opts).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}

/// CLI flag wins over the config file.
fn resolve_tz(flag: Option<&str>, cfg: &config::Config) -> Result<chrono_tz::Tz> {
    match flag {
        Some(name) => match parse_tz(name) {
            Some(tz) => Ok(tz),
            None => bail!("invalid timezone: {name}"),
        },
        None => cfg.timezone(),
    }
}

fn scan_files(files: &[PathBuf], format: OutputFormat, parse: ParseOptions, enabled: bool) -> Result<()> {
    for f in files {
        if !f.exists() {
            bail!("file not found: {}", f.display());
        }
    }

    let mut scanner = Scanner::new(parse);
    let toggle = Toggle::new(enabled);
    let mut sink = make_sink(format, io::stdout());

    let mut total_blocks = 0;
    for f in files {
        let tree = parse_file(f).with_context(|| format!("parsing {}", f.display()))?;
        let report = scanner.scan(&tree.root(), &toggle, sink.as_mut());
        total_blocks += report.blocks;
        info!(
            file = %f.display(),
            blocks = report.blocks,
            new = report.new_keys,
            emitted = report.emitted,
            "scanned snapshot"
        );
    }
    sink.finish()?;

    eprintln!(
        "Scanned {} file(s): {} blocks, {} unique trades, {} emitted",
        files.len(),
        total_blocks,
        scanner.seen().len(),
        sink.emitted()
    );
    Ok(())
}
