// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  logscope: access-log sampling, enrichment and session analytics
//
//  run      read → geolocate → sessionize → clean → scale/encode → report
//  sample   cut a large log down to a byte budget
//  inspect  summarize chunk files from an earlier run
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use anyhow::Context;
use clap::{Parser, Subcommand};
use logscope_cli::pipeline::{self, RunOptions};
use logscope_core::{LogscopeConfig, LogscopeError};
use logscope_reader::parse_byte_size;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "logscope", version, about = "Access-log sampling, enrichment and session analytics")]
struct Cli {
    /// Path to configuration file (skipped when it does not exist)
    #[arg(short, long, default_value = "logscope.yaml")]
    config: PathBuf,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline and print the report
    Run {
        /// Log file to read (overrides input.logfile)
        #[arg(long)]
        logfile: Option<PathBuf>,

        /// Session gap in minutes (overrides sessions.minutes)
        #[arg(long)]
        session_minutes: Option<u64>,

        /// Do not look up country codes
        #[arg(long)]
        no_geo: bool,

        /// Write the final frame as JSON Lines
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Copy the first bytes of a log, keeping whole lines only
    Sample {
        input: PathBuf,
        output: PathBuf,

        /// Byte budget, e.g. 500K, 10M, 1G
        #[arg(long, default_value = "10M", value_parser = parse_max_bytes)]
        max_bytes: u64,
    },

    /// Summarize the chunk files of an earlier run
    Inspect { chunk_dir: PathBuf },

    /// Print the effective configuration as YAML
    Config,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Tracing ──
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "logscope failed");
            eprintln!("Error: {e:?}");
            let code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<LogscopeError>())
                .map(LogscopeError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    // ── Config ──
    let config_path = cli.config.exists().then_some(cli.config.as_path());
    match config_path {
        Some(path) => info!(path = %path.display(), "Loading config file"),
        None => info!("No config file found, using defaults and environment"),
    }
    let mut config = LogscopeConfig::load(config_path).context("failed to load configuration")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Run {
            logfile,
            session_minutes,
            no_geo,
            export,
        } => {
            if let Some(logfile) = logfile {
                config.input.logfile = logfile;
            }
            if let Some(minutes) = session_minutes {
                config.sessions.minutes = minutes;
            }
            config.validate()?;

            let opts = RunOptions {
                no_geo,
                export,
                show_progress: std::io::stderr().is_terminal(),
            };
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build tokio runtime")?;
            let summary = rt.block_on(pipeline::run(&config, &opts, &mut out))?;
            info!(
                parsed = summary.parsed,
                rejected = summary.rejected,
                dropped_rows = summary.dropped_rows,
                sessions = summary.sessions,
                "Pipeline finished"
            );
        }
        Command::Sample {
            input,
            output,
            max_bytes,
        } => {
            let outcome = logscope_reader::sample(&input, &output, max_bytes)
                .with_context(|| format!("failed to sample {}", input.display()))?;
            writeln!(
                out,
                "Wrote {} bytes ({} lines) to {}",
                outcome.bytes_written,
                outcome.lines,
                output.display()
            )?;
        }
        Command::Inspect { chunk_dir } => {
            pipeline::inspect(&chunk_dir, config.report.head, &mut out)?;
        }
        Command::Config => {
            if config.geo.token.is_some() {
                config.geo.token = Some("<redacted>".to_string());
            }
            write!(out, "{}", serde_yaml::to_string(&config)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn parse_max_bytes(raw: &str) -> Result<u64, String> {
    parse_byte_size(raw).map_err(|e| e.to_string())
}
