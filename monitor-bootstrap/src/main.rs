use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use monitor_bootstrap::{GenerateOverrides, MonitorOverrides};

#[derive(Parser, Debug)]
#[command(name = "txwatch")]
#[command(about = "Streaming transaction anomaly monitor", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Directory for daily rolling log files
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a transaction file through the anomaly rules
    Monitor(MonitorArgs),
    /// Write a synthetic labelled transaction dataset
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct MonitorArgs {
    /// Transaction file (.csv, .json, .jsonl, .xlsx)
    #[arg(short, long)]
    input: Option<String>,
    /// Pause between transactions in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Number of entity shards processed in parallel
    #[arg(short, long)]
    workers: Option<usize>,
    /// Also append alerts as JSON lines to this file
    #[arg(long)]
    alerts_out: Option<String>,
    /// YAML rule set
    #[arg(long)]
    rules: Option<String>,
    /// Process rows in file order instead of sorting by timestamp
    #[arg(long)]
    no_sort: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(short, long)]
    output: Option<String>,
    #[arg(long)]
    users: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    fraud_rate: Option<f64>,
}

fn init_tracing(log_dir: Option<&str>, json: bool) -> Option<WorkerGuard> {
    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "txwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| std::env::var("TXWATCH_LOG_DIR").ok());
    let _guard = init_tracing(log_dir.as_deref(), cli.json_logs);

    if let Some(config) = cli.config {
        std::env::set_var(monitor_infrastructure::CONFIG_ENV, config);
    }

    match cli.command {
        Command::Monitor(args) => {
            monitor_bootstrap::run_monitor_command(MonitorOverrides {
                input: args.input,
                delay_ms: args.delay_ms,
                workers: args.workers,
                alerts_out: args.alerts_out,
                rules: args.rules,
                no_sort: args.no_sort,
            })
            .await?;
        }
        Command::Generate(args) => {
            let report = monitor_bootstrap::run_generate_command(GenerateOverrides {
                output: args.output,
                users: args.users,
                seed: args.seed,
                fraud_rate: args.fraud_rate,
            })
            .await?;
            println!(
                "Dataset generated: {} rows, {} users, {} labelled fraud",
                report.rows, report.users, report.fraud_rows
            );
        }
    }
    Ok(())
}
