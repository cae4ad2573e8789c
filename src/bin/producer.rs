//! LogMetrics Producer Binary
//!
//! Interactive console that ships typed messages to a file or a collector.

use clap::{Parser, Subcommand};
use logmetrics::client::command::HELP_TEXT;
use logmetrics::client::{parse_command, Command, FileSink, LogSink, Logger};
use logmetrics::config::ProducerConfig;
use logmetrics::types::Severity;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "logmetrics-producer")]
#[command(about = "Interactive log producer for LogMetrics")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    target: Target,

    /// Default severity and minimum level forwarded
    #[arg(short, long, global = true)]
    level: Option<Severity>,

    /// Configuration file with additional settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Target {
    /// Append log lines to a file
    File {
        /// Log file path
        path: PathBuf,
    },
    /// Ship log lines to a collector
    Socket {
        /// Collector IPv4 address
        host: String,
        /// Collector port
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
    },
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

async fn build_logger(target: &Target, config: &mut ProducerConfig) -> logmetrics::Result<Logger> {
    match target {
        Target::File { path } => Logger::to_file(path, config.min_level).await,
        Target::Socket { host, port } => {
            config.host = host.clone();
            config.port = *port;
            config.validate()?;

            let logger =
                Logger::to_socket(config.server_addr()?, config.timeout(), config.min_level).await?;

            if let Some(path) = &config.log_file {
                let sink = FileSink::open(path).await;
                if sink.is_valid().await {
                    logger.add_sink(Box::new(sink)).await;
                } else {
                    warn!("Ignoring unusable log file {}", path.display());
                }
            }
            Ok(logger)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if args.verbose {
            "logmetrics=debug,info"
        } else {
            "logmetrics=warn,error"
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let mut config = match &args.config {
        Some(path) => ProducerConfig::from_file(path)?,
        None => ProducerConfig::default(),
    };
    if let Some(level) = args.level {
        config.min_level = level;
    }

    let logger = match build_logger(&args.target, &mut config).await {
        Ok(logger) => logger,
        Err(e) => {
            error!("Failed to create logger: {}", e);
            std::process::exit(1);
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<(String, Severity)>();

    let worker_logger = logger.clone();
    let worker = tokio::spawn(async move {
        // Drains queued entries after the sender is dropped.
        while let Some((message, level)) = rx.recv().await {
            if !worker_logger.is_valid().await {
                warn!("Logger no longer valid, dropping queued messages");
                break;
            }
            if let Err(e) = worker_logger.log(&message, level).await {
                error!("Failed to write log line: {}", e);
            }
        }
    });

    println!("LogMetrics producer. Type 'help' for commands.");
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(input) = lines.next_line().await? {
        match parse_command(&input) {
            Some(Command::Exit) => break,
            Some(Command::Help) => println!("{}", HELP_TEXT),
            Some(Command::Log { message, level }) => {
                let level = level.unwrap_or(config.min_level);
                if tx.send((message, level)).is_err() {
                    break;
                }
            }
            None => {}
        }
        prompt();
    }

    drop(tx);
    worker.await?;
    info!("Producer stopped");
    Ok(())
}
