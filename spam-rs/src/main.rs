//! spam-rs command line tool
//!
//! # Usage
//!
//! ```bash
//! # Show the effective configuration
//! spam-rs config --config config.json --threshold 0.9
//!
//! # Classify files (or stdin when no file is given)
//! spam-rs classify mail1.eml mail2.eml --algorithm svm --workers 4
//!
//! # Classify stdin lines, reloading config.json when it changes
//! spam-rs watch --config config.json
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use spam_rs::classifiers::{Algorithm, TrainingOptions};
use spam_rs::config::{CliOverrides, ConfigResolver, ConfigWatcher, DEFAULT_CONFIG_PATH};
use spam_rs::corpus::TrainingSet;
use spam_rs::{FilterConfig, SpamFilter, Verdict};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spam-rs")]
#[command(version, about = "Classify email as spam or ham", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Spam probability threshold (0 to 1)
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Whitelisted addresses or domains
    #[arg(long, global = true, num_args = 1.., value_delimiter = ',')]
    whitelist: Option<Vec<String>>,

    /// Blacklisted addresses or domains
    #[arg(long, global = true, num_args = 1.., value_delimiter = ',')]
    blacklist: Option<Vec<String>>,

    /// Classifier to use (naive_bayes, svm, rnn, cnn)
    #[arg(long, global = true)]
    algorithm: Option<String>,

    /// Training corpus (JSON array of {"text", "label"}); built-in sample if omitted
    #[arg(long, global = true)]
    training: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration as JSON
    Config,
    /// Classify messages
    Classify {
        /// Message files; stdin is read when none are given
        files: Vec<PathBuf>,
        /// Number of worker tasks
        #[arg(short, long, default_value_t = 4)]
        workers: usize,
        /// Print one JSON verdict per line
        #[arg(long)]
        json: bool,
    },
    /// Classify stdin lines with live configuration reload
    Watch,
}

impl Cli {
    fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(Some(self.config.clone())).with_cli(CliOverrides {
            threshold: self.threshold,
            whitelist: self.whitelist.clone(),
            blacklist: self.blacklist.clone(),
            algorithm: self.algorithm.clone(),
        })
    }

    fn training_set(&self) -> anyhow::Result<TrainingSet> {
        match &self.training {
            Some(path) => TrainingSet::from_file(path)
                .with_context(|| format!("Failed to load training corpus {}", path.display())),
            None => {
                info!("No training corpus given, using built-in sample");
                Ok(TrainingSet::sample())
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spam_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Config => {
            let config = cli.resolver().resolve();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Classify {
            files,
            workers,
            json,
        } => {
            let config = cli.resolver().resolve();
            let algorithm: Algorithm = config.algorithm.parse()?;

            let mut filter = SpamFilter::new(config);
            filter.train(&cli.training_set()?, &[algorithm], &TrainingOptions::default())?;
            let filter = Arc::new(filter);

            let (names, contents) = read_messages(files).await?;
            let results = filter.classify_batch(contents, *workers).await;

            for (name, result) in names.iter().zip(results) {
                match result {
                    Ok(verdict) => print_verdict(name, &verdict, *json),
                    Err(e) => error!("{}: {}", name, e),
                }
            }
        }
        Commands::Watch => watch(&cli).await?,
    }

    Ok(())
}

async fn read_messages(files: &[PathBuf]) -> anyhow::Result<(Vec<String>, Vec<String>)> {
    if files.is_empty() {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        return Ok((vec!["<stdin>".to_string()], vec![content]));
    }

    let mut names = Vec::with_capacity(files.len());
    let mut contents = Vec::with_capacity(files.len());
    for path in files {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        names.push(path.display().to_string());
        contents.push(content);
    }
    Ok((names, contents))
}

fn print_verdict(name: &str, verdict: &Verdict, json: bool) {
    if json {
        let line = serde_json::json!({ "message": name, "verdict": verdict });
        println!("{}", line);
    } else {
        println!(
            "{}: {} (p={:.3}, {})",
            name, verdict.label, verdict.spam_probability, verdict.algorithm
        );
    }
}

async fn watch(cli: &Cli) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let watcher = ConfigWatcher::spawn(cli.resolver(), cancel.clone())?;

    // The algorithm may change on reload, so every model is trained up front
    let mut filter = SpamFilter::with_config_updates(watcher.subscribe());
    filter.train(&cli.training_set()?, &Algorithm::ALL, &TrainingOptions::default())?;

    let current: FilterConfig = watcher.current();
    info!(
        "Watching {} (algorithm={}, threshold={}); reading messages from stdin",
        cli.config.display(),
        current.algorithm,
        current.threshold
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match filter.run(&line) {
                    Ok(verdict) => print_verdict("<stdin>", &verdict, false),
                    Err(e) => warn!("Could not classify message: {}", e),
                }
            }
        }
    }

    cancel.cancel();
    watcher.join().await?;
    Ok(())
}
