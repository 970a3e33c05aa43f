use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use depver::ManifestExtractor;
use depver::config::Config;
use depver::modfile::ParseMode;

#[derive(Parser)]
#[command(name = "depver")]
#[command(about = "Extract dependency metadata from go.mod files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dependency record of each go.mod file as JSON
    Extract {
        /// Paths to go.mod files
        #[arg(short, long, required = true, num_args = 1..)]
        file: Vec<PathBuf>,

        /// JSON options object (same shape as the library configuration)
        #[arg(long)]
        options: Option<String>,

        /// Parse with dependency rules, skipping main-module-only directives
        #[arg(long)]
        lax: bool,

        /// Reject versions whose major version disagrees with the module path
        #[arg(long)]
        check_path_major: bool,

        /// Leave indirect requirements out of the dependency list
        #[arg(long)]
        skip_indirect: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Profile go.mod extraction (for use with cargo-flamegraph)
    ProfileParse {
        /// Path to the go.mod file to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Number of iterations (for meaningful profiling)
        #[arg(short, long, default_value = "1000")]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Extract {
            file,
            options,
            lax,
            check_path_major,
            skip_indirect,
            pretty,
        } => {
            let mut config = match load_options(options.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    return ExitCode::FAILURE;
                }
            };
            if lax {
                config.parse.mode = ParseMode::Lax;
            }
            config.parse.check_path_major |= check_path_major;
            config.output.skip_indirect |= skip_indirect;
            config.output.pretty |= pretty;

            run_extract(file, &config).await
        }
        Commands::ProfileParse { file, iterations } => run_profile_parse(file, iterations).await,
    }
}

fn load_options(options: Option<&str>) -> anyhow::Result<Config> {
    let value = options
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--options is not valid JSON")?;
    Ok(Config::from_init_options(value))
}

async fn read_manifest(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn run_extract(files: Vec<PathBuf>, config: &Config) -> ExitCode {
    let extractor = ManifestExtractor::from_config(config);

    // Read every file concurrently; extraction itself is cheap and synchronous
    let contents = join_all(files.iter().map(|path| read_manifest(path))).await;

    let mut failures = 0;
    for (path, content) in files.iter().zip(contents) {
        let result = content.and_then(|text| {
            extractor
                .extract_json(&text)
                .with_context(|| format!("failed to extract {}", path.display()))
        });

        match result {
            Ok(json) => {
                if files.len() > 1 {
                    eprintln!("{}", path.display());
                }
                println!("{json}");
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error: {e:#}");
            }
        }
    }

    tracing::debug!(total = files.len(), failures, "extraction finished");

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn average_per_iteration(elapsed: Duration, iterations: usize) -> Duration {
    elapsed.div_f64(iterations.max(1) as f64)
}

async fn run_profile_parse(file: PathBuf, iterations: usize) -> ExitCode {
    let content = match read_manifest(&file).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Profiling parse operations for: {}", file.display());
    eprintln!("Iterations: {iterations}");
    eprintln!("File size: {} bytes", content.len());

    let extractor = ManifestExtractor::new();
    let start = Instant::now();

    for _ in 0..iterations {
        std::hint::black_box(extractor.extract_or_sentinel(&content));
    }

    let elapsed = start.elapsed();
    eprintln!("\nProfiling complete!");
    eprintln!("Total time: {elapsed:?}");
    eprintln!(
        "Average per iteration: {:?}",
        average_per_iteration(elapsed, iterations)
    );

    ExitCode::SUCCESS
}
