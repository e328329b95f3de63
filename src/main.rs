use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use sipcast_core::{
    CategoryId, EncoderConfig, IngestSummary, Prediction, PredictionRequest, PredictionService,
    ServiceConfig,
};
use sipcast_gbdt::GradientBoostingConfig;
use sipcast_io::ensure_tabular;

#[derive(Parser)]
#[command(name = "sipcast")]
#[command(about = "Predict the best-selling beverage from temperature and weather")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for row subsampling (unseeded if not set)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Sales files the model is trained on.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the initial sales CSV file
    #[arg(long)]
    data: PathBuf,

    /// Additional sales CSV files, ingested in order after the initial file
    #[arg(long)]
    ingest: Vec<PathBuf>,
}

/// Shared encoding and boosting parameters.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Number of boosting rounds
    #[arg(long, default_value_t = 100)]
    n_rounds: usize,

    /// Shrinkage applied to every tree's output
    #[arg(long, default_value_t = 0.3)]
    learning_rate: f64,

    /// Maximum depth of each regression tree
    #[arg(long, default_value_t = 6)]
    max_depth: usize,

    /// Minimum hessian sum required in each child
    #[arg(long, default_value_t = 1.0)]
    min_child_weight: f64,

    /// L2 regularization on leaf weights
    #[arg(long, default_value_t = 1.0)]
    lambda: f64,

    /// Minimum gain required to split
    #[arg(long, default_value_t = 0.0)]
    gamma: f64,

    /// Fraction of rows sampled per boosting round (1.0 = all rows)
    #[arg(long, default_value_t = 1.0)]
    subsample: f64,

    /// Temperature used when a file has no temperature readings at all
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    missing_temperature_fallback: f64,
}

impl TuningArgs {
    fn service_config(&self, seed: Option<u64>) -> Result<ServiceConfig> {
        let boosting = GradientBoostingConfig::new(self.n_rounds)
            .context("invalid boosting configuration")?
            .with_learning_rate(self.learning_rate)
            .with_max_depth(self.max_depth)
            .with_min_child_weight(self.min_child_weight)
            .with_lambda(self.lambda)
            .with_gamma(self.gamma)
            .with_subsample(self.subsample)
            .with_seed(seed);
        boosting.validate().context("invalid boosting configuration")?;
        let encoder = EncoderConfig::new()
            .with_missing_temperature_fallback(self.missing_temperature_fallback);
        Ok(ServiceConfig::new(boosting).with_encoder(encoder))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train on the sales data and predict the best seller for one condition
    Predict {
        #[command(flatten)]
        data: DataArgs,

        /// Air temperature
        #[arg(long, allow_negative_numbers = true)]
        temperature: f64,

        /// Weather, as a registered id or name
        #[arg(long)]
        weather: String,

        /// Number of ranked products to output
        #[arg(long, default_value_t = 1)]
        top_k: usize,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// List the weather conditions the model knows, with their ids
    Weathers {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// List the products the model can predict, with their ids
    Products {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Read commands from stdin against one long-lived model
    Session {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct PredictOutput {
    temperature: f64,
    weather_id: CategoryId,
    weather: String,
    n_rows: usize,
    predictions: Vec<Prediction>,
}

#[derive(Serialize)]
struct CategoryOutput {
    id: CategoryId,
    name: String,
}

#[derive(Serialize)]
struct IngestOutput {
    path: PathBuf,
    #[serde(flatten)]
    summary: IngestSummary,
}

const SESSION_HELP: &str = "\
commands:
  predict <temperature> <weather-id>   predict the best seller
  ingest <path.csv>                    add sales data and retrain
  weathers                             list weather ids
  products                             list product ids
  help                                 show this message
  quit                                 end the session";

fn build_service(
    data: &DataArgs,
    tuning: &TuningArgs,
    seed: Option<u64>,
) -> Result<PredictionService> {
    let config = tuning.service_config(seed)?;
    ensure_tabular(&data.data)?;
    let service = PredictionService::initialize(&data.data, config)
        .with_context(|| format!("failed to train on {}", data.data.display()))?;
    for path in &data.ingest {
        let summary = ingest(&service, path)?;
        info!(path = %path.display(), rows_added = summary.rows_added, "ingested");
    }
    Ok(service)
}

fn ingest(service: &PredictionService, path: &Path) -> Result<IngestSummary> {
    ensure_tabular(path)?;
    service
        .ingest_additional_data(path)
        .with_context(|| format!("failed to ingest {}", path.display()))
}

fn weather_options(service: &PredictionService) -> Vec<CategoryOutput> {
    service
        .list_weather_options()
        .into_iter()
        .map(|(name, id)| CategoryOutput { id, name })
        .collect()
}

fn product_options(service: &PredictionService) -> Vec<CategoryOutput> {
    service
        .list_product_names()
        .into_iter()
        .map(|(id, name)| CategoryOutput { id, name })
        .collect()
}

/// Accept a weather id or a registered weather name.
fn resolve_weather(service: &PredictionService, raw: &str) -> Result<(CategoryId, String)> {
    let options = service.list_weather_options();
    if let Ok(index) = raw.trim().parse::<usize>() {
        let id = CategoryId::new(index);
        if let Some((name, _)) = options.iter().find(|(_, known)| *known == id) {
            return Ok((id, name.clone()));
        }
        anyhow::bail!("unknown weather id {index} (see `sipcast weathers`)");
    }
    options
        .into_iter()
        .find(|(name, _)| name == raw.trim())
        .map(|(name, id)| (id, name))
        .with_context(|| format!("unknown weather \"{raw}\" (see `sipcast weathers`)"))
}

enum Reply {
    Text(String),
    Quit,
}

fn session_command(service: &PredictionService, command: &str, args: &[&str]) -> Result<Reply> {
    let text = match (command, args) {
        ("predict", [temperature, weather]) => {
            let request = PredictionRequest::parse(temperature, weather)?;
            serde_json::to_string(&service.predict_request(request)?)?
        }
        ("ingest", [path]) => {
            let path = PathBuf::from(path);
            let summary = ingest(service, &path)?;
            serde_json::to_string(&IngestOutput { path, summary })?
        }
        ("weathers", []) => serde_json::to_string(&weather_options(service))?,
        ("products", []) => serde_json::to_string(&product_options(service))?,
        ("help", _) => SESSION_HELP.to_string(),
        ("quit" | "exit", _) => return Ok(Reply::Quit),
        (other, _) => anyhow::bail!(
            "unrecognized command \"{other}\" with {} argument(s); try `help`",
            args.len()
        ),
    };
    Ok(Reply::Text(text))
}

/// Serve commands line by line. Failed commands are reported and the session
/// continues.
fn run_session<R: BufRead, W: Write>(
    service: &PredictionService,
    input: R,
    mut out: W,
) -> Result<()> {
    writeln!(out, "{SESSION_HELP}")?;
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();
        match session_command(service, command, &args) {
            Ok(Reply::Text(text)) => writeln!(out, "{text}")?,
            Ok(Reply::Quit) => break,
            Err(e) => {
                warn!(command, error = %e, "session command failed");
                writeln!(out, "error: {e:#}")?;
            }
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Predict {
            data,
            temperature,
            weather,
            top_k,
            tuning,
        } => {
            let service = build_service(&data, &tuning, cli.seed)?;
            let (weather_id, weather) = resolve_weather(&service, &weather)?;
            let predictions = service
                .predict_ranked(temperature, weather_id, top_k.max(1))
                .context("prediction failed")?;
            let output = PredictOutput {
                temperature,
                weather_id,
                weather,
                n_rows: service.corpus_len(),
                predictions,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Weathers { data, tuning } => {
            let service = build_service(&data, &tuning, cli.seed)?;
            println!("{}", serde_json::to_string_pretty(&weather_options(&service))?);
        }

        Command::Products { data, tuning } => {
            let service = build_service(&data, &tuning, cli.seed)?;
            println!("{}", serde_json::to_string_pretty(&product_options(&service))?);
        }

        Command::Session { data, tuning } => {
            let service = build_service(&data, &tuning, cli.seed)?;
            let stdin = std::io::stdin();
            run_session(&service, stdin.lock(), std::io::stdout().lock())?;
            info!(n_rows = service.corpus_len(), "session ended");
        }
    }

    Ok(())
}
