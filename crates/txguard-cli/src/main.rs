mod input;
mod output;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use txguard_core::{
    Clock, EvaluationOptions, Evaluator, FixedClock, HistoricalViolations, MalformedInputPolicy,
    SystemClock,
};
use txguard_runtime::{
    BatchOrchestrator, ExplanationProvider, LlmExplanationProvider, ProviderRegistry,
    RuntimeConfig,
};

use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "txguard",
    version,
    about = "Rule-based transaction validation and risk scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a file of transaction records
    Evaluate(EvaluateArgs),
    /// List the rules in evaluation order
    Rules,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Records file (.csv, .json, .jsonl or .ndjson)
    #[arg(short, long)]
    records: PathBuf,

    /// Historical violation counts (YAML or JSON map of customer id to count)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Evaluation options YAML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Processing date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Staleness threshold in days, overriding the config file
    #[arg(long)]
    max_days_old: Option<u32>,

    /// Reject records with unreadable fields instead of scoring them
    #[arg(long)]
    reject_malformed: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Only show records with at least this risk score
    #[arg(long, default_value_t = 0)]
    min_score: u32,

    /// Attach LLM explanations to each error
    #[arg(long)]
    explain: bool,

    /// Runtime YAML (concurrency, timeouts, provider)
    #[arg(long)]
    runtime_config: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Evaluate(args) => run_evaluate(args).await,
        Commands::Rules => run_rules(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_options(args: &EvaluateArgs) -> Result<EvaluationOptions> {
    let mut options = match &args.config {
        Some(path) => EvaluationOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to load options from '{}'", path.display()))?,
        None => EvaluationOptions::default(),
    };

    if let Some(days) = args.max_days_old {
        options = options.with_max_days_old(days);
    }
    if args.reject_malformed {
        options = options.with_malformed_input(MalformedInputPolicy::Reject);
    }

    options.validate()?;
    Ok(options)
}

fn load_runtime_config(args: &EvaluateArgs) -> Result<RuntimeConfig> {
    match &args.runtime_config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load runtime config from '{}'", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

async fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let options = load_options(&args)?;
    let config = load_runtime_config(&args)?;

    let history = match &args.history {
        Some(path) => HistoricalViolations::from_file(path)
            .with_context(|| format!("Failed to load history from '{}'", path.display()))?,
        None => HistoricalViolations::empty(),
    };

    let clock: Arc<dyn Clock> = match args.as_of {
        Some(date) => Arc::new(FixedClock(date)),
        None => Arc::new(SystemClock),
    };

    let mut builder = BatchOrchestrator::builder()
        .options(options)
        .clock(clock)
        .history(history);

    if args.explain {
        let explainer = LlmExplanationProvider::from_config(&config, &ProviderRegistry::with_defaults())
            .context("Explanations need a configured provider (build with --features anthropic)")?;
        if !explainer.health_check().await {
            tracing::warn!(
                provider = explainer.name(),
                "Explanation provider is not ready; explanations will be skipped"
            );
        }
        tracing::info!(provider = explainer.name(), "Explanations enabled");
        builder = builder.explainer(Arc::new(explainer));
    }

    let orchestrator = builder.config(config).build()?;
    let records = input::read_records(&args.records)?;
    let report = orchestrator.evaluate_batch(&records).await;

    let (rows, rejected) = output::build_rows(&report, args.min_score);
    for r in &rejected {
        eprintln!("{}: rejected: {}", r.label, r.error);
    }

    match args.format {
        OutputFormat::Table => {
            println!("{}", output::render_table(&rows));
            println!("{}", output::render_summary(&report.summary));
        }
        OutputFormat::Json => {
            println!("{}", output::render_json(&rows, &rejected, &report.summary)?);
        }
        OutputFormat::Csv => {
            print!("{}", output::render_csv(&rows)?);
            eprintln!("{}", output::render_summary(&report.summary));
        }
    }

    Ok(())
}

fn run_rules() -> Result<()> {
    println!("{}", render_rules(&Evaluator::default()));
    Ok(())
}

/// The evaluator's rules as a table, in evaluation order.
fn render_rules(evaluator: &Evaluator) -> String {
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(["#", "Rule", "Checks"]);
    for (i, rule) in evaluator.rules().enumerate() {
        builder.push_record([
            (i + 1).to_string(),
            rule.id().to_string(),
            rule.description().to_string(),
        ]);
    }
    tabled::Table::from(builder).to_string()
}
