//! CLI commands implementation.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use tokio::io::AsyncReadExt;

use crate::config::Config;
use crate::export::Exporter;
use crate::http_client::ServiceClient;
use crate::models::RawAnalysisResponse;
use crate::normalize::Normalizer;
use crate::session::{
    render, render_ocr, scan_document, NotificationLevel, SessionEvent, SessionState,
};

use super::output::{print_analysis, save_codes, spinner, OutputArgs, OutputFormat};

#[derive(Parser)]
#[command(name = "icdlens")]
#[command(about = "OCR medical documents and extract ICD-10 codes")]
#[command(version)]
pub struct Cli {
    /// OCR/analysis service base URL (overrides config and environment)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Config file (skips discovery)
    #[arg(long, global = true, env = "ICDLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the service is reachable
    Health,

    /// Extract text from an image or PDF
    Ocr {
        /// Document to OCR
        file: PathBuf,
        /// Print only the extracted text
        #[arg(short, long)]
        text_only: bool,
        /// Save the raw JSON response and extracted text
        #[arg(long)]
        save: bool,
    },

    /// Extract ICD-10 codes from text
    Analyze {
        /// Text file to analyze ("-" or omitted reads stdin)
        input: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// OCR a document, then extract ICD-10 codes from its text
    Scan {
        /// Document to scan
        file: PathBuf,
        /// Show only the extracted text instead of per-line detail
        #[arg(short, long)]
        text_only: bool,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Normalize a saved analysis response without contacting the service
    Normalize {
        /// JSON file holding an analysis response
        response: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Ask the service to reinitialize its OCR engine
    Reinit,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).await?;
    if let Some(endpoint) = cli.endpoint.as_deref() {
        config = config.with_endpoint(endpoint);
    }

    match cli.command {
        Commands::Health => cmd_health(&config).await,
        Commands::Ocr {
            file,
            text_only,
            save,
        } => cmd_ocr(&config, &file, text_only, save).await,
        Commands::Analyze { input, output } => cmd_analyze(&config, input.as_deref(), &output).await,
        Commands::Scan {
            file,
            text_only,
            output,
        } => cmd_scan(&config, &file, text_only, &output).await,
        Commands::Normalize { response, output } => cmd_normalize(&config, &response, &output).await,
        Commands::Reinit => cmd_reinit(&config).await,
    }
}

fn normalizer(config: &Config) -> anyhow::Result<Normalizer> {
    let pattern = config
        .code_pattern()
        .context("Invalid codes.excluded_letters setting")?;
    Ok(Normalizer::new(pattern))
}

async fn cmd_health(config: &Config) -> anyhow::Result<()> {
    let client = ServiceClient::new(config)?;
    let status = client.check_health().await;

    if status.success {
        println!(
            "{} Connected to {}: {}",
            style("✓").green(),
            client.endpoint(),
            status.message
        );
        Ok(())
    } else {
        println!("{} {}", style("✗").red(), status.message);
        anyhow::bail!("Service at {} is not available", client.endpoint())
    }
}

async fn cmd_ocr(config: &Config, file: &Path, text_only: bool, save: bool) -> anyhow::Result<()> {
    let client = ServiceClient::new(config)?;

    let pb = spinner(format!("Extracting text from {}...", file.display()));
    let result = client.extract_text(file).await;
    pb.finish_and_clear();
    let ocr = result?;

    println!("{} {}", style("File:").bold(), file.display());
    println!("{}", render_ocr(&ocr, text_only));

    if save && ocr.success {
        let exporter = Exporter::from_config(config);
        let json_path = exporter.write_ocr_json(&ocr)?;
        let text_path = exporter.write_text(&ocr, Some(file))?;
        println!(
            "{} Saved {} and {}",
            style("✓").green(),
            json_path.display(),
            text_path.display()
        );
    }
    Ok(())
}

async fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

async fn cmd_analyze(
    config: &Config,
    input: Option<&Path>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let normalizer = normalizer(config)?;
    let client = ServiceClient::new(config)?;
    let text = read_input(input).await?;

    let pb = spinner(format!(
        "Analyzing {} characters of text...",
        text.chars().count()
    ));
    let result = client.analyze_text(&text).await;
    pb.finish_and_clear();

    let analysis = normalizer.normalize(&result?);
    print_analysis(&analysis, output, config)
}

async fn cmd_scan(
    config: &Config,
    file: &Path,
    text_only: bool,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let normalizer = normalizer(config)?;
    let client = ServiceClient::new(config)?;

    let pb = spinner(format!("Scanning {}...", file.display()));
    let state = scan_document(&client, &normalizer, file, SessionState::new(), |state| {
        if let Some(kind) = state.pending {
            pb.set_message(format!("{} from {}...", kind.label(), file.display()));
        }
    })
    .await;
    pb.finish_and_clear();

    let mut state = state.apply(SessionEvent::ViewModeChanged(output.view));
    if text_only && !state.text_only {
        state = state.apply(SessionEvent::TextOnlyToggled);
    }

    match &state.analysis {
        Some(analysis) if output.format == OutputFormat::Findings => {
            println!("{}", render(&state));
            if output.save {
                save_codes(analysis, output, config)?;
            }
        }
        Some(analysis) => print_analysis(analysis, output, config)?,
        None => println!("{}", render(&state)),
    }

    if output.save {
        if let Some(ocr) = state.ocr.as_ref().filter(|ocr| ocr.success) {
            let exporter = Exporter::from_config(config);
            let json_path = exporter.write_ocr_json(ocr)?;
            let text_path = exporter.write_text(ocr, Some(file))?;
            println!(
                "{} Saved {} and {}",
                style("✓").green(),
                json_path.display(),
                text_path.display()
            );
        }
    }

    match &state.notification {
        Some(note) if note.level == NotificationLevel::Error && state.analysis.is_none() => {
            anyhow::bail!("Scan of {} failed: {}", file.display(), note.message)
        }
        _ => Ok(()),
    }
}

async fn cmd_normalize(config: &Config, response: &Path, output: &OutputArgs) -> anyhow::Result<()> {
    let normalizer = normalizer(config)?;
    let contents = tokio::fs::read_to_string(response)
        .await
        .with_context(|| format!("Failed to read {}", response.display()))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", response.display()))?;

    let analysis = normalizer.normalize(&RawAnalysisResponse::from_value(value));
    print_analysis(&analysis, output, config)
}

async fn cmd_reinit(config: &Config) -> anyhow::Result<()> {
    let client = ServiceClient::new(config)?;

    let pb = spinner("Reinitializing OCR engine...".to_string());
    let result = client.reinitialize().await;
    pb.finish_and_clear();
    let response = result?;

    if response.success {
        println!("{} {}", style("✓").green(), response.message);
        Ok(())
    } else {
        println!("{} {}", style("✗").red(), response.message);
        anyhow::bail!("Reinitialization failed")
    }
}
