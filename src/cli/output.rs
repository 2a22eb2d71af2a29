//! Shared output helpers for CLI commands.

use std::time::Duration;

use clap::{Args, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::export::{codes_text, CodeFormat, Exporter};
use crate::normalize::NormalizedAnalysis;
use crate::session::{render_analysis, ViewMode};

/// How analysis results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Metadata and findings in the selected view
    Findings,
    /// `CODE: description` lines
    Plain,
    /// Code, explanation and confidence blocks
    Detailed,
    /// Numbered export blocks
    Export,
    /// Normalized result as JSON
    Json,
}

impl OutputFormat {
    /// Serialization used for copy/save, if this format is one.
    fn code_format(self) -> Option<CodeFormat> {
        match self {
            Self::Plain => Some(CodeFormat::Plain),
            Self::Detailed => Some(CodeFormat::Detailed),
            Self::Export => Some(CodeFormat::Structured),
            Self::Findings | Self::Json => None,
        }
    }
}

/// Output flags shared by commands that print analysis results.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Findings layout
    #[arg(long, value_enum, default_value_t = ViewMode::List)]
    pub view: ViewMode,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Findings)]
    pub format: OutputFormat,
    /// Save the code list to the output directory
    #[arg(long)]
    pub save: bool,
}

/// Spinner shown while a request is in flight.
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

/// Print a normalized analysis and optionally save the code list.
pub fn print_analysis(
    analysis: &NormalizedAnalysis,
    args: &OutputArgs,
    config: &Config,
) -> anyhow::Result<()> {
    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(analysis)?);
    } else {
        match (args.format.code_format(), analysis.report()) {
            (Some(code_format), Some(report)) => println!("{}", codes_text(report, code_format)),
            _ => print_findings(analysis, args.view),
        }
    }

    if args.save {
        save_codes(analysis, args, config)?;
    }
    Ok(())
}

fn print_findings(analysis: &NormalizedAnalysis, view: ViewMode) {
    match analysis {
        NormalizedAnalysis::NoResults { .. } => {
            println!("{} {}", style("✗").red(), render_analysis(analysis, view));
        }
        NormalizedAnalysis::Analyzed(report) => {
            println!(
                "{} {} ICD-10 codes ({})",
                style("✓").green(),
                report.findings.len(),
                style(report.source).dim()
            );
            println!("{}", render_analysis(analysis, view));
        }
    }
}

/// Write the code list in the selected format, or the export format.
pub fn save_codes(
    analysis: &NormalizedAnalysis,
    args: &OutputArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let Some(report) = analysis.report() else {
        println!(
            "  {} Nothing to save: no analysis results",
            style("→").dim()
        );
        return Ok(());
    };

    let code_format = args.format.code_format().unwrap_or(CodeFormat::Structured);
    let path = Exporter::from_config(config).write_codes(report, code_format)?;
    println!(
        "{} Saved {} codes to {}",
        style("✓").green(),
        code_format,
        path.display()
    );
    Ok(())
}
