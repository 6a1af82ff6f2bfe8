//! LabScan CLI
//!
//! Analyzes plain-text lab reports from a file or stdin.
//!
//! Usage:
//!   labscan analyze report.txt
//!   labscan analyze - --tier advanced --format json < report.txt
//!   labscan tables report.txt
//!   labscan normalize hgb "total chol" sys

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use labscan_core::extract::{clean_text, extract_tables};
use labscan_core::{
    AnalysisResult, AnalysisTier, Analyzer, AnalyzerConfig, Normalizer, ReportExport, Sex,
    TextSource,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// LabScan: extract and grade lab values from report text.
#[derive(Parser)]
#[command(
    name = "labscan",
    about = "Lab report value extraction and classification",
    long_about = "Extracts lab values from plain-text medical reports, grades them against\n\
                  reference ranges, and prints alerts, risk scores and advice.\n\
                  Outputs are heuristics, not diagnoses."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a report and print the result.
    Analyze {
        /// Report file, or "-" for stdin
        input: String,
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Classification tier (overrides the config)
        #[arg(long, value_enum)]
        tier: Option<TierArg>,
        /// Sex for sex-specific ranges (overrides the config)
        #[arg(long, value_enum)]
        sex: Option<SexArg>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print table rows found in a report as JSON.
    Tables {
        /// Report file, or "-" for stdin
        input: String,
    },
    /// Resolve raw labels to canonical test ids.
    Normalize {
        #[arg(required = true)]
        labels: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TierArg {
    Basic,
    Advanced,
}

impl From<TierArg> for AnalysisTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Basic => AnalysisTier::Basic,
            TierArg::Advanced => AnalysisTier::Advanced,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(sex: SexArg) -> Self {
        match sex {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

// ── Report source ─────────────────────────────────────────────────────────────

/// Plain-text report read fully from a file or stdin.
struct PlainTextFile {
    text: String,
}

impl PlainTextFile {
    fn open(input: &str) -> Result<Self> {
        let text = if input == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read report from stdin")?;
            buf
        } else {
            std::fs::read_to_string(Path::new(input))
                .with_context(|| format!("Failed to read report {}", input))?
        };
        Ok(Self { text })
    }
}

impl TextSource for PlainTextFile {
    fn get_text(&self) -> String {
        self.text.clone()
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Set RUST_LOG=debug for per-rule output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            input,
            config,
            tier,
            sex,
            format,
        } => run_analyze(&input, config.as_deref(), tier, sex, format),
        Command::Tables { input } => run_tables(&input),
        Command::Normalize { labels } => {
            run_normalize(&labels);
            Ok(())
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_analyze(
    input: &str,
    config_path: Option<&Path>,
    tier: Option<TierArg>,
    sex: Option<SexArg>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    if let Some(tier) = tier {
        config.tier = tier.into();
    }
    if let Some(sex) = sex {
        config.sex = Some(sex.into());
    }

    let analyzer = Analyzer::new(config).context("Invalid analyzer config")?;
    let source = PlainTextFile::open(input)?;
    let result = analyzer.analyze_source(&source);
    info!(input = %input, status = result.summary.overall_status.label(), "report analyzed");

    match format {
        OutputFormat::Text => print_text(&result),
        OutputFormat::Json | OutputFormat::Csv => {
            let export =
                ReportExport::from_analysis(&source.get_text(), analyzer.config().tier, result);
            if format == OutputFormat::Json {
                println!("{}", export.to_json().context("Failed to serialize report")?);
            } else {
                print!("{}", export.to_csv());
            }
        }
    }

    Ok(())
}

fn run_tables(input: &str) -> Result<()> {
    let source = PlainTextFile::open(input)?;
    let tables = extract_tables(&clean_text(&source.get_text()));
    println!(
        "{}",
        serde_json::to_string_pretty(&tables).context("Failed to serialize tables")?
    );
    Ok(())
}

fn run_normalize(labels: &[String]) {
    let normalizer = Normalizer::new();
    for label in labels {
        let canonical = normalizer
            .normalize_fuzzy(label)
            .map(|test| test.as_str())
            .unwrap_or("-");
        println!("{}\t{}", label, canonical);
    }
}

// ── Text output ───────────────────────────────────────────────────────────────

fn print_text(result: &AnalysisResult) {
    let summary = &result.summary;

    println!();
    println!("Overall status: {}", summary.overall_status.label());
    println!("{}", summary.summary_text);
    println!(
        "Tests: {} total, {} normal, {} abnormal",
        summary.total_tests, summary.normal_tests, summary.abnormal_tests
    );

    if !result.classified_values.is_empty() {
        println!();
        println!("Results");
        for value in result.classified_values.values() {
            println!(
                "  {:<26} {:>10} {:<8} {:<15} ({})",
                value.test().display_name(),
                format!("{:.1}", value.value),
                value.unit,
                value.status_label(),
                value.range_used.label()
            );
        }
    }

    let unranged: Vec<_> = result
        .extracted_values
        .values()
        .filter(|v| !result.classified_values.contains_key(&v.test))
        .collect();
    if !unranged.is_empty() {
        println!();
        println!("Other values");
        for value in unranged {
            println!(
                "  {:<26} {:>10} {}",
                value.test.display_name(),
                value.value,
                value.raw_unit.as_deref().unwrap_or("")
            );
        }
    }

    if !result.alerts.is_empty() {
        println!();
        println!("Alerts");
        for alert in &result.alerts {
            println!("  ! {}", alert.message);
        }
    }

    let risk = &result.risk_scores;
    println!();
    println!("Risk scores");
    println!("  Cardiovascular {:>6.1}", risk.cardiovascular);
    println!("  Diabetes       {:>6.1}", risk.diabetes);
    println!("  Overall        {:>6.1}", risk.overall);

    println!();
    println!("Recommendations");
    for (category, items) in result.recommendations.iter() {
        println!("  [{}]", category);
        for advice in items {
            println!("    - {}", advice);
        }
    }
    println!();
}
