use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, info_span};

mod aggregate;
mod anomaly;
mod dashboard;
mod error;
mod infer;
mod logging;
mod mapping;
mod models;
mod normalize;
mod pipeline;
mod report;
mod scorer;
mod sources;
mod table;

use logging::{LogFormat, LogLevel};
use mapping::ColumnMapping;
use models::{Selection, VarianceStatus};

#[derive(Parser)]
#[command(name = "transformation-insights")]
#[command(about = "Data profiling and governance scoring for transformation programmes", long_about = None)]
struct Cli {
    #[arg(long, global = true, value_enum, env = "INSIGHTS_LOG_LEVEL", default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[arg(long, global = true, value_enum, env = "INSIGHTS_LOG_FORMAT", default_value_t = LogFormat::Human)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer column kinds and suggest default roles
    Profile {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Compute KPIs, category and trend aggregates, and anomalies
    Analyze {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        numeric: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        /// Replay a saved column mapping
        #[arg(long)]
        mapping: Option<PathBuf>,
        /// Save the resolved column mapping
        #[arg(long)]
        save_mapping: Option<PathBuf>,
        /// Sort category totals from largest to smallest
        #[arg(long)]
        sort: bool,
        #[arg(long, env = "INSIGHTS_CURRENCY", default_value = "₹")]
        currency: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Score a PDF or text document against governance keyword heuristics
    ScoreDoc {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Summarize a transformation tracking workbook
    Dashboard {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, env = "INSIGHTS_CURRENCY", default_value = "₹")]
        currency: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level, cli.log_format);

    let run_id = logging::generate_run_id();
    let span = info_span!("run", run_id = %run_id);
    let _guard = span.enter();

    match run(cli.command, &run_id) {
        Err(err) if is_configuration_error(&err) => {
            eprintln!("Configuration error: {err:#}");
            std::process::exit(2);
        }
        result => result,
    }
}

fn is_configuration_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<error::EngineError>())
        .any(error::EngineError::is_configuration)
}

fn run(command: Commands, run_id: &str) -> anyhow::Result<()> {
    match command {
        Commands::Profile { file, sheet } => {
            let workbook = sources::load_workbook(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            let sheets = workbook.sheet_names().join(", ");
            let table = workbook.into_sheet(sheet.as_deref())?;
            let defaults = infer::default_selection(&table);
            let profiles = pipeline::profile_columns(&table, &defaults);

            println!("Sheets: {sheets}");
            println!("{} rows, {} columns:", table.row_count(), profiles.len());
            for profile in &profiles {
                println!(
                    "- {} ({}): {} values, {} missing, {} distinct",
                    profile.name, profile.kind, profile.non_missing, profile.missing, profile.distinct
                );
            }
            println!("Suggested numeric column: {}", role_label(&defaults.numeric));
            println!("Suggested category column: {}", role_label(&defaults.category));
            println!("Suggested date column: {}", role_label(&defaults.date));
        }
        Commands::Analyze {
            file,
            sheet,
            numeric,
            category,
            date,
            mapping,
            save_mapping,
            sort,
            currency,
            out,
            json,
        } => {
            let mut table = sources::load_table(&file, sheet.as_deref())
                .with_context(|| format!("failed to load {}", file.display()))?;

            let mut explicit =
                Selection::from_names(numeric.as_deref(), category.as_deref(), date.as_deref());
            if let Some(path) = &mapping {
                let saved = ColumnMapping::load(path)
                    .with_context(|| format!("failed to read mapping {}", path.display()))?;
                explicit = explicit.or(Selection::from(saved));
            }

            let inferred = infer::default_selection(&table);
            let selection = infer::resolve(&table, &explicit, &inferred)?;
            info!(?selection, "resolved column roles");

            if let Some(path) = &save_mapping {
                ColumnMapping::from(&selection)
                    .save(path)
                    .with_context(|| format!("failed to save mapping {}", path.display()))?;
            }

            let mut analysis = pipeline::analyze(&mut table, &selection, run_id)?;
            if sort {
                analysis.by_category = analysis.by_category.sorted_by_value_desc();
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_analysis(&analysis, &currency);
            }

            if let Some(out) = out {
                let report = report::build_analysis_report(&source_label(&file), &analysis, &currency);
                write_report(&out, &report, !json)?;
            }
        }
        Commands::ScoreDoc { file, out, json } => {
            let text = sources::load_document(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            let card = scorer::score_document(&text);

            if json {
                println!("{}", serde_json::to_string_pretty(&card)?);
            } else {
                if card.executive_summary.is_empty() {
                    println!("No key insights found.");
                } else {
                    println!("Executive summary: {}", card.executive_summary);
                }
                println!("Sentiment: {}", card.sentiment.label);
                println!("Mentions KPIs: {}", card.mentions_kpi);
                println!("Mentions percentages: {}", card.mentions_percentage);
                println!("Risk coverage: {}/100", card.risk_coverage);
                println!("AI maturity: {}", card.maturity);
            }

            if let Some(out) = out {
                let report = report::build_document_report(&source_label(&file), &card);
                write_report(&out, &report, !json)?;
            }
        }
        Commands::Dashboard {
            file,
            currency,
            out,
            json,
        } => {
            let workbook = sources::load_workbook(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            let dashboard = dashboard::build_dashboard(&workbook)?;
            let report = report::build_dashboard_report(&source_label(&file), &dashboard, &currency);

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print!("{report}");
            }

            if let Some(out) = out {
                write_report(&out, &report, !json)?;
            }
        }
    }

    Ok(())
}

fn print_analysis(analysis: &models::Analysis, currency: &str) {
    let summary = &analysis.summary;
    println!("Total: {}", report::format_currency(summary.total, currency));
    println!("Average: {}", report::format_currency(summary.average, currency));
    println!("Maximum: {}", report::format_currency(summary.maximum, currency));

    if !analysis.by_category.is_empty() {
        println!("By category:");
        for (label, total) in &analysis.by_category.entries {
            println!("- {}: {}", label, report::format_currency(*total, currency));
        }
    }

    if !analysis.by_time.is_empty() {
        println!("Trend:");
        for (when, total) in &analysis.by_time.entries {
            println!(
                "- {}: {}",
                when.format(table::DATETIME_DISPLAY_FORMAT),
                report::format_currency(*total, currency)
            );
        }
    }

    match analysis.anomalies.status {
        VarianceStatus::Insufficient => println!("Insufficient variance for anomaly detection."),
        VarianceStatus::Sufficient { .. } if analysis.anomalies.anomalies.is_empty() => {
            println!("No anomalies detected.")
        }
        VarianceStatus::Sufficient { .. } => {
            println!("Anomalies:");
            for row in &analysis.anomalies.anomalies {
                println!("- row {} value {:.2} (z {:.2})", row.index, row.value, row.z_score);
            }
        }
    }
}

fn role_label(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("None")
}

fn source_label(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

fn write_report(out: &Path, report: &str, announce: bool) -> anyhow::Result<()> {
    std::fs::write(out, report).with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), "report written");
    if announce {
        println!("Report written to {}.", out.display());
    }
    Ok(())
}
