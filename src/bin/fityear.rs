//! fityear CLI - Generate a yearly fitness report from cached raw exports
//!
//! Invoked with a target year (and optionally a previous year for the
//! year-over-year comparison). Missing input for the target year is the
//! only fatal condition; a missing previous year produces a report without
//! a comparison section.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use fityear::store::DEFAULT_NAMESPACE;
use fityear::{
    Aggregator, Comparator, FileStore, Normalizer, ReportBuilder, ReportConfig, ReportError,
    YearAggregate, YearSource, FITYEAR_VERSION,
};

/// fityear - yearly fitness report generator
#[derive(Parser)]
#[command(name = "fityear")]
#[command(version = FITYEAR_VERSION)]
#[command(about = "Aggregate a year of fitness data into a report document", long_about = None)]
struct Cli {
    /// Report year, e.g. 2025
    #[arg(long)]
    year: i32,

    /// Comparison year (defaults to year - 1)
    #[arg(long)]
    previous_year: Option<i32>,

    /// Root directory containing <namespace>_<year> directories
    #[arg(long, default_value = ".")]
    report_root: PathBuf,

    /// Year directory namespace
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Weekly intensity-minutes goal
    #[arg(long, default_value = "200")]
    weekly_goal: f64,

    /// Row cap for top-activity tables
    #[arg(long, default_value = "10")]
    top_n: usize,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Skip writing the embedding HTML page
    #[arg(long)]
    no_html: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.code, e.message);
            if let Some(hint) = e.hint {
                eprintln!("  hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ReportConfig {
        weekly_intensity_goal_minutes: cli.weekly_goal,
        top_n: cli.top_n,
        ..ReportConfig::default()
    };
    let store = FileStore::new(&cli.report_root, &cli.namespace);

    let current = aggregate_year(&store, cli.year, &config)?;

    let previous_year = cli.previous_year.unwrap_or(cli.year - 1);
    let previous = match store.try_fetch_year(previous_year).map_err(CliError::from)? {
        Some(raw) => Some(aggregate_raw(raw, previous_year, &config)),
        None => {
            eprintln!(
                "warning: no raw data for {previous_year}; report will have no year-over-year section"
            );
            None
        }
    };

    let comparison = Comparator::compare_years(&current, previous.as_ref());
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let document = ReportBuilder::build(
        &current,
        previous.as_ref(),
        comparison.as_ref(),
        &generated_at,
    );

    let json = if cli.compact {
        serde_json::to_string(&document).map_err(ReportError::from)?
    } else {
        serde_json::to_string_pretty(&document).map_err(ReportError::from)?
    };
    let page = if cli.no_html {
        None
    } else {
        Some(ReportBuilder::render_page(&document)?)
    };
    let json_path = store.write_report(cli.year, &json, page.as_deref())?;

    println!("report written: {}", json_path.display());
    println!(
        "  activities: {}  active days: {}  distance: {:.1} km",
        document.activity_overview.total_activities,
        document.activity_overview.active_days,
        document.activity_overview.total_distance_km,
    );
    println!(
        "  total steps: {:.0}  comparison rows: {}",
        document.health_overview.total_steps,
        document.comparison_rows.len(),
    );
    Ok(())
}

fn aggregate_year(
    store: &FileStore,
    year: i32,
    config: &ReportConfig,
) -> Result<YearAggregate, CliError> {
    let raw = store.fetch_year(year)?;
    if raw.dropped_records > 0 {
        eprintln!(
            "warning: dropped {} malformed raw records for {year}",
            raw.dropped_records
        );
    }
    Ok(aggregate_raw(raw, year, config))
}

fn aggregate_raw(
    raw: fityear::RawYearData,
    year: i32,
    config: &ReportConfig,
) -> YearAggregate {
    let activities = Normalizer::normalize_activities(&raw.activities);
    let daily_health = Normalizer::normalize_daily_health(&raw.daily_health, config);
    Aggregator::aggregate_year(&activities, &daily_health, year, config)
}

struct CliError {
    code: &'static str,
    message: String,
    hint: Option<String>,
}

impl From<ReportError> for CliError {
    fn from(e: ReportError) -> Self {
        match &e {
            ReportError::MissingInput { year, .. } => CliError {
                code: "MISSING_INPUT",
                message: e.to_string(),
                hint: Some(format!(
                    "fetch raw data for {year} first, or point --report-root at the cache directory"
                )),
            },
            ReportError::Json(_) => CliError {
                code: "JSON_ERROR",
                message: e.to_string(),
                hint: Some("check that the raw data files contain valid JSON".to_string()),
            },
            ReportError::Io(_) => CliError {
                code: "IO_ERROR",
                message: e.to_string(),
                hint: Some("check file paths and permissions".to_string()),
            },
            ReportError::Template(_) => CliError {
                code: "TEMPLATE_ERROR",
                message: e.to_string(),
                hint: None,
            },
        }
    }
}
