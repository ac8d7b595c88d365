//! CLI entry point for the churn dashboard engine.

use anyhow::{Result, anyhow};
use churn_dashboard::{
    AgeRange, CategoryCount, CategoryValue, Dashboard, DashboardConfig, DashboardSnapshot,
    DataSource, FilterOptions, FilterSelection, Panel, Selection, TableCache, format_currency,
    format_percentage,
};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    author = "Churn Dashboard Team",
    version,
    about = "Telecom customer churn dashboard engine",
    long_about = "Loads a telecom churn CSV, cleans it once and evaluates a filter selection.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  CHURN_DATASET    Default dataset path (also read from .env)\n\n\
                  EXAMPLES:\n  \
                  # Whole dataset\n  \
                  churn-dashboard -i telecom_customer_churn.csv\n\n  \
                  # Month-to-Month customers aged 25 to 40\n  \
                  churn-dashboard -i data.csv --contract Month-to-Month --min-age 25 --max-age 40\n\n  \
                  # Machine-readable snapshot\n  \
                  churn-dashboard -i data.csv --offer \"Offer E\" --json"
)]
struct Args {
    /// Path to the churn dataset CSV
    #[arg(short, long, env = "CHURN_DATASET")]
    input: PathBuf,

    /// Contract type to keep (repeatable). Default: all contract types
    #[arg(long = "contract", value_name = "CONTRACT")]
    contracts: Vec<String>,

    /// Select no contract type at all (matches no rows)
    #[arg(long, conflicts_with = "contracts")]
    no_contracts: bool,

    /// Offer to keep (repeatable). Default: all offers
    #[arg(long = "offer", value_name = "OFFER")]
    offers: Vec<String>,

    /// Select no offer at all (matches no rows)
    #[arg(long, conflicts_with = "offers")]
    no_offers: bool,

    /// Lower age bound (inclusive)
    ///
    /// When only one bound is given the other defaults to the dataset's bound
    #[arg(long)]
    min_age: Option<i64>,

    /// Upper age bound (inclusive)
    #[arg(long)]
    max_age: Option<i64>,

    /// Number of neighbors for KNN imputation
    #[arg(long)]
    knn_neighbors: Option<usize>,

    /// JSON file with a dashboard configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output the JSON snapshot to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the snapshot is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // .env must be loaded before parsing so CHURN_DATASET can come from it
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    info!("Loading dataset from: {}", args.input.display());
    let mut cache = TableCache::new(config);
    let dashboard = match Dashboard::open(&mut cache, &DataSource::path(&args.input)) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("Failed to load dataset [{}]: {}", e.error_code(), e);
            return Err(anyhow!("Failed to load dataset: {}", e));
        }
    };

    let selection = build_selection(&args, dashboard.options())?;
    let snapshot = dashboard.snapshot(&selection)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_human_readable_summary(&snapshot);
    Ok(())
}

fn build_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_json_file(path)?,
        None => DashboardConfig::default(),
    };

    if let Some(k) = args.knn_neighbors {
        config.knn_neighbors = k;
        config.validate()?;
    }

    Ok(config)
}

fn build_selection(args: &Args, options: &FilterOptions) -> Result<FilterSelection> {
    let contract_types = if args.no_contracts {
        Selection::none()
    } else if args.contracts.is_empty() {
        Selection::All
    } else {
        Selection::only(args.contracts.iter().cloned())
    };

    let offers = if args.no_offers {
        Selection::none()
    } else if args.offers.is_empty() {
        Selection::All
    } else {
        Selection::only(args.offers.iter().cloned())
    };

    let age_range = match (args.min_age, args.max_age) {
        (None, None) => None,
        (min, max) => Some(AgeRange::new(
            min.unwrap_or(options.age_bounds.0),
            max.unwrap_or(options.age_bounds.1),
        )?),
    };

    Ok(FilterSelection {
        contract_types,
        age_range,
        offers,
    })
}

/// Print a human-readable summary of the snapshot.
///
/// Uses `println!` intentionally: this is the primary output, not logging.
fn print_human_readable_summary(snapshot: &DashboardSnapshot) {
    println!();
    println!("{}", "=".repeat(80));
    println!("TELECOM CUSTOMER CHURN DASHBOARD");
    println!("{}", "=".repeat(80));
    println!();

    println!("Source: {}", snapshot.source);
    println!(
        "Rows:   {} of {} match the selection",
        snapshot.filtered_rows, snapshot.total_rows
    );
    println!();

    println!("Key Metrics:");
    println!("  Churn Rate:  {}", snapshot.metrics.churn_rate_display());
    println!("  Avg Revenue: {}", snapshot.metrics.avg_revenue_display());
    println!();

    let panels = &snapshot.panels;

    println!("Customer Overview:");
    print_counts("Gender", &panels.gender_distribution);
    print_counts("Married", &panels.marital_status);
    match &panels.age_distribution {
        Panel::Ready(bins) => {
            let peak = bins.iter().max_by_key(|b| b.count);
            if let Some(peak) = peak {
                println!(
                    "  Age: {} bins, peak {:.0}-{:.0} ({} customers)",
                    bins.len(),
                    peak.start,
                    peak.end,
                    peak.count
                );
            }
        }
        other => println!("  Age: {}", status_label(other)),
    }
    println!();

    println!("Revenue Analysis:");
    print_values("Revenue by contract (mean)", &panels.revenue_by_contract);
    print_points("Revenue vs age", &panels.revenue_vs_age);
    print_points("Monthly vs total charges", &panels.monthly_vs_total_charges);
    println!();

    println!("Churn Analysis:");
    print_counts("Customer status", &panels.status_distribution);
    print_counts("Churn reasons", &panels.churn_reasons);
    match &panels.churn_rate_by_contract {
        Panel::Ready(rows) => {
            println!("  Churn rate by contract:");
            for row in rows {
                let rate = row
                    .churn_rate
                    .map(format_percentage)
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "    {:<20} {:>7}  ({} churned, {} stayed)",
                    row.contract, rate, row.churned, row.stayed
                );
            }
        }
        other => println!("  Churn rate by contract: {}", status_label(other)),
    }
    println!();

    println!("Offer Analysis:");
    print_counts("Offer popularity", &panels.offer_popularity);
    print_values("Revenue by offer (total)", &panels.revenue_by_offer);
    println!();

    if !snapshot.notices.is_empty() {
        println!("Notices:");
        for notice in &snapshot.notices {
            println!("  ! {}", notice);
        }
        println!();
    }

    let report = &snapshot.cleaning;
    println!(
        "Cleaning: {} cells filled across {} steps",
        report.total_filled(),
        report.steps.len()
    );
    for step in &report.steps {
        println!("  - {}", step);
    }
    if !report.skipped_columns.is_empty() {
        println!("  Skipped (not in dataset): {}", report.skipped_columns.join(", "));
    }
    println!();

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

fn status_label<T>(panel: &Panel<T>) -> String {
    match panel {
        Panel::Ready(_) => "ready".to_string(),
        Panel::NoData => "No data for the current selection".to_string(),
        Panel::Unavailable { columns } => {
            format!("Not available (missing {})", columns.join(", "))
        }
    }
}

fn print_counts(title: &str, panel: &Panel<Vec<CategoryCount>>) {
    match panel {
        Panel::Ready(counts) => {
            let parts: Vec<String> = counts
                .iter()
                .map(|c| format!("{} {}", c.label, c.count))
                .collect();
            println!("  {}: {}", title, parts.join(", "));
        }
        other => println!("  {}: {}", title, status_label(other)),
    }
}

fn print_values(title: &str, panel: &Panel<Vec<CategoryValue>>) {
    match panel {
        Panel::Ready(values) => {
            println!("  {}:", title);
            for v in values {
                println!("    {:<20} {:>14}", v.label, format_currency(v.value));
            }
        }
        other => println!("  {}: {}", title, status_label(other)),
    }
}

fn print_points<T>(title: &str, panel: &Panel<Vec<T>>) {
    match panel {
        Panel::Ready(points) => println!("  {}: {} points", title, points.len()),
        other => println!("  {}: {}", title, status_label(other)),
    }
}
