// Command-line front end for the fraud analytics dashboard. Loads transaction
// data from a file or the prediction service and prints the chart datasets and
// the filtered transaction table.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fraud_dashboard::api::{run_bulk_prediction, submit_prediction, FraudApi, HttpFraudApi, PredictionForm};
use fraud_dashboard::config::DashboardConfig;
use fraud_dashboard::export::{export_to_file, DEFAULT_EXPORT_FILE};
use fraud_dashboard::filter::format_cell;
use fraud_dashboard::notify::{format_file_size, Notifier, Severity, TracingNotifier};
use fraud_dashboard::record::read_any;
use fraud_dashboard::{ChartSet, DashboardView, FraudFilter, LoadOutcome, TableWindow};

const HIGH_FRAUD_RATE_THRESHOLD: u32 = 50;
const MEDIUM_FRAUD_RATE_THRESHOLD: u32 = 20;

#[derive(Parser)]
#[command(name = "fraud-dashboard")]
#[command(about = "Fraud analytics over transaction logs and prediction results")]
struct Cli {
    /// Optional TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct TableArgs {
    /// all, fraud or non-fraud
    #[arg(long, default_value = "all")]
    filter: FraudFilter,
    /// Case-insensitive text matched against every field
    #[arg(long, default_value = "")]
    search: String,
    /// Show the last rows instead of the first
    #[arg(long)]
    last: bool,
    /// Print chart datasets as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a local CSV or JSON file of transactions
    Analyze {
        input: PathBuf,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Fetch the transaction log from the prediction service
    Fetch {
        /// Only this customer's transactions
        #[arg(long)]
        customer: Option<String>,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Score a single transaction
    Predict {
        #[arg(long, default_value = "")]
        amount: String,
        #[arg(long, default_value = "")]
        time: String,
        #[arg(long = "type", default_value = "")]
        kind: String,
        #[arg(long, default_value = "")]
        merchant_id: String,
        #[arg(long, default_value = "")]
        customer_id: String,
    },
    /// Upload a CSV file for bulk scoring
    Bulk {
        file: PathBuf,
        /// Write the scored results to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Re-export a local CSV or JSON file as CSV
    Export {
        input: PathBuf,
        #[arg(default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },
}

// Prints the four chart datasets for the full record snapshot
fn print_charts(charts: &ChartSet) {
    let dist = &charts.fraud_distribution;
    println!("\nFraud Distribution:");
    println!("Legitimate: {}", dist.legitimate_count);
    println!("Fraudulent: {} ({:.1}%)", dist.fraudulent_count, dist.fraud_share());

    println!("\nTransaction Types:");
    for bucket in &charts.transaction_types {
        println!(
            "{:<10} total {:>6}  fraud {:>6}  rate {:>3}%  {}",
            bucket.kind,
            bucket.total,
            bucket.fraud_count,
            bucket.fraud_rate,
            risk_level(bucket.fraud_rate)
        );
    }

    println!("\nFraud Rate by Amount Range:");
    for bucket in &charts.amount_ranges {
        println!(
            "{:<8} total {:>6}  fraud {:>6}  rate {:>3}%",
            bucket.label, bucket.total, bucket.fraud_count, bucket.fraud_rate
        );
    }

    println!("\nFraud Rate Over Time:");
    for bucket in &charts.periods {
        println!("{:<9} total {:>6}  rate {:.2}%", bucket.label, bucket.total, bucket.fraud_rate);
    }
}

fn risk_level(fraud_rate: u32) -> &'static str {
    if fraud_rate >= HIGH_FRAUD_RATE_THRESHOLD {
        "High Risk"
    } else if fraud_rate >= MEDIUM_FRAUD_RATE_THRESHOLD {
        "Medium Risk"
    } else {
        "Low Risk"
    }
}

fn print_table(view: &mut DashboardView) {
    let headers = view.headers();
    let field_names: Vec<String> = view
        .records()
        .first()
        .map(|tx| tx.field_names().into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    let total = view.filtered().len();

    println!("\nTransaction Data ({total} matching):");
    println!("{}", headers.join(" | "));
    for tx in view.visible_rows() {
        let cells: Vec<String> = field_names
            .iter()
            .map(|name| tx.get(name).map(|value| format_cell(name, &value)).unwrap_or_default())
            .collect();
        println!("{}", cells.join(" | "));
    }
}

fn show(view: &mut DashboardView, table: &TableArgs) -> Result<()> {
    view.set_filter(table.filter);
    view.set_search(table.search.clone());
    if table.last {
        let n = match view.window() {
            TableWindow::First(n) | TableWindow::Last(n) => n,
        };
        view.set_window(TableWindow::Last(n));
    }

    if table.json {
        println!("{}", serde_json::to_string_pretty(&view.charts())?);
    } else {
        print_charts(&view.charts());
        print_table(view);
    }
    Ok(())
}

fn describe_upload(path: &Path, notifier: &dyn Notifier) {
    if let Ok(meta) = std::fs::metadata(path) {
        notifier.notify(
            "File Selected",
            &format!("{} ({})", path.display(), format_file_size(meta.len())),
            Severity::Default,
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "fraud_dashboard=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let notifier = TracingNotifier;

    match cli.command {
        Commands::Analyze { input, table } => {
            let records = read_any(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            info!(path = %input.display(), records = records.len(), "analyzing file");
            let mut view = DashboardView::new(&config);
            view.replace_records(records);
            show(&mut view, &table)?;
        }
        Commands::Fetch { customer, table } => {
            let api = HttpFraudApi::new(&config)?;
            let mut view = DashboardView::new(&config);
            let outcome = match customer {
                Some(customer) => {
                    let ticket = view.begin_load();
                    let result = api.fetch_customer_logs(&customer);
                    view.finish_load(ticket, result, &notifier)
                }
                None => view.load_from(&api, &notifier),
            };
            if outcome == LoadOutcome::Failed {
                bail!("could not fetch transaction log from {}", config.api_base_url);
            }
            show(&mut view, &table)?;
        }
        Commands::Predict {
            amount,
            time,
            kind,
            merchant_id,
            customer_id,
        } => {
            let form = PredictionForm {
                amount,
                time,
                kind,
                merchant_id,
                customer_id,
            };
            let api = HttpFraudApi::new(&config)?;
            let response = submit_prediction(&api, &form)?;
            println!("Prediction: {}", response.label());
            if let Some(confidence) = response.confidence {
                println!("Confidence: {:.1}%", confidence * 100.0);
            }
        }
        Commands::Bulk { file, export } => {
            describe_upload(&file, &notifier);
            let api = HttpFraudApi::new(&config)?;
            let results = run_bulk_prediction(&api, &file, &notifier)?;
            print_charts(&ChartSet::compute(&results, config.num_periods));
            if let Some(path) = export {
                export_to_file(&results, &path)?;
            }
        }
        Commands::Export { input, output } => {
            let records = read_any(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            export_to_file(&records, &output)?;
        }
    }

    Ok(())
}
