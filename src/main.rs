use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use tracing::error;

use stock_lens::aggregate::aggregate;
use stock_lens::chart::ChartOptions;
use stock_lens::generator::DemoGenerator;
use stock_lens::logging;
use stock_lens::report;
use stock_lens::store::{StoreConfig, TableStore, INVENTORY_FILE, ORDERS_FILE};
use stock_lens::tui;
use stock_lens::types::QuerySelection;
use stock_lens::web;

#[derive(Parser)]
#[command(name = "stock-lens", about = "Inventory & order dashboard per ASIN, split by region and warehouse")]
struct Cli {
    /// Run mode: tui, web, or headless
    #[arg(long, default_value = "tui")]
    mode: String,

    /// Web server port (web mode only)
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Inventory table (.parquet or .csv)
    #[arg(long, default_value = INVENTORY_FILE)]
    inventory: PathBuf,

    /// Orders table (.parquet or .csv); optional at runtime
    #[arg(long, default_value = ORDERS_FILE)]
    orders: PathBuf,

    /// Product identifier to show first
    #[arg(long, default_value = "")]
    asin: String,

    /// Start of the date window (YYYY-MM-DD); defaults to the first inventory date
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the date window (YYYY-MM-DD); defaults to the last inventory date
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Let chart x-axes fit the whole order history instead of the window
    #[arg(long)]
    no_lock_x_axis: bool,

    /// Use a generated demo dataset instead of reading files
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(if cli.mode == "tui" { "warn" } else { "info" });

    let store = match load_store(&cli) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "cannot start without an inventory table");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let options = ChartOptions { lock_x_axis: !cli.no_lock_x_axis };
    let (min, max) = store.default_range();
    let selection = QuerySelection::new(&cli.asin, cli.start.unwrap_or(min), cli.end.unwrap_or(max));

    match cli.mode.as_str() {
        "tui" => tui::run(store, options, selection)?,
        "web" => web::run(cli.port, store, options).await?,
        "headless" => run_headless(&store, options, &selection)?,
        other => eprintln!("Unknown mode: {other}. Use --mode tui|web|headless"),
    }

    Ok(())
}

fn load_store(cli: &Cli) -> stock_lens::error::Result<TableStore> {
    if cli.demo {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let (inventory, orders) = DemoGenerator::new(42).generate(5, start, 90);
        return Ok(TableStore::from_records(inventory, Some(orders)));
    }
    TableStore::open(&StoreConfig {
        inventory_path: cli.inventory.clone(),
        orders_path: cli.orders.clone(),
    })
}

fn run_headless(store: &TableStore, options: ChartOptions, selection: &QuerySelection) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== stock-lens (headless) ===");
    println!(
        "ASINs: {}, orders table: {}",
        store.asin_count(),
        if store.has_orders() { "loaded" } else { "missing" }
    );
    println!();

    let report = aggregate(store, selection);
    report::write_text(&mut io::stdout().lock(), &report, options)?;
    Ok(())
}
