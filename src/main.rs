use crate::error::OrderError;
use crate::format::{format_currency, format_percent, format_shares};
use crate::instrument::{AssetTab, Instrument};
use crate::order::{Clock, Order, OrderForm, SystemClock, TransactionType};
use crate::portfolio::PortfolioView;
use crate::search::InstrumentSelector;
use crate::store::{KeyValueStore, MemoryStore, OrderBook, SledStore};
use crate::tui::{Timing, View};

use clap::{arg, ArgMatches, Command};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color, Table};
use eyre::{eyre, WrapErr};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod add_investment;
mod error;
mod fixtures;
mod format;
mod instrument;
mod learning;
mod order;
mod portfolio;
mod search;
mod stock_detail;
mod store;
mod timer;
mod tui;

const APP_NAME: &str = "investvision";

#[derive(Debug, Serialize, Deserialize)]
struct Config {
    store_path: String,
    currency: String,
    jitter_interval_secs: u64,
    load_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: "investvision_db".to_string(),
            currency: "USD".to_string(),
            jitter_interval_secs: 5,
            load_delay_ms: 500,
        }
    }
}

impl Config {
    fn timing(&self) -> Timing {
        Timing {
            jitter_interval: Duration::from_secs(self.jitter_interval_secs.max(1)),
            load_delay: Duration::from_millis(self.load_delay_ms),
        }
    }
}

fn cli() -> Command {
    Command::new(APP_NAME)
        .about("A terminal investment dashboard with mock market data")
        .arg_required_else_help(true)
        .arg(arg!(--ephemeral "Keep orders in memory instead of the on-disk store").global(true))
        .subcommand(Command::new("config").about("Print the path to the config file"))
        .subcommand(Command::new("holdings").about("Show the holdings of the demo portfolio"))
        .subcommand(Command::new("orders").about("List the recorded orders"))
        .subcommand(
            Command::new("search")
                .about("Search instruments by symbol or name")
                .arg(arg!(<QUERY> "At least two characters of a symbol or name"))
                .arg(
                    arg!(--tab <TAB> "Asset type to search")
                        .value_parser(["stocks", "etfs", "crypto"])
                        .default_value("stocks"),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Record a buy or sell order")
                .arg(arg!(<SYMBOL> "Instrument symbol, e.g. AAPL"))
                .arg(arg!(<SHARES> "Number of shares"))
                .arg(arg!(--sell "Record a sell instead of a buy"))
                .arg(arg!(--price <PRICE> "Price per share (defaults to the current price)"))
                .arg(arg!(--date <DATE> "Order date as YYYY-MM-DD (defaults to today)")),
        )
        .subcommand(
            Command::new("tui")
                .about("Start the interactive terminal UI")
                .arg(
                    arg!(--view <VIEW> "Screen to open first")
                        .value_parser(["dashboard", "learning", "add", "stock"]),
                )
                .arg(arg!(--symbol <SYMBOL> "Symbol for the stock view")),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(cfg: &Config, ephemeral: bool) -> eyre::Result<Box<dyn KeyValueStore>> {
    if ephemeral {
        debug!("using in-memory order store");
        return Ok(Box::new(MemoryStore::new()));
    }
    let store = SledStore::open(&cfg.store_path)
        .wrap_err_with(|| format!("Failed to open order store at {}", cfg.store_path))?;
    Ok(Box::new(store))
}

/// Fills an order form the way the add-investment screen would and submits
/// it.
fn add_order<S: KeyValueStore, C: Clock>(
    matches: &ArgMatches,
    book: &OrderBook<S>,
    clock: &C,
) -> eyre::Result<Result<Order, OrderError>> {
    let symbol = matches
        .get_one::<String>("SYMBOL")
        .ok_or_else(|| eyre!("missing SYMBOL"))?;
    let shares = matches
        .get_one::<String>("SHARES")
        .ok_or_else(|| eyre!("missing SHARES"))?;
    let instrument: &Instrument = fixtures::find_instrument(symbol)
        .ok_or_else(|| eyre!("Unknown symbol: {}", symbol.to_uppercase()))?;

    let mut form = OrderForm::new(clock);
    form.instrument_changed(instrument);
    form.set_shares(shares, Some(instrument));
    if matches.get_flag("sell") {
        form.transaction_type = TransactionType::Sell;
    }
    if let Some(price) = matches.get_one::<String>("price") {
        form.set_price(price);
    }
    if let Some(date) = matches.get_one::<String>("date") {
        form.set_date(date);
    }
    Ok(form.submit(Some(instrument), book, clock))
}

fn resolve_view(view: Option<&String>, symbol: Option<&String>) -> eyre::Result<Option<View>> {
    match (view.map(String::as_str), symbol) {
        (Some("stock"), Some(symbol)) | (None, Some(symbol)) => {
            Ok(Some(View::StockDetail(symbol.to_uppercase())))
        }
        (Some("stock"), None) => Err(eyre!("--view stock needs --symbol")),
        (Some(view), _) => view.parse::<View>().map(Some).map_err(|e| eyre!(e)),
        (None, None) => Ok(None),
    }
}

fn print_instruments(instruments: &[Instrument], currency: &str) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Symbol").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Price").add_attribute(Attribute::Bold),
        Cell::new("Change").add_attribute(Attribute::Bold),
    ]);
    for instrument in instruments {
        let c = if instrument.is_gaining() { Color::Green } else { Color::Red };
        table.add_row(vec![
            Cell::new(&instrument.symbol),
            Cell::new(&instrument.name),
            Cell::new(format_currency(instrument.price, currency))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!(
                "{} ({})",
                format_currency(instrument.change, currency),
                format_percent(instrument.change_percent)
            ))
            .set_alignment(CellAlignment::Right)
            .fg(c),
        ]);
    }
    println!("{table}");
}

fn print_orders(orders: &[Order], currency: &str) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Date").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Symbol").add_attribute(Attribute::Bold),
        Cell::new("Shares").add_attribute(Attribute::Bold),
        Cell::new("Price").add_attribute(Attribute::Bold),
        Cell::new("Total").add_attribute(Attribute::Bold),
    ]);
    for order in orders {
        let c = match order.transaction_type {
            TransactionType::Buy => Color::Green,
            TransactionType::Sell => Color::Red,
        };
        table.add_row(vec![
            Cell::new(order.date),
            Cell::new(order.transaction_type.as_str().to_uppercase()).fg(c),
            Cell::new(format!("{} ({})", order.symbol, order.name)),
            Cell::new(format_shares(order.shares)).set_alignment(CellAlignment::Right),
            Cell::new(format_currency(order.price, currency)).set_alignment(CellAlignment::Right),
            Cell::new(format_currency(order.total_amount, currency))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();

    let cfg: Config = confy::load(APP_NAME, "config").wrap_err("Failed to load config")?;
    debug!(?cfg, "loaded config");

    let matches = cli().get_matches();
    let ephemeral = matches.get_flag("ephemeral");

    match matches.subcommand() {
        Some(("config", _)) => {
            let path = confy::get_configuration_file_path(APP_NAME, "config")?;
            println!("Your config file is located here: \n{}", path.display());
        }
        Some(("holdings", _)) => {
            PortfolioView::new().print(&cfg.currency);
        }
        Some(("orders", _)) => {
            let book = OrderBook::new(open_store(&cfg, ephemeral)?);
            let orders = book.load();
            if orders.is_empty() {
                println!("{}", "No orders recorded yet.".yellow());
            } else {
                print_orders(&orders, &cfg.currency);
            }
        }
        Some(("search", sub)) => {
            let query = sub.get_one::<String>("QUERY").map(String::as_str).unwrap_or("");
            let tab = sub
                .get_one::<String>("tab")
                .map(|t| t.parse::<AssetTab>())
                .transpose()
                .map_err(|e| eyre!(e))?
                .unwrap_or_default();
            let mut selector = InstrumentSelector::new();
            selector.set_tab(tab);
            selector.set_query(query);
            let results = selector.results();
            if results.is_empty() {
                println!("{}", format!("No {} match '{query}'", tab.title()).yellow());
            } else {
                print_instruments(results, &cfg.currency);
            }
        }
        Some(("add", sub)) => {
            let book = OrderBook::new(open_store(&cfg, ephemeral)?);
            match add_order(sub, &book, &SystemClock)? {
                Ok(order) => {
                    println!("{}", add_investment::SUCCESS_MESSAGE.green());
                    print_orders(&[order], &cfg.currency);
                }
                Err(e) => eprintln!("{}", e.to_string().red()),
            }
        }
        Some(("tui", sub)) => {
            let view = resolve_view(sub.get_one::<String>("view"), sub.get_one::<String>("symbol"))?;
            let book = OrderBook::new(open_store(&cfg, ephemeral)?);
            tui::run_tui(cfg.currency.clone(), book, cfg.timing(), view).await?;
        }
        _ => {
            cli().print_help()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::order::fixed_clock;

    #[test]
    fn test_cli() {
        let matches = cli().get_matches_from(vec![APP_NAME, "holdings"]);
        assert_eq!(matches.subcommand_name(), Some("holdings"));

        let matches = cli().get_matches_from(vec![APP_NAME, "search", "van", "--tab", "etfs"]);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "search");
        assert_eq!(sub.get_one::<String>("QUERY").unwrap(), "van");
        assert_eq!(sub.get_one::<String>("tab").unwrap(), "etfs");
    }

    #[test]
    fn test_cli_rejects_unknown_tab() {
        let res = cli().try_get_matches_from(vec![APP_NAME, "search", "ap", "--tab", "bonds"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_add_records_order() {
        let matches =
            cli().get_matches_from(vec![APP_NAME, "add", "aapl", "10", "--date", "2024-02-15"]);
        let (_, sub) = matches.subcommand().unwrap();
        let book = OrderBook::new(MemoryStore::new());

        let order = add_order(sub, &book, &fixed_clock()).unwrap().unwrap();
        assert_eq!(order.symbol, "AAPL");
        assert_eq!(order.total_amount, 1826.30);
        assert_eq!(order.transaction_type, TransactionType::Buy);
        assert_eq!(order.date.to_string(), "2024-02-15");
        assert_eq!(book.load(), vec![order]);
    }

    #[test]
    fn test_add_sell_with_bad_shares_is_rejected() {
        let matches = cli().get_matches_from(vec![APP_NAME, "add", "TSLA", "abc", "--sell"]);
        let (_, sub) = matches.subcommand().unwrap();
        let book = OrderBook::new(MemoryStore::new());

        let err = add_order(sub, &book, &fixed_clock()).unwrap().unwrap_err();
        assert!(matches!(
            err,
            OrderError::Validation(ValidationError::InvalidQuantity(_))
        ));
        assert!(book.load().is_empty());
    }

    #[test]
    fn test_add_unknown_symbol() {
        let matches = cli().get_matches_from(vec![APP_NAME, "add", "ZZZZ", "1"]);
        let (_, sub) = matches.subcommand().unwrap();
        let book = OrderBook::new(MemoryStore::new());
        assert!(add_order(sub, &book, &fixed_clock()).is_err());
    }

    #[test]
    fn test_resolve_view() {
        let stock = "stock".to_string();
        let nvda = "nvda".to_string();
        let learning = "learning".to_string();
        assert_eq!(
            resolve_view(Some(&stock), Some(&nvda)).unwrap(),
            Some(View::StockDetail("NVDA".to_string()))
        );
        assert!(resolve_view(Some(&stock), None).is_err());
        assert_eq!(
            resolve_view(Some(&learning), None).unwrap(),
            Some(View::Learning)
        );
        assert_eq!(resolve_view(None, None).unwrap(), None);
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.currency, "USD");
        assert_eq!(cfg.timing().jitter_interval, Duration::from_secs(5));
        assert_eq!(cfg.timing().load_delay, Duration::from_millis(500));
    }
}
