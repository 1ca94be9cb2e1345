use crate::fixtures;
use crate::format::{format_currency, format_percent, format_shares};
use crate::instrument::Holding;
use crate::timer::PeriodicTimer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

/// How often displayed prices are perturbed.
pub const JITTER_INTERVAL: Duration = Duration::from_secs(5);

const PRICE_JITTER: f64 = 1.0;
const CHANGE_JITTER: f64 = 0.25;

/// Headline numbers of the portfolio card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub daily_change: f64,
    pub daily_change_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistItem {
    pub id: u32,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
}

impl WatchlistItem {
    pub fn new(id: u32, symbol: &str, name: &str, price: f64, change: f64) -> Self {
        WatchlistItem {
            id,
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketNews {
    pub id: u32,
    pub title: String,
    pub source: String,
    pub time: String,
}

impl MarketNews {
    pub fn new(id: u32, title: &str, source: &str, time: &str) -> Self {
        MarketNews {
            id,
            title: title.to_string(),
            source: source.to_string(),
            time: time.to_string(),
        }
    }
}

/// Backing state of the dashboard screen.
///
/// While started, a periodic timer nudges every holding's price and daily
/// change to simulate a live market. The summary card keeps its seeded
/// values; it is not recomputed from the jittered holdings.
pub struct PortfolioView {
    pub summary: PortfolioSummary,
    pub holdings: Vec<Holding>,
    pub watchlist: Vec<WatchlistItem>,
    pub news: Vec<MarketNews>,
    pub selected_holding: usize,
    interval: Duration,
    timer: Option<PeriodicTimer>,
    rng: StdRng,
}

impl Default for PortfolioView {
    fn default() -> Self {
        Self::new()
    }
}

impl PortfolioView {
    pub fn new() -> PortfolioView {
        PortfolioView::with_rng(StdRng::from_os_rng())
    }

    pub fn with_rng(rng: StdRng) -> PortfolioView {
        PortfolioView {
            summary: fixtures::portfolio_summary(),
            holdings: fixtures::seed_holdings(),
            watchlist: fixtures::watchlist(),
            news: fixtures::market_news(),
            selected_holding: 0,
            interval: JITTER_INTERVAL,
            timer: None,
            rng,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> PortfolioView {
        self.interval = interval;
        self
    }

    /// Starts the jitter timer. Calling it twice keeps the running timer.
    pub fn start(&mut self) {
        if self.timer.is_none() {
            self.timer = Some(PeriodicTimer::acquire(self.interval));
        }
    }

    /// Stops the jitter timer. Ticks that fired but were not yet polled are
    /// discarded.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.release();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Applies every tick that fired since the last poll. Returns the number
    /// applied.
    pub fn poll_ticks(&mut self) -> usize {
        let fired = match self.timer.as_mut() {
            Some(timer) => timer.drain(),
            None => 0,
        };
        for _ in 0..fired {
            jitter(&mut self.holdings, &mut self.rng);
        }
        if fired > 0 {
            debug!(ticks = fired, "applied price jitter");
        }
        fired
    }

    pub fn holdings_count(&self) -> usize {
        self.holdings.len()
    }

    /// Holding with the highest daily percent change.
    pub fn best_performer(&self) -> Option<&Holding> {
        self.holdings
            .iter()
            .max_by(|a, b| a.change_percent().total_cmp(&b.change_percent()))
    }

    pub fn select_next(&mut self) {
        if self.selected_holding < self.holdings.len().saturating_sub(1) {
            self.selected_holding += 1;
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected_holding > 0 {
            self.selected_holding -= 1;
        }
    }

    pub fn selected(&self) -> Option<&Holding> {
        self.holdings.get(self.selected_holding)
    }

    // Print the holdings as a table
    pub fn print(&self, currency: &str) {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor,
            ContentArrangement, Table,
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(100);

        table.set_header(vec![
            Cell::new("Stock").add_attribute(Attribute::Bold),
            Cell::new("Symbol").add_attribute(Attribute::Bold),
            Cell::new("Price").add_attribute(Attribute::Bold),
            Cell::new("Change").add_attribute(Attribute::Bold),
            Cell::new("Shares").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        for holding in &self.holdings {
            let c = if holding.change() >= 0.0 { TColor::Green } else { TColor::Red };
            table.add_row(vec![
                Cell::new(holding.name()),
                Cell::new(holding.symbol()),
                Cell::new(format_currency(holding.price(), currency))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format!(
                    "{} ({})",
                    format_currency(holding.change(), currency),
                    format_percent(holding.change_percent())
                ))
                .set_alignment(CellAlignment::Right)
                .fg(c),
                Cell::new(format_shares(holding.shares)).set_alignment(CellAlignment::Right),
                Cell::new(format_currency(holding.value(), currency))
                    .set_alignment(CellAlignment::Right),
            ]);
        }

        let summary = self.summary;
        let c = if summary.daily_change >= 0.0 { TColor::Green } else { TColor::Red };
        table.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format!(
                "{} ({})",
                format_currency(summary.daily_change, currency),
                format_percent(summary.daily_change_percent)
            ))
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold)
            .fg(c),
            Cell::new(self.holdings_count().to_string()).set_alignment(CellAlignment::Right),
            Cell::new(format_currency(summary.total_value, currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
        ]);

        println!("{table}");
    }
}

/// One jitter step: each holding independently gets a uniform offset in
/// [-1, 1) on its price and [-0.25, 0.25) on its daily change. Prices are
/// floored at zero.
pub fn jitter<R: Rng>(holdings: &mut [Holding], rng: &mut R) {
    for holding in holdings.iter_mut() {
        let instrument = &mut holding.instrument;
        instrument.price =
            (instrument.price + rng.random_range(-PRICE_JITTER..PRICE_JITTER)).max(0.0);
        instrument.change += rng.random_range(-CHANGE_JITTER..CHANGE_JITTER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;

    fn seeded() -> PortfolioView {
        PortfolioView::with_rng(StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_seeded_from_fixture() {
        let view = seeded();
        assert_eq!(view.summary.total_value, 12500.75);
        assert_eq!(view.summary.daily_change, 245.50);
        assert_eq!(view.holdings_count(), 4);
        let symbols: Vec<_> = view.holdings.iter().map(|h| h.symbol()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "TSLA", "AMZN"]);
        assert_eq!(view.best_performer().map(|h| h.symbol()), Some("TSLA"));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let original = fixtures::seed_holdings();
        let mut holdings = original.clone();
        let mut rng = StdRng::seed_from_u64(42);
        jitter(&mut holdings, &mut rng);

        for (before, after) in original.iter().zip(&holdings) {
            let dp = after.price() - before.price();
            let dc = after.change() - before.change();
            assert!((-1.0..1.0).contains(&dp), "price moved by {dp}");
            assert!((-0.25..0.25).contains(&dc), "change moved by {dc}");
            assert_eq!(after.change_percent(), before.change_percent());
            assert_eq!(after.shares, before.shares);
            assert_eq!(after.id, before.id);
        }
    }

    #[test]
    fn test_jitter_never_goes_negative() {
        let mut holdings = vec![Holding::new(1, Instrument::new("ADA", "Cardano", 0.05, 0.0, 0.0), 1.0)];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            jitter(&mut holdings, &mut rng);
            assert!(holdings[0].price() >= 0.0);
            assert!(holdings[0].price().is_finite());
        }
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut view = seeded();
        view.select_previous();
        assert_eq!(view.selected_holding, 0);
        for _ in 0..10 {
            view.select_next();
        }
        assert_eq!(view.selected().map(|h| h.symbol()), Some("AMZN"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_perturb_holdings_but_not_summary() {
        let mut view = seeded();
        view.start();
        tokio::time::sleep(Duration::from_millis(5_100)).await;

        assert_eq!(view.poll_ticks(), 1);
        assert_ne!(view.holdings, fixtures::seed_holdings());
        // summary is left at its seeded values
        assert_eq!(view.summary, fixtures::portfolio_summary());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_before_first_period() {
        let mut view = seeded();
        view.start();
        tokio::time::sleep(Duration::from_millis(4_000)).await;
        assert_eq!(view.poll_ticks(), 0);
        assert_eq!(view.holdings, fixtures::seed_holdings());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_tick_leaves_no_timer() {
        let mut view = seeded();
        view.start();
        let task = view.timer.as_ref().map(|t| t.abort_handle()).unwrap();
        view.stop();
        assert!(!view.is_running());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(task.is_finished());
        assert_eq!(view.poll_ticks(), 0);
        assert_eq!(view.holdings, fixtures::seed_holdings());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_view_releases_timer() {
        let mut view = seeded();
        view.start();
        let task = view.timer.as_ref().map(|t| t.abort_handle()).unwrap();
        drop(view);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let mut view = seeded().with_interval(Duration::from_secs(1));
        view.start();
        view.start();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(view.poll_ticks(), 3);
    }
}
