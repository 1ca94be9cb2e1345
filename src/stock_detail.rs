use crate::fixtures;
use crate::timer::DeferredLoad;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Simulated latency of the quote lookup.
pub const LOAD_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct StockProfile {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub market_cap: f64,
    pub pe_ratio: f64,
    pub dividend_yield: f64,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub about: String,
    pub sector: String,
    pub industry: String,
    pub employees: u32,
    pub headquarters: String,
    pub founded: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub id: u32,
    pub title: String,
    pub source: String,
    pub time: String,
    pub sentiment: Sentiment,
}

impl NewsItem {
    pub fn new(id: u32, title: &str, source: &str, time: &str, sentiment: Sentiment) -> Self {
        NewsItem {
            id,
            title: title.to_string(),
            source: source.to_string(),
            time: time.to_string(),
            sentiment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyMetric {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialRow {
    pub metric: &'static str,
    pub current: &'static str,
    pub previous: &'static str,
    pub change: Option<&'static str>,
}

impl FinancialRow {
    pub fn new(
        metric: &'static str,
        current: &'static str,
        previous: &'static str,
        change: Option<&'static str>,
    ) -> Self {
        FinancialRow {
            metric,
            current,
            previous,
            change,
        }
    }
}

/// Everything the detail screen shows once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct StockDetail {
    pub profile: StockProfile,
    pub news: Vec<NewsItem>,
    pub key_metrics: Vec<KeyMetric>,
    pub income_statement: Vec<FinancialRow>,
    pub balance_sheet: Vec<FinancialRow>,
}

impl StockDetail {
    pub fn lookup(symbol: &str) -> Option<StockDetail> {
        let profile = fixtures::stock_profile(symbol)?;
        Some(StockDetail {
            profile,
            news: fixtures::stock_news(),
            key_metrics: fixtures::key_metrics(),
            income_statement: fixtures::income_statement(),
            balance_sheet: fixtures::balance_sheet(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    #[default]
    OneDay,
    OneWeek,
    OneMonth,
    ThreeMonths,
    OneYear,
    FiveYears,
}

impl TimeRange {
    pub fn all() -> &'static [TimeRange] {
        &[
            TimeRange::OneDay,
            TimeRange::OneWeek,
            TimeRange::OneMonth,
            TimeRange::ThreeMonths,
            TimeRange::OneYear,
            TimeRange::FiveYears,
        ]
    }

    pub fn tag(self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
            TimeRange::FiveYears => "5Y",
        }
    }

    fn step(self, offset: isize) -> TimeRange {
        let ranges = TimeRange::all();
        let index = ranges.iter().position(|&r| r == self).unwrap_or(0) as isize;
        let len = ranges.len() as isize;
        ranges[((index + offset).rem_euclid(len)) as usize]
    }

    pub fn next(self) -> TimeRange {
        self.step(1)
    }

    pub fn previous(self) -> TimeRange {
        self.step(-1)
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::all()
            .iter()
            .copied()
            .find(|r| r.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown time range: '{s}'"))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Overview,
    Financials,
    News,
    About,
}

impl DetailTab {
    pub fn all() -> &'static [DetailTab] {
        &[
            DetailTab::Overview,
            DetailTab::Financials,
            DetailTab::News,
            DetailTab::About,
        ]
    }

    pub fn title(self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Financials => "Financials",
            DetailTab::News => "News & Analysis",
            DetailTab::About => "About",
        }
    }

    pub fn next(self) -> DetailTab {
        let tabs = DetailTab::all();
        let index = tabs.iter().position(|&t| t == self).unwrap_or(0);
        tabs[(index + 1) % tabs.len()]
    }
}

pub enum LoadState {
    Idle,
    Loading(DeferredLoad<Option<StockDetail>>),
    Loaded(Box<StockDetail>),
    Missing,
}

/// Backing state of the stock detail screen.
///
/// The quote arrives after [`LOAD_DELAY`]. The pending load belongs to the
/// view: replacing or dropping it cancels the load, so a late completion
/// never lands on a different or discarded view.
pub struct StockDetailView {
    pub symbol: String,
    pub tab: DetailTab,
    pub time_range: TimeRange,
    pub in_watchlist: bool,
    state: LoadState,
    delay: Duration,
}

impl StockDetailView {
    pub fn new() -> Self {
        StockDetailView {
            symbol: String::new(),
            tab: DetailTab::Overview,
            time_range: TimeRange::OneDay,
            in_watchlist: false,
            state: LoadState::Idle,
            delay: LOAD_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Starts loading `symbol`. Any load still in flight is dropped.
    pub fn activate(&mut self, symbol: &str) {
        self.symbol = symbol.to_uppercase();
        let detail = StockDetail::lookup(&self.symbol);
        debug!(symbol = %self.symbol, found = detail.is_some(), "loading stock detail");
        self.state = LoadState::Loading(DeferredLoad::schedule(self.delay, detail));
    }

    /// Cancels a pending load and forgets any loaded data.
    pub fn deactivate(&mut self) {
        self.state = LoadState::Idle;
    }

    /// Applies the pending load if it completed. Returns true when the state
    /// changed.
    pub fn poll_load(&mut self) -> bool {
        let LoadState::Loading(load) = &mut self.state else {
            return false;
        };
        match load.try_take() {
            Some(Some(detail)) => {
                self.state = LoadState::Loaded(Box::new(detail));
                true
            }
            Some(None) => {
                self.state = LoadState::Missing;
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    pub fn detail(&self) -> Option<&StockDetail> {
        match &self.state {
            LoadState::Loaded(detail) => Some(detail.as_ref()),
            _ => None,
        }
    }

    /// Series for the chosen range, or `None` while loading or when the
    /// range has no data.
    pub fn price_series(&self) -> Option<&'static [f64]> {
        self.detail()?;
        fixtures::price_history(self.time_range)
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.time_range = range;
    }

    pub fn set_tab(&mut self, tab: DetailTab) {
        self.tab = tab;
    }

    pub fn toggle_watchlist(&mut self) -> bool {
        self.in_watchlist = !self.in_watchlist;
        self.in_watchlist
    }

    /// Buying from this screen is not wired up; it only produces a notice.
    pub fn buy_notice(&self) -> String {
        format!("Buy {} interface would open here", self.symbol)
    }
}

impl Default for StockDetailView {
    fn default() -> Self {
        Self::new()
    }
}
