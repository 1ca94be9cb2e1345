use crate::fixtures;
use crate::instrument::{AssetTab, Instrument};

/// Queries shorter than this produce no results.
pub const MIN_QUERY_LEN: usize = 2;

/// Rows of `universe` whose symbol or name contains `query`, ignoring case,
/// in their original order.
pub fn filter_instruments(universe: &[Instrument], query: &str) -> Vec<Instrument> {
    if query.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    universe
        .iter()
        .filter(|instrument| instrument.matches(&needle))
        .cloned()
        .collect()
}

/// Search box, result list and the currently picked instrument of the
/// add-investment screen.
#[derive(Debug, Clone, Default)]
pub struct InstrumentSelector {
    tab: AssetTab,
    query: String,
    results: Vec<Instrument>,
    selected: Option<Instrument>,
}

impl InstrumentSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> AssetTab {
        self.tab
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Instrument] {
        &self.results
    }

    pub fn selected(&self) -> Option<&Instrument> {
        self.selected.as_ref()
    }

    /// Full instrument list of the active tab.
    pub fn current_assets(&self) -> &'static [Instrument] {
        fixtures::universe(self.tab)
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refresh();
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.refresh();
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.refresh();
    }

    /// Switches universes. The selection survives; the query is re-run
    /// against the new tab.
    pub fn set_tab(&mut self, tab: AssetTab) {
        self.tab = tab;
        self.refresh();
    }

    /// Picks an instrument and clears the search.
    pub fn select(&mut self, instrument: Instrument) {
        self.selected = Some(instrument);
        self.query.clear();
        self.results.clear();
    }

    fn refresh(&mut self) {
        self.results = filter_instruments(self.current_assets(), &self.query);
    }
}
