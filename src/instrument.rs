use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tradable asset as listed in one of the asset universes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl Instrument {
    pub fn new(symbol: &str, name: &str, price: f64, change: f64, change_percent: f64) -> Self {
        Instrument {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change,
            change_percent,
        }
    }

    /// True when the symbol or the name contains `needle`.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.symbol.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
    }

    pub fn is_gaining(&self) -> bool {
        self.change >= 0.0
    }
}

/// A position in the portfolio: an instrument plus the number of shares held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: u32,
    #[serde(flatten)]
    pub instrument: Instrument,
    pub shares: f64,
}

impl Holding {
    pub fn new(id: u32, instrument: Instrument, shares: f64) -> Self {
        Holding {
            id,
            instrument,
            shares,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }

    pub fn name(&self) -> &str {
        &self.instrument.name
    }

    pub fn price(&self) -> f64 {
        self.instrument.price
    }

    pub fn change(&self) -> f64 {
        self.instrument.change
    }

    pub fn change_percent(&self) -> f64 {
        self.instrument.change_percent
    }

    /// Market value of the position at the current (possibly jittered) price.
    pub fn value(&self) -> f64 {
        self.instrument.price * self.shares
    }
}

/// The asset universes offered on the add-investment screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssetTab {
    #[default]
    Stocks,
    Etfs,
    Crypto,
}

impl AssetTab {
    pub fn all() -> &'static [AssetTab] {
        &[AssetTab::Stocks, AssetTab::Etfs, AssetTab::Crypto]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetTab::Stocks => "stocks",
            AssetTab::Etfs => "etfs",
            AssetTab::Crypto => "crypto",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AssetTab::Stocks => "Stocks",
            AssetTab::Etfs => "ETFs",
            AssetTab::Crypto => "Crypto",
        }
    }

    pub fn next(self) -> AssetTab {
        let tabs = AssetTab::all();
        let index = tabs.iter().position(|&t| t == self).unwrap_or(0);
        tabs[(index + 1) % tabs.len()]
    }
}

impl FromStr for AssetTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stocks" | "stock" => Ok(AssetTab::Stocks),
            "etfs" | "etf" => Ok(AssetTab::Etfs),
            "crypto" => Ok(AssetTab::Crypto),
            _ => Err(format!("Unknown asset tab: '{s}'")),
        }
    }
}

impl fmt::Display for AssetTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_value_uses_current_price() {
        let mut holding = Holding::new(1, Instrument::new("AAPL", "Apple Inc.", 100.0, 1.0, 1.0), 3.0);
        assert_eq!(holding.value(), 300.0);
        holding.instrument.price = 110.0;
        assert_eq!(holding.value(), 330.0);
    }

    #[test]
    fn test_asset_tab_from_str() {
        assert_eq!("ETFs".parse::<AssetTab>(), Ok(AssetTab::Etfs));
        assert_eq!(" crypto ".parse::<AssetTab>(), Ok(AssetTab::Crypto));
        assert!("bonds".parse::<AssetTab>().is_err());
    }

    #[test]
    fn test_asset_tab_cycles() {
        assert_eq!(AssetTab::Stocks.next(), AssetTab::Etfs);
        assert_eq!(AssetTab::Crypto.next(), AssetTab::Stocks);
    }

    #[test]
    fn test_instrument_serializes_camel_case() {
        let json = serde_json::to_value(Instrument::new("BTC", "Bitcoin", 1.0, 0.5, 2.0)).unwrap();
        assert_eq!(json["changePercent"], 2.0);
    }
}
