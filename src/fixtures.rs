//! Hard-coded market data standing in for a real quote feed.
//!
//! Everything here is read-only. View-models that mutate prices work on
//! their own copies.

use crate::instrument::{AssetTab, Holding, Instrument};
use crate::learning::{Course, Term, Tutorial};
use crate::portfolio::{MarketNews, PortfolioSummary, WatchlistItem};
use crate::stock_detail::{
    FinancialRow, KeyMetric, NewsItem, Sentiment, StockProfile, TimeRange,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static STOCKS: Lazy<Vec<Instrument>> = Lazy::new(|| {
    vec![
        Instrument::new("AAPL", "Apple Inc.", 182.63, 2.34, 1.3),
        Instrument::new("MSFT", "Microsoft Corporation", 415.50, -1.25, -0.3),
        Instrument::new("GOOGL", "Alphabet Inc.", 151.23, 1.45, 0.97),
        Instrument::new("AMZN", "Amazon.com Inc.", 178.22, 3.15, 1.8),
        Instrument::new("TSLA", "Tesla Inc.", 245.18, 8.42, 3.56),
        Instrument::new("META", "Meta Platforms Inc.", 485.75, -2.30, -0.47),
        Instrument::new("NVDA", "NVIDIA Corporation", 950.02, 15.25, 1.63),
        Instrument::new("JPM", "JPMorgan Chase & Co.", 189.45, 0.89, 0.47),
        Instrument::new("JNJ", "Johnson & Johnson", 157.80, -0.75, -0.47),
        Instrument::new("V", "Visa Inc.", 279.33, 2.15, 0.78),
    ]
});

static ETFS: Lazy<Vec<Instrument>> = Lazy::new(|| {
    vec![
        Instrument::new("SPY", "SPDR S&P 500 ETF", 512.34, 3.21, 0.63),
        Instrument::new("QQQ", "Invesco QQQ Trust", 443.56, 2.89, 0.66),
        Instrument::new("VTI", "Vanguard Total Stock Market ETF", 254.78, 1.45, 0.57),
        Instrument::new("VOO", "Vanguard S&P 500 ETF", 467.89, 2.67, 0.57),
    ]
});

static CRYPTO: Lazy<Vec<Instrument>> = Lazy::new(|| {
    vec![
        Instrument::new("BTC", "Bitcoin", 61542.78, 1245.67, 2.07),
        Instrument::new("ETH", "Ethereum", 3421.56, 45.23, 1.34),
        Instrument::new("ADA", "Cardano", 0.63, 0.02, 3.28),
    ]
});

/// The fixed instrument list for one asset tab, in display order.
pub fn universe(tab: AssetTab) -> &'static [Instrument] {
    match tab {
        AssetTab::Stocks => &STOCKS,
        AssetTab::Etfs => &ETFS,
        AssetTab::Crypto => &CRYPTO,
    }
}

/// Looks a symbol up across every universe.
pub fn find_instrument(symbol: &str) -> Option<&'static Instrument> {
    AssetTab::all()
        .iter()
        .flat_map(|&tab| universe(tab).iter())
        .find(|i| i.symbol.eq_ignore_ascii_case(symbol))
}

pub fn portfolio_summary() -> PortfolioSummary {
    PortfolioSummary {
        total_value: 12500.75,
        daily_change: 245.50,
        daily_change_percent: 2.0,
    }
}

pub fn seed_holdings() -> Vec<Holding> {
    vec![
        Holding::new(1, Instrument::new("AAPL", "Apple Inc.", 182.63, 2.34, 1.3), 10.0),
        Holding::new(2, Instrument::new("MSFT", "Microsoft", 415.50, -1.25, -0.3), 5.0),
        Holding::new(3, Instrument::new("TSLA", "Tesla", 245.18, 8.42, 3.56), 8.0),
        Holding::new(4, Instrument::new("AMZN", "Amazon", 178.22, 3.15, 1.8), 12.0),
    ]
}

pub fn watchlist() -> Vec<WatchlistItem> {
    vec![
        WatchlistItem::new(1, "GOOGL", "Alphabet Inc.", 151.23, 1.45),
        WatchlistItem::new(2, "META", "Meta Platforms", 485.75, -2.30),
        WatchlistItem::new(3, "NVDA", "NVIDIA Corp.", 950.02, 15.25),
    ]
}

pub fn market_news() -> Vec<MarketNews> {
    vec![
        MarketNews::new(1, "Tech Stocks Rally on Strong Earnings", "Financial Times", "2 hours ago"),
        MarketNews::new(2, "Fed Holds Interest Rates Steady", "Bloomberg", "5 hours ago"),
        MarketNews::new(3, "Market Volatility Expected This Week", "CNBC", "1 day ago"),
    ]
}

/// Company profile for any listed instrument. The quote fields come from the
/// instrument row; session figures and company facts are the shared mock
/// record.
pub fn stock_profile(symbol: &str) -> Option<StockProfile> {
    let instrument = find_instrument(symbol)?;
    Some(StockProfile {
        symbol: instrument.symbol.clone(),
        name: instrument.name.clone(),
        current_price: instrument.price,
        change: instrument.change,
        change_percent: instrument.change_percent,
        ..base_profile()
    })
}

fn base_profile() -> StockProfile {
    StockProfile {
        symbol: "AAPL".to_string(),
        name: "Apple Inc.".to_string(),
        current_price: 182.63,
        change: 2.34,
        change_percent: 1.3,
        open: 180.50,
        high: 183.25,
        low: 179.80,
        volume: 28_563_920,
        market_cap: 2_860_000_000_000.0,
        pe_ratio: 29.5,
        dividend_yield: 0.55,
        fifty_two_week_high: 199.62,
        fifty_two_week_low: 124.17,
        about: "Apple Inc. designs, manufactures, and markets smartphones, personal computers, \
                tablets, wearables, and accessories worldwide. The company offers iPhone, Mac, \
                iPad, AirPods, Apple TV, Apple Watch, Beats products, and HomePod. It also \
                provides AppleCare support services; and digital content stores and streaming \
                services."
            .to_string(),
        sector: "Technology".to_string(),
        industry: "Consumer Electronics".to_string(),
        employees: 164_000,
        headquarters: "Cupertino, California".to_string(),
        founded: 1976,
    }
}

static PRICE_HISTORY: Lazy<HashMap<TimeRange, Vec<f64>>> = Lazy::new(|| {
    HashMap::from([
        (
            TimeRange::OneDay,
            vec![
                181.2, 181.5, 181.8, 182.1, 182.3, 182.6, 182.4, 182.7, 182.9, 183.1, 182.8,
                182.6, 182.4, 182.2, 182.5, 182.7, 182.9, 183.0, 182.8, 182.6, 182.4, 182.3,
                182.5, 182.6, 182.6,
            ],
        ),
        (
            TimeRange::OneWeek,
            vec![178.5, 179.2, 180.1, 181.3, 182.0, 181.8, 182.6],
        ),
        (
            TimeRange::OneMonth,
            vec![
                175.0, 176.2, 177.8, 179.1, 180.5, 181.2, 180.8, 181.5, 182.1, 181.9, 182.4,
                183.0, 182.7, 182.3, 182.8, 183.2, 182.9, 182.6, 182.3, 182.7, 182.9,
            ],
        ),
        (
            TimeRange::OneYear,
            vec![
                145.0, 148.2, 152.5, 156.8, 162.3, 165.7, 168.9, 172.4, 175.6, 178.2, 180.5,
                182.6,
            ],
        ),
    ])
});

/// Price series for a range, `None` when the fixture has no data for it.
pub fn price_history(range: TimeRange) -> Option<&'static [f64]> {
    PRICE_HISTORY.get(&range).map(Vec::as_slice)
}

pub fn stock_news() -> Vec<NewsItem> {
    vec![
        NewsItem::new(1, "Apple Announces New iPhone 15 with Revolutionary Features", "TechCrunch", "3 hours ago", Sentiment::Positive),
        NewsItem::new(2, "Apple Reports Strong Quarterly Earnings, Beats Estimates", "Bloomberg", "1 day ago", Sentiment::Positive),
        NewsItem::new(3, "Analysts Raise Price Target for Apple Stock", "CNBC", "2 days ago", Sentiment::Positive),
        NewsItem::new(4, "Apple Faces Regulatory Challenges in European Market", "Financial Times", "3 days ago", Sentiment::Negative),
    ]
}

pub fn key_metrics() -> Vec<KeyMetric> {
    [
        ("Market Cap", "$2.86T"),
        ("P/E Ratio", "29.5"),
        ("EPS", "$6.13"),
        ("Dividend Yield", "0.55%"),
        ("Beta", "1.2"),
        ("52W High", "$199.62"),
        ("52W Low", "$124.17"),
        ("Volume", "28.56M"),
    ]
    .into_iter()
    .map(|(label, value)| KeyMetric { label, value })
    .collect()
}

pub fn income_statement() -> Vec<FinancialRow> {
    vec![
        FinancialRow::new("Revenue", "$383.3B", "$365.8B", Some("+4.8%")),
        FinancialRow::new("Net Income", "$97.0B", "$99.8B", Some("-2.8%")),
        FinancialRow::new("EPS", "$6.13", "$6.11", Some("+0.3%")),
        FinancialRow::new("Gross Margin", "43.3%", "43.8%", Some("-0.5%")),
    ]
}

pub fn balance_sheet() -> Vec<FinancialRow> {
    vec![
        FinancialRow::new("Total Assets", "$352.8B", "$351.0B", None),
        FinancialRow::new("Total Liabilities", "$279.4B", "$287.9B", None),
        FinancialRow::new("Shareholder Equity", "$73.4B", "$63.1B", None),
        FinancialRow::new("Cash & Equivalents", "$62.5B", "$61.6B", None),
    ]
}

pub fn financial_terms() -> &'static [Term] {
    &[
        Term {
            id: 1,
            term: "Portfolio",
            definition: "A collection of financial investments like stocks, bonds, commodities, cash, and cash equivalents, including closed-end funds and exchange traded funds (ETFs).",
            example: "Your investment dashboard shows your personal portfolio of stocks.",
        },
        Term {
            id: 2,
            term: "Stock",
            definition: "A type of security that signifies proportionate ownership in the issuing corporation.",
            example: "When you buy Apple (AAPL) stock, you own a small piece of the company.",
        },
        Term {
            id: 3,
            term: "Dividend",
            definition: "A distribution of a portion of a company's earnings to its shareholders, decided by the board of directors.",
            example: "If you own 100 shares of a company that pays a $1 dividend, you'll receive $100.",
        },
        Term {
            id: 4,
            term: "Bull Market",
            definition: "A financial market in which prices are rising or are expected to rise.",
            example: "When stock prices keep going up for several months, it's called a bull market.",
        },
        Term {
            id: 5,
            term: "Bear Market",
            definition: "A market condition in which prices are falling or are expected to fall.",
            example: "When the market drops 20% or more from recent highs, it's considered a bear market.",
        },
        Term {
            id: 6,
            term: "ETF",
            definition: "Exchange-Traded Fund - a type of investment fund that holds multiple assets and trades on stock exchanges.",
            example: "SPY is an ETF that tracks the S&P 500 index.",
        },
        Term {
            id: 7,
            term: "Volatility",
            definition: "The degree of variation in trading prices over time, usually measured by standard deviation.",
            example: "High volatility means prices change rapidly in a short period.",
        },
        Term {
            id: 8,
            term: "Diversification",
            definition: "The practice of spreading investments among different financial instruments to reduce risk.",
            example: "Instead of buying only tech stocks, you invest in healthcare, energy, and consumer goods too.",
        },
    ]
}

pub fn dashboard_tutorials() -> &'static [Tutorial] {
    &[
        Tutorial {
            id: 1,
            title: "Understanding Your Portfolio",
            description: "Learn how to read and interpret your portfolio summary",
            steps: &[
                "Portfolio Value shows your total investment worth",
                "Daily Change indicates how much your portfolio gained or lost today",
                "The percentage change helps compare performance regardless of portfolio size",
            ],
        },
        Tutorial {
            id: 2,
            title: "Reading Stock Tables",
            description: "How to understand the information in your holdings table",
            steps: &[
                "Stock Symbol: The company's ticker symbol (e.g., AAPL for Apple)",
                "Price: Current price per share",
                "Change: How much the price moved since yesterday",
                "Shares: Number of shares you own",
                "Value: Total value of your position (Price × Shares)",
            ],
        },
        Tutorial {
            id: 3,
            title: "Using the Watchlist",
            description: "How to effectively use the watchlist feature",
            steps: &[
                "Add stocks you're interested in but don't own yet",
                "Monitor price movements without buying",
                "Use it to research before making investment decisions",
            ],
        },
        Tutorial {
            id: 4,
            title: "Interpreting Market News",
            description: "How to use news to inform your investment decisions",
            steps: &[
                "Read news from reliable financial sources",
                "Understand how news affects stock prices",
                "Don't make impulsive decisions based on single news items",
            ],
        },
    ]
}

pub fn quick_tips() -> &'static [&'static str] {
    &[
        "Check your portfolio regularly but avoid making emotional decisions based on short-term movements",
        "Use the watchlist to research stocks before investing your money",
        "Set up price alerts for stocks you're interested in",
        "Focus on long-term trends rather than daily fluctuations",
    ]
}

pub fn courses() -> &'static [Course] {
    &[
        Course {
            id: 1,
            title: "Investing Fundamentals",
            level: "Beginner",
            duration: "2 hours",
            lessons: 8,
            description: "Learn the basics of stock market investing and build a solid foundation.",
            topics: &[
                "What is the stock market?",
                "How to buy and sell stocks",
                "Understanding risk and return",
                "Building your first portfolio",
            ],
        },
        Course {
            id: 2,
            title: "Technical Analysis",
            level: "Intermediate",
            duration: "4 hours",
            lessons: 12,
            description: "Learn to read charts and identify trading opportunities.",
            topics: &[
                "Chart patterns and trends",
                "Support and resistance levels",
                "Technical indicators",
                "Trading strategies",
            ],
        },
        Course {
            id: 3,
            title: "Portfolio Management",
            level: "Intermediate",
            duration: "3 hours",
            lessons: 10,
            description: "Learn how to build and manage a diversified investment portfolio.",
            topics: &[
                "Asset allocation strategies",
                "Risk management techniques",
                "Rebalancing your portfolio",
                "Performance measurement",
            ],
        },
        Course {
            id: 4,
            title: "Advanced Trading Strategies",
            level: "Advanced",
            duration: "6 hours",
            lessons: 15,
            description: "Master complex trading strategies and risk management.",
            topics: &[
                "Options trading basics",
                "Hedging strategies",
                "Algorithmic trading concepts",
                "Advanced risk management",
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_sizes() {
        assert_eq!(universe(AssetTab::Stocks).len(), 10);
        assert_eq!(universe(AssetTab::Etfs).len(), 4);
        assert_eq!(universe(AssetTab::Crypto).len(), 3);
    }

    #[test]
    fn test_symbols_unique_within_tab() {
        for &tab in AssetTab::all() {
            let mut symbols: Vec<_> = universe(tab).iter().map(|i| &i.symbol).collect();
            symbols.sort();
            symbols.dedup();
            assert_eq!(symbols.len(), universe(tab).len(), "duplicate symbol in {tab}");
        }
    }

    #[test]
    fn test_find_instrument_across_tabs() {
        assert_eq!(find_instrument("voo").map(|i| i.price), Some(467.89));
        assert_eq!(find_instrument("ETH").map(|i| i.name.as_str()), Some("Ethereum"));
        assert!(find_instrument("XYZ").is_none());
    }

    #[test]
    fn test_price_history_gaps() {
        assert_eq!(price_history(TimeRange::OneWeek).map(|s| s.len()), Some(7));
        assert!(price_history(TimeRange::ThreeMonths).is_none());
        assert!(price_history(TimeRange::FiveYears).is_none());
    }

    #[test]
    fn test_profile_for_listed_symbols() {
        let aapl = stock_profile("aapl").unwrap();
        assert_eq!(aapl.name, "Apple Inc.");
        assert_eq!(aapl.current_price, 182.63);
        assert_eq!(aapl.open, 180.50);

        let btc = stock_profile("BTC").unwrap();
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.name, "Bitcoin");
        assert_eq!(btc.current_price, 61542.78);
        assert_eq!(btc.change_percent, 2.07);

        assert!(stock_profile("ZZZZ").is_none());
    }
}
