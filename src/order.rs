use crate::error::{OrderError, ValidationError};
use crate::instrument::Instrument;
use crate::store::{KeyValueStore, OrderBook};
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Buy,
    Sell,
}

impl TransactionType {
    pub fn toggled(self) -> TransactionType {
        match self {
            TransactionType::Buy => TransactionType::Sell,
            TransactionType::Sell => TransactionType::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            _ => Err(format!("Unknown transaction type: '{s}'")),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded buy or sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Creation time in milliseconds since the Unix epoch.
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub price: f64,
    pub total_amount: f64,
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
}

/// Source of "now" for order ids and the default order date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `shares × price` rounded to cents, `None` if `shares` is not a finite
/// number.
pub fn order_total(shares: &str, price: f64) -> Option<f64> {
    let shares = shares.trim().parse::<f64>().ok()?;
    let total = round_cents(shares * price);
    total.is_finite().then_some(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    TransactionType,
    Shares,
    Price,
    Date,
}

impl FormField {
    pub fn all() -> &'static [FormField] {
        &[
            FormField::TransactionType,
            FormField::Shares,
            FormField::Price,
            FormField::Date,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::TransactionType => "Transaction Type",
            FormField::Shares => "Number of Shares",
            FormField::Price => "Price per Share",
            FormField::Date => "Date",
        }
    }

    pub fn next(self) -> FormField {
        let fields = FormField::all();
        let index = fields.iter().position(|&f| f == self).unwrap_or(0);
        fields[(index + 1) % fields.len()]
    }
}

/// Input fields of the order entry form, kept as the text the user typed.
///
/// The total is derived from the shares and the *selected instrument's*
/// price, not from the editable price field.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    pub transaction_type: TransactionType,
    shares: String,
    price: String,
    total_amount: String,
    date: String,
}

impl OrderForm {
    pub fn new<C: Clock + ?Sized>(clock: &C) -> Self {
        OrderForm {
            transaction_type: TransactionType::Buy,
            shares: String::new(),
            price: String::new(),
            total_amount: String::new(),
            date: clock.today().format(DATE_FORMAT).to_string(),
        }
    }

    pub fn shares(&self) -> &str {
        &self.shares
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn total_amount(&self) -> &str {
        &self.total_amount
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::TransactionType => self.transaction_type.as_str(),
            FormField::Shares => self.shares(),
            FormField::Price => self.price(),
            FormField::Date => self.date(),
        }
    }

    pub fn set_shares(&mut self, value: &str, selected: Option<&Instrument>) {
        self.shares = value.to_string();
        if let Some(instrument) = selected {
            self.recompute_total(instrument);
        }
    }

    pub fn set_price(&mut self, value: &str) {
        self.price = value.to_string();
    }

    pub fn set_date(&mut self, value: &str) {
        self.date = value.to_string();
    }

    /// Called when the picked instrument changes: the price field is reset
    /// to the instrument's price and the total follows if shares are set.
    pub fn instrument_changed(&mut self, instrument: &Instrument) {
        self.price = format!("{:.2}", instrument.price);
        if !self.shares.is_empty() {
            self.recompute_total(instrument);
        }
    }

    pub fn push_char(&mut self, field: FormField, c: char, selected: Option<&Instrument>) {
        let mut value = self.value(field).to_string();
        value.push(c);
        self.set_field(field, &value, selected);
    }

    pub fn pop_char(&mut self, field: FormField, selected: Option<&Instrument>) {
        let mut value = self.value(field).to_string();
        value.pop();
        self.set_field(field, &value, selected);
    }

    fn set_field(&mut self, field: FormField, value: &str, selected: Option<&Instrument>) {
        match field {
            FormField::TransactionType => {}
            FormField::Shares => self.set_shares(value, selected),
            FormField::Price => self.set_price(value),
            FormField::Date => self.set_date(value),
        }
    }

    fn recompute_total(&mut self, instrument: &Instrument) {
        self.total_amount = order_total(&self.shares, instrument.price)
            .map(|total| format!("{total:.2}"))
            .unwrap_or_default();
    }

    /// Validates the form and builds the order it describes.
    pub fn build_order<C: Clock + ?Sized>(
        &self,
        selected: Option<&Instrument>,
        clock: &C,
    ) -> Result<Order, ValidationError> {
        let instrument = selected.ok_or(ValidationError::NoInstrumentSelected)?;

        let shares_str = self.shares.trim();
        if shares_str.is_empty() {
            return Err(ValidationError::QuantityRequired);
        }
        let shares = shares_str
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite())
            .ok_or_else(|| ValidationError::InvalidQuantity(shares_str.to_string()))?;
        if shares <= 0.0 {
            return Err(ValidationError::NonPositiveQuantity(shares));
        }

        let price_str = self.price.trim();
        let price = price_str
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| ValidationError::InvalidPrice(price_str.to_string()))?;
        if price < 0.0 {
            return Err(ValidationError::NegativePrice(price));
        }

        let date_str = self.date.trim();
        if date_str.is_empty() {
            return Err(ValidationError::DateRequired);
        }
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date_str.to_string()))?;

        Ok(Order {
            id: clock.now_millis(),
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            shares,
            price,
            total_amount: round_cents(shares * instrument.price),
            date,
            transaction_type: self.transaction_type,
        })
    }

    /// Validates, records the order in `book` and returns it. Nothing is
    /// written when validation fails.
    pub fn submit<S: KeyValueStore, C: Clock + ?Sized>(
        &self,
        selected: Option<&Instrument>,
        book: &OrderBook<S>,
        clock: &C,
    ) -> Result<Order, OrderError> {
        let order = self.build_order(selected, clock)?;
        book.append(&order)?;
        info!(
            symbol = %order.symbol,
            shares = order.shares,
            total = order.total_amount,
            kind = %order.transaction_type,
            "investment added"
        );
        Ok(order)
    }
}

#[cfg(test)]
pub struct FixedClock {
    pub today: NaiveDate,
    pub millis: i64,
}

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now_millis(&self) -> i64 {
        self.millis
    }
}

#[cfg(test)]
pub fn fixed_clock() -> FixedClock {
    FixedClock {
        today: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        millis: 1_709_251_200_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::instrument::AssetTab;
    use crate::store::MemoryStore;

    fn aapl() -> Instrument {
        fixtures::universe(AssetTab::Stocks)[0].clone()
    }

    #[test]
    fn test_defaults() {
        let form = OrderForm::new(&fixed_clock());
        assert_eq!(form.transaction_type, TransactionType::Buy);
        assert_eq!(form.date(), "2024-03-01");
        assert_eq!(form.shares(), "");
        assert_eq!(form.total_amount(), "");
    }

    #[test]
    fn test_total_follows_shares() {
        let apple = aapl();
        let mut form = OrderForm::new(&fixed_clock());
        form.instrument_changed(&apple);
        assert_eq!(form.price(), "182.63");
        assert_eq!(form.total_amount(), "");

        form.set_shares("10", Some(&apple));
        assert_eq!(form.total_amount(), "1826.30");
        form.set_shares("5", Some(&apple));
        assert_eq!(form.total_amount(), "913.15");
    }

    #[test]
    fn test_total_ignores_edited_price() {
        let apple = aapl();
        let mut form = OrderForm::new(&fixed_clock());
        form.instrument_changed(&apple);
        form.set_price("100");
        form.set_shares("2", Some(&apple));
        assert_eq!(form.total_amount(), "365.26");
        assert_eq!(form.price(), "100");
    }

    #[test]
    fn test_shares_without_selection_leave_total_alone() {
        let mut form = OrderForm::new(&fixed_clock());
        form.set_shares("3", None);
        assert_eq!(form.shares(), "3");
        assert_eq!(form.total_amount(), "");
    }

    #[test]
    fn test_instrument_change_resets_price_and_total() {
        let apple = aapl();
        let btc = fixtures::find_instrument("BTC").unwrap().clone();
        let mut form = OrderForm::new(&fixed_clock());
        form.instrument_changed(&apple);
        form.set_shares("2", Some(&apple));
        form.set_price("1");

        form.instrument_changed(&btc);
        assert_eq!(form.price(), "61542.78");
        assert_eq!(form.total_amount(), "123085.56");
    }

    #[test]
    fn test_non_numeric_shares_blank_the_total() {
        let apple = aapl();
        let mut form = OrderForm::new(&fixed_clock());
        form.instrument_changed(&apple);
        form.set_shares("10", Some(&apple));
        form.set_shares("ten", Some(&apple));
        assert_eq!(form.total_amount(), "");

        let err = form.build_order(Some(&apple), &fixed_clock()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidQuantity("ten".to_string()));
    }

    #[test]
    fn test_validation_errors() {
        let apple = aapl();
        let clock = fixed_clock();
        let mut form = OrderForm::new(&clock);
        form.instrument_changed(&apple);

        assert_eq!(
            form.build_order(Some(&apple), &clock),
            Err(ValidationError::QuantityRequired)
        );
        form.set_shares("0", Some(&apple));
        assert_eq!(
            form.build_order(Some(&apple), &clock),
            Err(ValidationError::NonPositiveQuantity(0.0))
        );
        form.set_shares("1", Some(&apple));
        form.set_price("abc");
        assert_eq!(
            form.build_order(Some(&apple), &clock),
            Err(ValidationError::InvalidPrice("abc".to_string()))
        );
        form.set_price("-2");
        assert_eq!(
            form.build_order(Some(&apple), &clock),
            Err(ValidationError::NegativePrice(-2.0))
        );
        form.set_price("182.63");
        form.set_date("");
        assert_eq!(
            form.build_order(Some(&apple), &clock),
            Err(ValidationError::DateRequired)
        );
        form.set_date("15/01/2024");
        assert_eq!(
            form.build_order(Some(&apple), &clock),
            Err(ValidationError::InvalidDate("15/01/2024".to_string()))
        );
    }

    #[test]
    fn test_submit_without_selection_has_no_side_effect() {
        let book = OrderBook::new(MemoryStore::new());
        let mut form = OrderForm::new(&fixed_clock());
        form.set_shares("5", None);

        let err = form.submit(None, &book, &fixed_clock()).unwrap_err();
        assert!(matches!(
            err,
            OrderError::Validation(ValidationError::NoInstrumentSelected)
        ));
        assert!(book.load().is_empty());
    }

    #[test]
    fn test_submit_sell_scenario() {
        let apple = aapl();
        let clock = fixed_clock();
        let book = OrderBook::new(MemoryStore::new());
        let earlier = Order {
            id: 1,
            symbol: "MSFT".to_string(),
            name: "Microsoft Corporation".to_string(),
            shares: 1.0,
            price: 415.5,
            total_amount: 415.5,
            date: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
            transaction_type: TransactionType::Buy,
        };
        book.append(&earlier).unwrap();

        let mut form = OrderForm::new(&clock);
        form.instrument_changed(&apple);
        form.set_shares("10", Some(&apple));
        assert_eq!(form.total_amount(), "1826.30");
        form.set_shares("5", Some(&apple));
        assert_eq!(form.total_amount(), "913.15");
        form.transaction_type = TransactionType::Sell;
        form.set_date("2024-01-15");

        let order = form.submit(Some(&apple), &book, &clock).unwrap();
        assert_eq!(order.id, clock.millis);
        assert_eq!(order.symbol, "AAPL");
        assert_eq!(order.name, "Apple Inc.");
        assert_eq!(order.shares, 5.0);
        assert_eq!(order.price, 182.63);
        assert_eq!(order.total_amount, 913.15);
        assert_eq!(order.transaction_type, TransactionType::Sell);
        assert_eq!(order.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        assert_eq!(book.load(), vec![earlier, order]);
    }

    #[test]
    fn test_total_is_rounded_product_for_many_inputs() {
        let clock = fixed_clock();
        for &tab in AssetTab::all() {
            for instrument in fixtures::universe(tab) {
                for shares in ["1", "0.5", "3.333", "12", "0.001", "250"] {
                    let mut form = OrderForm::new(&clock);
                    form.instrument_changed(instrument);
                    form.set_shares(shares, Some(instrument));
                    let order = form.build_order(Some(instrument), &clock).unwrap();
                    let expected = round_cents(shares.parse::<f64>().unwrap() * instrument.price);
                    assert_eq!(order.total_amount, expected);
                    assert_eq!(form.total_amount(), format!("{expected:.2}"));
                }
            }
        }
    }

    #[test]
    fn test_typing_into_fields() {
        let apple = aapl();
        let mut form = OrderForm::new(&fixed_clock());
        form.instrument_changed(&apple);
        form.push_char(FormField::Shares, '1', Some(&apple));
        form.push_char(FormField::Shares, '2', Some(&apple));
        assert_eq!(form.total_amount(), "2191.56");
        form.pop_char(FormField::Shares, Some(&apple));
        assert_eq!(form.total_amount(), "182.63");
        form.pop_char(FormField::Date, None);
        assert_eq!(form.date(), "2024-03-0");
    }

    #[test]
    fn test_transaction_type_parsing() {
        assert_eq!("SELL".parse::<TransactionType>(), Ok(TransactionType::Sell));
        assert!("hold".parse::<TransactionType>().is_err());
        assert_eq!(TransactionType::Buy.toggled(), TransactionType::Sell);
    }
}
