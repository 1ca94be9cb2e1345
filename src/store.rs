//! Local persistence for recorded orders.
//!
//! The order list lives as one JSON array under a fixed key of a small
//! key-value store. The store is passed in, never reached through a global.

use crate::error::StoreError;
use crate::order::Order;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Key under which the order list is stored.
pub const ORDERS_KEY: &str = "portfolioInvestments";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// On-disk store backed by sled. Every write is flushed before returning.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(SledStore { db })
    }

    /// Scratch database that is deleted on drop.
    #[cfg(test)]
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(SledStore { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        // block until all operations are stable on disk
        self.db.flush()?;
        Ok(())
    }
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Append-only list of orders on top of a [`KeyValueStore`].
pub struct OrderBook<S> {
    store: S,
}

impl<S: KeyValueStore> OrderBook<S> {
    pub fn new(store: S) -> Self {
        OrderBook { store }
    }

    /// All recorded orders, oldest first. A missing or unreadable entry
    /// reads as an empty list.
    pub fn load(&self) -> Vec<Order> {
        let raw = match self.store.get(ORDERS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read orders, starting empty: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(orders) => orders,
            Err(e) => {
                warn!("Stored orders are not valid JSON, starting empty: {e}");
                Vec::new()
            }
        }
    }

    /// Reads the stored list, failing on a read error or a malformed entry.
    fn read(&self) -> Result<Vec<Order>, StoreError> {
        match self.store.get(ORDERS_KEY)? {
            Some(raw) => Ok(serde_json::from_slice(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Appends `order` behind the existing entries and writes the list back.
    /// Nothing is written if the existing list cannot be read.
    pub fn append(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.read()?;
        orders.push(order.clone());
        let json = serde_json::to_vec(&orders)?;
        self.store.set(ORDERS_KEY, &json)?;
        debug!(count = orders.len(), symbol = %order.symbol, "order appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::TransactionType;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn order(id: i64, symbol: &str) -> Order {
        Order {
            id,
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc."),
            shares: 2.0,
            price: 10.0,
            total_amount: 20.0,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            transaction_type: TransactionType::Buy,
        }
    }

    #[test]
    fn test_missing_key_is_empty() {
        let book = OrderBook::new(MemoryStore::new());
        assert!(book.load().is_empty());
    }

    #[test]
    fn test_malformed_entry_is_empty() {
        let store = MemoryStore::new();
        store.set(ORDERS_KEY, b"{not json").unwrap();
        let book = OrderBook::new(store);
        assert!(book.load().is_empty());
    }

    #[test]
    fn test_append_preserves_previous_entries() {
        let book = OrderBook::new(MemoryStore::new());
        book.append(&order(1, "AAPL")).unwrap();
        book.append(&order(2, "MSFT")).unwrap();
        book.append(&order(3, "TSLA")).unwrap();

        let ids: Vec<_> = book.load().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// Delegates to a memory store but fails the next `get` when armed.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: Cell<bool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            if self.fail_next_get.replace(false) {
                return Err(StoreError::Database(sled::Error::Unsupported(
                    "read failed".to_string(),
                )));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_append_after_read_error_keeps_prior_orders() {
        let book = OrderBook::new(FlakyStore::default());
        book.append(&order(1, "AAPL")).unwrap();
        book.append(&order(2, "MSFT")).unwrap();

        book.store.fail_next_get.set(true);
        assert!(matches!(
            book.append(&order(3, "TSLA")),
            Err(StoreError::Database(_))
        ));
        let ids: Vec<_> = book.load().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);

        book.append(&order(3, "TSLA")).unwrap();
        let ids: Vec<_> = book.load().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_append_refuses_to_overwrite_malformed_entry() {
        let store = MemoryStore::new();
        store.set(ORDERS_KEY, b"{not json").unwrap();
        let book = OrderBook::new(store);

        assert!(matches!(
            book.append(&order(1, "AAPL")),
            Err(StoreError::Serialize(_))
        ));
        let raw = book.store.get(ORDERS_KEY).unwrap().unwrap();
        assert_eq!(raw, b"{not json".to_vec());
    }

    #[test]
    fn test_stored_layout_is_json_array() {
        let store = MemoryStore::new();
        let book = OrderBook::new(store);
        book.append(&order(1, "AAPL")).unwrap();

        let raw = book.store.get(ORDERS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["symbol"], "AAPL");
        assert_eq!(first["totalAmount"], 20.0);
        assert_eq!(first["transactionType"], "buy");
        assert_eq!(first["date"], "2024-01-15");
    }

    #[test]
    fn test_sled_store_round_trip() {
        let book = OrderBook::new(SledStore::temporary().unwrap());
        assert!(book.load().is_empty());
        book.append(&order(7, "BTC")).unwrap();
        assert_eq!(book.load(), vec![order(7, "BTC")]);
    }
}
