//! Error types for investvision
//!
//! This module defines domain-specific error types that provide clear,
//! actionable error messages to users.

use thiserror::Error;

/// Validation errors for the add-investment form.
///
/// These errors are shown directly to users and should be clear and actionable.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Please select a stock first")]
    NoInstrumentSelected,

    #[error("Date is required")]
    DateRequired,

    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Number of shares is required")]
    QuantityRequired,

    #[error("Invalid number of shares: {0}")]
    InvalidQuantity(String),

    #[error("Number of shares must be positive, got {0}")]
    NonPositiveQuantity(f64),

    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    #[error("Price cannot be negative, got {0}")]
    NegativePrice(f64),
}

/// Failures of the local key-value store backing the order list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Failed to encode or decode orders: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything that can stop an order from being recorded.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
