//! Personal income, expenses and monthly budgets.
//!
//! Independent of group settlement: these are one person's own records,
//! summarized per month for charts and budget tracking.

pub mod book;
pub mod month;
pub mod summary;
pub mod transaction;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FinanceError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("budget limit cannot be negative, got {0}")]
    InvalidLimit(Decimal),
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("category is required")]
    MissingCategory,
    #[error("transaction {0} not found")]
    TransactionNotFound(u64),
    #[error("budget {0} not found")]
    BudgetNotFound(u64),
}
