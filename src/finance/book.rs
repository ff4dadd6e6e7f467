use crate::finance::month::Month;
use crate::finance::summary::MonthlySummary;
use crate::finance::transaction::{Budget, Transaction, TransactionKind};
use crate::finance::FinanceError;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    #[serde(default)]
    pub note: String,
    /// Defaults to today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Partial update: only the fields that are `Some` change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub note: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    pub category: String,
    pub limit: Decimal,
    pub month: Month,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub category: Option<String>,
    pub limit: Option<Decimal>,
    pub month: Option<Month>,
}

/// Criteria for listing transactions. Every set field must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    /// Inclusive.
    pub start: Option<NaiveDate>,
    /// Inclusive.
    pub end: Option<NaiveDate>,
    /// Case-insensitive substring of the note.
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.kind.is_some_and(|kind| kind != tx.kind) {
            return false;
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if tx.category != category {
                return false;
            }
        }
        if self.start.is_some_and(|start| tx.date < start) {
            return false;
        }
        if self.end.is_some_and(|end| tx.date > end) {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !tx.note.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// One person's transactions and budgets.
#[derive(Debug, Clone, Default)]
pub struct FinanceBook {
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    last_transaction: u64,
    last_budget: u64,
}

impl FinanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from stored records, keeping their ids.
    pub fn from_records(transactions: Vec<Transaction>, budgets: Vec<Budget>) -> Self {
        let last_transaction = transactions.iter().map(|t| t.id).max().unwrap_or(0);
        let last_budget = budgets.iter().map(|b| b.id).max().unwrap_or(0);
        Self {
            transactions,
            budgets,
            last_transaction,
            last_budget,
        }
    }

    pub fn add_transaction(&mut self, input: NewTransaction) -> Result<u64, FinanceError> {
        validate_amount(input.amount)?;
        validate_category(&input.category)?;
        self.last_transaction += 1;
        let id = self.last_transaction;
        self.transactions.push(Transaction {
            id,
            amount: input.amount,
            kind: input.kind,
            category: input.category,
            note: input.note,
            date: input.date.unwrap_or_else(|| Local::now().date_naive()),
        });
        Ok(id)
    }

    pub fn update_transaction(&mut self, id: u64, update: TransactionUpdate) -> Result<(), FinanceError> {
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }
        if let Some(category) = &update.category {
            validate_category(category)?;
        }
        let tx = self
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(FinanceError::TransactionNotFound(id))?;

        if let Some(amount) = update.amount {
            tx.amount = amount;
        }
        if let Some(kind) = update.kind {
            tx.kind = kind;
        }
        if let Some(category) = update.category {
            tx.category = category;
        }
        if let Some(note) = update.note {
            tx.note = note;
        }
        if let Some(date) = update.date {
            tx.date = date;
        }
        Ok(())
    }

    pub fn delete_transaction(&mut self, id: u64) -> Result<Transaction, FinanceError> {
        let index = self
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or(FinanceError::TransactionNotFound(id))?;
        Ok(self.transactions.remove(index))
    }

    /// Matching transactions, newest first (date, then id).
    pub fn transactions(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut matching: Vec<&Transaction> =
            self.transactions.iter().filter(|t| filter.matches(t)).collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        matching
    }

    pub fn add_budget(&mut self, input: NewBudget) -> Result<u64, FinanceError> {
        validate_limit(input.limit)?;
        validate_category(&input.category)?;
        self.last_budget += 1;
        let id = self.last_budget;
        self.budgets.push(Budget {
            id,
            category: input.category,
            limit: input.limit,
            month: input.month,
        });
        Ok(id)
    }

    pub fn update_budget(&mut self, id: u64, update: BudgetUpdate) -> Result<(), FinanceError> {
        if let Some(limit) = update.limit {
            validate_limit(limit)?;
        }
        if let Some(category) = &update.category {
            validate_category(category)?;
        }
        let budget = self
            .budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(FinanceError::BudgetNotFound(id))?;

        if let Some(category) = update.category {
            budget.category = category;
        }
        if let Some(limit) = update.limit {
            budget.limit = limit;
        }
        if let Some(month) = update.month {
            budget.month = month;
        }
        Ok(())
    }

    pub fn delete_budget(&mut self, id: u64) -> Result<Budget, FinanceError> {
        let index = self
            .budgets
            .iter()
            .position(|b| b.id == id)
            .ok_or(FinanceError::BudgetNotFound(id))?;
        Ok(self.budgets.remove(index))
    }

    /// Budgets, latest month first.
    pub fn budgets(&self) -> Vec<&Budget> {
        let mut budgets: Vec<&Budget> = self.budgets.iter().collect();
        budgets.sort_by(|a, b| b.month.cmp(&a.month));
        budgets
    }

    /// Totals for one month, or for all time when `month` is `None`.
    pub fn summary(&self, month: Option<Month>) -> MonthlySummary {
        MonthlySummary::compute(&self.transactions, &self.budgets, month)
    }
}

fn validate_amount(amount: Decimal) -> Result<(), FinanceError> {
    if amount <= Decimal::ZERO {
        return Err(FinanceError::InvalidAmount(amount));
    }
    Ok(())
}

fn validate_limit(limit: Decimal) -> Result<(), FinanceError> {
    if limit < Decimal::ZERO {
        return Err(FinanceError::InvalidLimit(limit));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), FinanceError> {
    if category.trim().is_empty() {
        return Err(FinanceError::MissingCategory);
    }
    Ok(())
}
