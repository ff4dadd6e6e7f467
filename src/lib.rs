//! # group-settlement
//!
//! Shared-expense settlement engine.
//!
//! Given the members of a group and the expenses they paid for each other,
//! this engine computes every member's net balance and a short list of
//! transfers that clears all debts.
//!
//! ## Architecture
//!
//! - **core**: Foundational types: members, expenses, balances, errors
//! - **settlement**: Split resolution, balance accumulation, greedy transfer matching
//! - **store**: In-memory group persistence behind the repository seam
//! - **finance**: Personal transactions, budgets and monthly summaries
//! - **simulation**: Random group generation for stress testing

pub mod core;
pub mod finance;
pub mod settlement;
pub mod simulation;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::balance::Balances;
    pub use crate::core::error::SettlementError;
    pub use crate::core::expense::{Expense, ExpenseId, NewExpense, SplitPolicy};
    pub use crate::core::member::{GroupId, Member, MemberId};
    pub use crate::settlement::accumulator::BalanceAccumulator;
    pub use crate::settlement::config::SettlementConfig;
    pub use crate::settlement::matcher::{Transfer, TransferMatcher};
    pub use crate::settlement::service::{GroupRepository, SettlementReport, SettlementService};
    pub use crate::settlement::split::SplitResolver;
    pub use crate::store::memory::InMemoryStore;
}
