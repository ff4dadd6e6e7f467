use crate::core::error::SettlementError;
use crate::core::expense::{Expense, ExpenseId};
use crate::core::member::{GroupId, Member, MemberId};
use crate::settlement::accumulator::BalanceAccumulator;
use crate::settlement::config::SettlementConfig;
use crate::settlement::matcher::TransferMatcher;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Read access to a group's members and expenses.
///
/// Implementations return owned snapshots; the settlement computation never
/// holds on to the repository between calls.
pub trait GroupRepository {
    fn members(&self, group: GroupId) -> Result<Vec<Member>, SettlementError>;
    fn expenses(&self, group: GroupId) -> Result<Vec<Expense>, SettlementError>;
}

impl<R: GroupRepository + ?Sized> GroupRepository for &R {
    fn members(&self, group: GroupId) -> Result<Vec<Member>, SettlementError> {
        (**self).members(group)
    }

    fn expenses(&self, group: GroupId) -> Result<Vec<Expense>, SettlementError> {
        (**self).expenses(group)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEntry {
    pub id: MemberId,
    pub name: String,
}

/// A member's net position, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub member: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub from: String,
    pub to: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// The settlement of one group, shaped for API clients:
///
/// ```json
/// {
///   "members":   [{"id": 1, "name": "A"}],
///   "balances":  [{"member": "A", "net": 60.0}],
///   "transfers": [{"from": "B", "to": "A", "amount": 30.0}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub members: Vec<MemberEntry>,
    pub balances: Vec<BalanceEntry>,
    pub transfers: Vec<TransferEntry>,
    /// Expenses left out because their payer is not a member, or because
    /// they would overflow a balance.
    #[serde(skip)]
    pub skipped: Vec<ExpenseId>,
}

impl SettlementReport {
    /// True when nobody owes anybody anything.
    pub fn is_settled(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Total money that has to change hands.
    pub fn total_transferred(&self) -> Decimal {
        self.transfers
            .iter()
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
    }
}

/// Compute the settlement of an in-memory snapshot.
///
/// Pure: no I/O, no shared state. An empty member list yields an empty report
/// without touching the expenses.
pub fn settle(members: &[Member], expenses: &[Expense], config: &SettlementConfig) -> SettlementReport {
    let mut seen = HashSet::new();
    let members: Vec<&Member> = members.iter().filter(|m| seen.insert(m.id)).collect();
    if members.is_empty() {
        return SettlementReport::default();
    }

    let owned: Vec<Member> = members.iter().map(|m| (*m).clone()).collect();
    let accumulated = BalanceAccumulator::accumulate(&owned, expenses);
    let transfers = TransferMatcher::settle(&accumulated.balances, config);

    let names: HashMap<MemberId, &str> = members.iter().map(|m| (m.id, m.name.as_str())).collect();
    let name_of = |id: MemberId| names.get(&id).copied().unwrap_or_default().to_string();

    SettlementReport {
        members: members
            .iter()
            .map(|m| MemberEntry {
                id: m.id,
                name: m.name.clone(),
            })
            .collect(),
        balances: members
            .iter()
            .map(|m| BalanceEntry {
                member: m.name.clone(),
                net: config.round(accumulated.balances.get(m.id)).normalize(),
            })
            .collect(),
        transfers: transfers
            .into_iter()
            .map(|t| TransferEntry {
                from: name_of(t.from),
                to: name_of(t.to),
                amount: t.amount,
            })
            .collect(),
        skipped: accumulated.skipped,
    }
}

/// Settlement queries over an injected repository.
///
/// # Examples
///
/// ```
/// use group_settlement::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let mut store = InMemoryStore::new();
/// let trip = store.create_group("Trip");
/// let a = store.add_member(trip, "A").unwrap();
/// let b = store.add_member(trip, "B").unwrap();
/// store.add_expense(trip, NewExpense::equal("Fuel", dec!(50), a)).unwrap();
///
/// let service = SettlementService::new(&store);
/// let report = service.compute_settlement(trip).unwrap();
/// assert_eq!(report.transfers.len(), 1);
/// assert_eq!(report.transfers[0].from, "B");
/// assert_eq!(report.transfers[0].amount, dec!(25));
/// # let _ = b;
/// ```
pub struct SettlementService<R> {
    repository: R,
    config: SettlementConfig,
}

impl<R: GroupRepository> SettlementService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_config(repository, SettlementConfig::default())
    }

    pub fn with_config(repository: R, config: SettlementConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Load the group's snapshot and settle it.
    pub fn compute_settlement(&self, group: GroupId) -> Result<SettlementReport, SettlementError> {
        let members = self.repository.members(group)?;
        if members.is_empty() {
            info!("group {}: no members, nothing to settle", group);
            return Ok(SettlementReport::default());
        }
        let expenses = self.repository.expenses(group)?;

        let report = settle(&members, &expenses, &self.config);
        info!(
            "group {}: settled {} expenses across {} members with {} transfers ({} skipped)",
            group,
            expenses.len() - report.skipped.len(),
            report.members.len(),
            report.transfers.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Same as [`compute_settlement`](Self::compute_settlement) for a group id
    /// taken verbatim from a request.
    pub fn compute_settlement_str(&self, raw_group: &str) -> Result<SettlementReport, SettlementError> {
        self.compute_settlement(GroupId::parse(raw_group)?)
    }
}

impl std::fmt::Display for SettlementReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Settlement ===")?;
        writeln!(f, "Members:   {}", self.members.len())?;
        writeln!(f, "Transfers: {}", self.transfers.len())?;
        writeln!(f, "To move:   {}", self.total_transferred())?;
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped:   {} expense(s)", self.skipped.len())?;
        }

        writeln!(f, "\n--- Balances ---")?;
        for entry in &self.balances {
            let status = if entry.net > Decimal::ZERO {
                "is owed"
            } else if entry.net < Decimal::ZERO {
                "owes"
            } else {
                "settled"
            };
            writeln!(f, "  {:<16} {:>12}  {}", entry.member, entry.net, status)?;
        }

        if !self.transfers.is_empty() {
            writeln!(f, "\n--- Transfers ---")?;
            for t in &self.transfers {
                writeln!(f, "  {} → {}: {}", t.from, t.to, t.amount)?;
            }
        }
        Ok(())
    }
}
