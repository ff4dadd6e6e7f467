use crate::core::error::SettlementError;
use crate::core::member::MemberId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net position of every member of a group.
///
/// A positive balance means the member is owed money (net creditor).
/// A negative balance means the member owes money (net debtor).
///
/// Keyed by [`MemberId`] in a `BTreeMap`, so iteration order is stable and
/// everything derived from it (transfer tie-breaks included) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    positions: BTreeMap<MemberId, Decimal>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every listed member at zero.
    pub fn zeroed(members: impl IntoIterator<Item = MemberId>) -> Self {
        Self {
            positions: members.into_iter().map(|m| (m, Decimal::ZERO)).collect(),
        }
    }

    /// Record money paid out by `member` on behalf of the group.
    pub fn credit(&mut self, member: MemberId, amount: Decimal) -> Result<(), SettlementError> {
        self.post(&[(member, amount)])
    }

    /// Record `member`'s share of an expense.
    pub fn debit(&mut self, member: MemberId, amount: Decimal) -> Result<(), SettlementError> {
        self.post(&[(member, -amount)])
    }

    /// Apply signed postings all at once.
    ///
    /// If any position would leave the `Decimal` range, nothing is applied
    /// and the first member that overflowed is reported.
    pub fn post(&mut self, postings: &[(MemberId, Decimal)]) -> Result<(), SettlementError> {
        let mut staged: BTreeMap<MemberId, Decimal> = BTreeMap::new();
        for (member, delta) in postings {
            let current = staged
                .get(member)
                .copied()
                .unwrap_or_else(|| self.get(*member));
            let next = current
                .checked_add(*delta)
                .ok_or(SettlementError::BalanceOverflow(*member))?;
            staged.insert(*member, next);
        }
        self.positions.extend(staged);
        Ok(())
    }

    /// Net position of a member; zero for unknown members.
    pub fn get(&self, member: MemberId) -> Decimal {
        self.positions.get(&member).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, member: MemberId) -> bool {
        self.positions.contains_key(&member)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, Decimal)> + '_ {
        self.positions.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of all positions. Zero (within tolerance) for any real group.
    pub fn total(&self) -> Decimal {
        self.positions
            .values()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// Verify that credits and debits cancel out.
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.total().abs() <= tolerance
    }

    /// Total owed to creditors, i.e. the amount that must actually move.
    pub fn total_outstanding(&self) -> Decimal {
        self.positions
            .values()
            .filter(|v| **v > Decimal::ZERO)
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
    }
}
