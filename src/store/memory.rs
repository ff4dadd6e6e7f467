use crate::core::error::SettlementError;
use crate::core::expense::{Expense, ExpenseId, NewExpense};
use crate::core::member::{GroupId, Member, MemberId};
use crate::settlement::service::GroupRepository;
use chrono::Local;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary row for listing groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// A whole group as stored: used for importing and exporting files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Clone)]
struct GroupRecord {
    name: String,
    members: Vec<Member>,
    expenses: Vec<Expense>,
}

/// In-memory group persistence.
///
/// Ids are allocated from store-wide counters starting at 1. Deleting a
/// group removes its members and expenses with it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    groups: BTreeMap<GroupId, GroupRecord>,
    last_group: u64,
    last_member: u64,
    last_expense: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_group(&mut self, name: impl Into<String>) -> GroupId {
        self.last_group += 1;
        let id = GroupId::new(self.last_group);
        self.groups.insert(
            id,
            GroupRecord {
                name: name.into(),
                members: Vec::new(),
                expenses: Vec::new(),
            },
        );
        id
    }

    pub fn groups(&self) -> Vec<Group> {
        self.groups
            .iter()
            .map(|(id, record)| Group {
                id: *id,
                name: record.name.clone(),
            })
            .collect()
    }

    pub fn group(&self, group: GroupId) -> Option<Group> {
        self.groups.get(&group).map(|record| Group {
            id: group,
            name: record.name.clone(),
        })
    }

    pub fn delete_group(&mut self, group: GroupId) -> Result<(), SettlementError> {
        self.groups
            .remove(&group)
            .map(|record| {
                debug!(
                    "deleted group {} with {} members and {} expenses",
                    group,
                    record.members.len(),
                    record.expenses.len()
                );
            })
            .ok_or(SettlementError::GroupNotFound(group))
    }

    pub fn add_member(
        &mut self,
        group: GroupId,
        name: impl Into<String>,
    ) -> Result<MemberId, SettlementError> {
        self.record(group)?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SettlementError::InvalidInput("member name is required".into()));
        }
        self.last_member += 1;
        let id = MemberId::new(self.last_member);
        self.record_mut(group)?.members.push(Member::new(id, name));
        Ok(id)
    }

    /// Record an expense. The amount must be positive and the payer must
    /// belong to the group; the split spec is stored as given.
    pub fn add_expense(
        &mut self,
        group: GroupId,
        expense: NewExpense,
    ) -> Result<ExpenseId, SettlementError> {
        if expense.amount <= Decimal::ZERO {
            return Err(SettlementError::InvalidAmount(expense.amount));
        }
        let record = self.record(group)?;
        if !record.members.iter().any(|m| m.id == expense.payer) {
            return Err(SettlementError::MemberNotFound {
                group,
                member: expense.payer,
            });
        }

        self.last_expense += 1;
        let id = ExpenseId::new(self.last_expense);
        let stored = Expense::new(
            id,
            expense.description,
            expense.amount,
            expense.payer,
            expense.date.unwrap_or_else(|| Local::now().date_naive()),
        )
        .with_split(expense.split_policy, expense.split_spec);
        self.record_mut(group)?.expenses.push(stored);
        Ok(id)
    }

    /// Load a group exactly as given, ids included.
    ///
    /// Nothing is validated: imported history may reference payers that are
    /// no longer members, which settlement skips.
    pub fn import_group(&mut self, snapshot: GroupSnapshot) -> GroupId {
        let id = self.create_group(snapshot.name);
        if let Some(max) = snapshot.members.iter().map(|m| m.id.get()).max() {
            self.last_member = self.last_member.max(max);
        }
        if let Some(max) = snapshot.expenses.iter().map(|e| e.id().get()).max() {
            self.last_expense = self.last_expense.max(max);
        }
        if let Some(record) = self.groups.get_mut(&id) {
            record.members = snapshot.members;
            record.expenses = snapshot.expenses;
        }
        id
    }

    pub fn export_group(&self, group: GroupId) -> Result<GroupSnapshot, SettlementError> {
        let record = self.record(group)?;
        Ok(GroupSnapshot {
            name: record.name.clone(),
            members: record.members.clone(),
            expenses: record.expenses.clone(),
        })
    }

    fn record(&self, group: GroupId) -> Result<&GroupRecord, SettlementError> {
        self.groups
            .get(&group)
            .ok_or(SettlementError::GroupNotFound(group))
    }

    fn record_mut(&mut self, group: GroupId) -> Result<&mut GroupRecord, SettlementError> {
        self.groups
            .get_mut(&group)
            .ok_or(SettlementError::GroupNotFound(group))
    }
}

impl GroupRepository for InMemoryStore {
    fn members(&self, group: GroupId) -> Result<Vec<Member>, SettlementError> {
        Ok(self.record(group)?.members.clone())
    }

    /// Newest first: by date, then by id.
    fn expenses(&self, group: GroupId) -> Result<Vec<Expense>, SettlementError> {
        let mut expenses = self.record(group)?.expenses.clone();
        expenses.sort_by(|a, b| b.date().cmp(&a.date()).then(b.id().cmp(&a.id())));
        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_ids_start_at_one() {
        let mut store = InMemoryStore::new();
        let g = store.create_group("Flat");
        assert_eq!(g, GroupId::new(1));
        assert_eq!(store.add_member(g, "A").unwrap(), MemberId::new(1));
        assert_eq!(store.add_member(g, "B").unwrap(), MemberId::new(2));
        assert_eq!(store.groups(), vec![Group { id: g, name: "Flat".into() }]);
    }

    #[test]
    fn test_add_member_unknown_group() {
        let mut store = InMemoryStore::new();
        assert_eq!(
            store.add_member(GroupId::new(4), "A"),
            Err(SettlementError::GroupNotFound(GroupId::new(4)))
        );
    }

    #[test]
    fn test_add_expense_validation() {
        let mut store = InMemoryStore::new();
        let g = store.create_group("Trip");
        let a = store.add_member(g, "A").unwrap();

        assert_eq!(
            store.add_expense(g, NewExpense::equal("Free", Decimal::ZERO, a)),
            Err(SettlementError::InvalidAmount(Decimal::ZERO))
        );
        assert_eq!(
            store.add_expense(g, NewExpense::equal("Ghost", dec!(5), MemberId::new(42))),
            Err(SettlementError::MemberNotFound {
                group: g,
                member: MemberId::new(42)
            })
        );
        assert!(store
            .add_expense(g, NewExpense::ratio("Odd", dec!(5), a, "garbage"))
            .is_ok());
    }

    #[test]
    fn test_expenses_newest_first() {
        let mut store = InMemoryStore::new();
        let g = store.create_group("Trip");
        let a = store.add_member(g, "A").unwrap();
        let first = store.add_expense(g, NewExpense::equal("x", dec!(1), a).on(day(1))).unwrap();
        let second = store.add_expense(g, NewExpense::equal("y", dec!(1), a).on(day(3))).unwrap();
        let third = store.add_expense(g, NewExpense::equal("z", dec!(1), a).on(day(3))).unwrap();

        let ids: Vec<ExpenseId> = store.expenses(g).unwrap().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[test]
    fn test_delete_group_cascades() {
        let mut store = InMemoryStore::new();
        let g = store.create_group("Trip");
        let a = store.add_member(g, "A").unwrap();
        store.add_expense(g, NewExpense::equal("x", dec!(1), a)).unwrap();

        store.delete_group(g).unwrap();
        assert!(store.group(g).is_none());
        assert!(store.members(g).is_err());
        assert_eq!(store.delete_group(g), Err(SettlementError::GroupNotFound(g)));
    }

    #[test]
    fn test_import_keeps_ids() {
        let mut store = InMemoryStore::new();
        let g = store.import_group(GroupSnapshot {
            name: "Imported".into(),
            members: vec![Member::new(10, "A"), Member::new(11, "B")],
            expenses: vec![Expense::new(ExpenseId::new(5), "x", dec!(2), MemberId::new(10), day(2))],
        });
        assert_eq!(store.members(g).unwrap()[0].id, MemberId::new(10));
        assert_eq!(store.add_member(g, "C").unwrap(), MemberId::new(12));
        assert_eq!(store.export_group(g).unwrap().expenses.len(), 1);
    }
}
