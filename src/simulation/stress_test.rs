//! Stress testing utilities for the settlement engine.
//!
//! Generates random groups, including the kind of bad historical rows
//! settlement has to tolerate (malformed ratio specs, departed payers).

use crate::core::expense::{Expense, ExpenseId};
use crate::core::member::{Member, MemberId};
use crate::store::memory::GroupSnapshot;
use chrono::{Duration, NaiveDate};
use rand::Rng;
use rust_decimal::Decimal;

/// Configuration for generating a random group.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Number of members in the group.
    pub member_count: usize,
    /// Number of expenses to record.
    pub expense_count: usize,
    /// Minimum expense amount, in cents.
    pub min_cents: i64,
    /// Maximum expense amount, in cents.
    pub max_cents: i64,
    /// Probability that an expense uses a ratio split.
    pub ratio_probability: f64,
    /// Probability that a ratio expense carries a malformed spec.
    pub malformed_probability: f64,
    /// Probability that an expense names a payer outside the group.
    pub orphan_probability: f64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            member_count: 6,
            expense_count: 30,
            min_cents: 100,
            max_cents: 50_000,
            ratio_probability: 0.3,
            malformed_probability: 0.1,
            orphan_probability: 0.0,
        }
    }
}

const MALFORMED_SPECS: &[&str] = &["{}", "[1, 2]", "{'1': 1}", r#"{"x": 1}"#, r#"{"1": "a lot"}"#, ""];

/// Generate a random group snapshot for testing.
pub fn generate_random_group(config: &GroupConfig) -> GroupSnapshot {
    let mut rng = rand::thread_rng();

    let members: Vec<Member> = (1..=config.member_count as u64)
        .map(|i| Member::new(i, format!("MEMBER-{:03}", i)))
        .collect();

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);
    let mut expenses = Vec::with_capacity(config.expense_count);
    if members.is_empty() {
        return GroupSnapshot {
            name: "Random group".to_string(),
            members,
            expenses,
        };
    }

    let low = config.min_cents.max(1);
    let high = config.max_cents.max(low);
    for i in 1..=config.expense_count as u64 {
        let payer = if rng.gen_bool(config.orphan_probability.clamp(0.0, 1.0)) {
            MemberId::new(config.member_count as u64 + 1 + i)
        } else {
            members[rng.gen_range(0..members.len())].id
        };
        let cents = rng.gen_range(low..=high);
        let date = start + Duration::days(rng.gen_range(0..365));

        let mut expense = Expense::new(
            ExpenseId::new(i),
            format!("Expense {}", i),
            Decimal::new(cents, 2),
            payer,
            date,
        );

        if rng.gen_bool(config.ratio_probability.clamp(0.0, 1.0)) {
            let spec = if rng.gen_bool(config.malformed_probability.clamp(0.0, 1.0)) {
                MALFORMED_SPECS[rng.gen_range(0..MALFORMED_SPECS.len())].to_string()
            } else {
                let mut weights = Vec::new();
                for member in &members {
                    if rng.gen_bool(0.7) {
                        weights.push(format!("\"{}\": {}", member.id, rng.gen_range(0..5)));
                    }
                }
                format!("{{{}}}", weights.join(", "))
            };
            expense = expense.with_ratio(spec);
        }
        expenses.push(expense);
    }

    GroupSnapshot {
        name: "Random group".to_string(),
        members,
        expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::config::SettlementConfig;
    use crate::settlement::service::settle;

    #[test]
    fn test_random_group_generation() {
        let config = GroupConfig {
            member_count: 5,
            expense_count: 12,
            ..Default::default()
        };

        let group = generate_random_group(&config);
        assert_eq!(group.members.len(), 5);
        assert_eq!(group.expenses.len(), 12);
        assert!(group.expenses.iter().all(|e| e.amount() > Decimal::ZERO));
    }

    #[test]
    fn test_random_group_settles() {
        let config = GroupConfig {
            member_count: 20,
            expense_count: 100,
            malformed_probability: 0.5,
            orphan_probability: 0.1,
            ..Default::default()
        };

        let group = generate_random_group(&config);
        let report = settle(&group.members, &group.expenses, &SettlementConfig::default());
        assert_eq!(report.balances.len(), 20);
        assert!(report.transfers.iter().all(|t| t.amount > Decimal::ZERO));
        assert!(report.transfers.len() <= 19);
    }

    #[test]
    fn test_empty_group_config() {
        let config = GroupConfig {
            member_count: 0,
            ..Default::default()
        };
        let group = generate_random_group(&config);
        assert!(group.members.is_empty());
        assert!(group.expenses.is_empty());
    }
}
