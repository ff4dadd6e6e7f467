use chrono::NaiveDate;
use group_settlement::core::expense::{Expense, ExpenseId};
use group_settlement::core::member::{Member, MemberId};
use group_settlement::settlement::accumulator::BalanceAccumulator;
use group_settlement::settlement::config::SettlementConfig;
use group_settlement::settlement::matcher::TransferMatcher;
use group_settlement::settlement::service::settle;
use group_settlement::settlement::split::SplitResolver;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

const EPS: Decimal = dec!(0.000001);
const CENTS: Decimal = dec!(0.02);

fn members(count: u64) -> Vec<Member> {
    (1..=count).map(|i| Member::new(i, format!("M{}", i))).collect()
}

/// Generate a split spec: a valid weight map, or one of the malformed shapes.
fn arb_spec(member_count: u64) -> impl Strategy<Value = Option<String>> {
    let weights = prop::collection::vec((1..=member_count, 0u32..10), 0..6).prop_map(|pairs| {
        let body: Vec<String> = pairs
            .iter()
            .map(|(m, w)| format!("\"{}\": {}", m, w))
            .collect();
        Some(format!("{{{}}}", body.join(", ")))
    });
    prop_oneof![
        3 => weights,
        1 => Just(None),
        1 => prop::sample::select(vec![
            Some("{}".to_string()),
            Some("[]".to_string()),
            Some("nonsense".to_string()),
            Some(r#"{"1": -4}"#.to_string()),
            Some(r#"{"99": 1}"#.to_string()),
            Some(r#"{"1": 4e28, "2": 4e28}"#.to_string()),
        ]),
    ]
}

/// Generate a random expense: amount in cents, payer sometimes outside the group.
fn arb_expense(member_count: u64) -> impl Strategy<Value = Expense> {
    (
        1u64..10_000,
        1..=member_count + 1,
        1i64..1_000_000,
        any::<bool>(),
        arb_spec(member_count),
    )
        .prop_map(|(id, payer, cents, ratio, spec)| {
            let expense = Expense::new(
                ExpenseId::new(id),
                "generated",
                Decimal::new(cents, 2),
                MemberId::new(payer),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            );
            match (ratio, spec) {
                (true, Some(spec)) => expense.with_ratio(spec),
                _ => expense,
            }
        })
}

/// Generate a group of 1..8 members with up to 40 expenses.
fn arb_group() -> impl Strategy<Value = (Vec<Member>, Vec<Expense>)> {
    (1u64..8).prop_flat_map(|n| {
        (
            Just(members(n)),
            prop::collection::vec(arb_expense(n), 0..40),
        )
    })
}

proptest! {
    // Every expense hands out exactly its amount, so balances cancel.
    #[test]
    fn balances_sum_to_zero((members, expenses) in arb_group()) {
        let result = BalanceAccumulator::accumulate(&members, &expenses);
        prop_assert!(
            result.balances.total().abs() <= EPS,
            "balances must cancel, got total {}",
            result.balances.total()
        );
    }

    // Shares of any expense add up to one.
    #[test]
    fn shares_are_normalized(expense in arb_expense(6)) {
        let ids: Vec<MemberId> = members(6).iter().map(|m| m.id).collect();
        let shares = SplitResolver::resolve(&expense, &ids);
        let total: Decimal = shares.values().sum();
        prop_assert!((total - Decimal::ONE).abs() <= EPS, "shares sum to {}", total);
        prop_assert!(shares.values().all(|s| *s >= Decimal::ZERO));
    }

    // Each member receives minus pays what their balance says, to two cents.
    #[test]
    fn transfers_conserve_balances((members, expenses) in arb_group()) {
        let config = SettlementConfig::default();
        let balances = BalanceAccumulator::accumulate(&members, &expenses).balances;
        let transfers = TransferMatcher::settle(&balances, &config);

        let mut flow: HashMap<MemberId, Decimal> = HashMap::new();
        for t in &transfers {
            *flow.entry(t.to).or_insert(Decimal::ZERO) += t.amount;
            *flow.entry(t.from).or_insert(Decimal::ZERO) -= t.amount;
        }
        for (member, balance) in balances.iter() {
            let net = flow.get(&member).copied().unwrap_or(Decimal::ZERO);
            prop_assert!(
                (net - balance).abs() <= CENTS,
                "member {} balance {} but transfers net {}",
                member, balance, net
            );
        }
    }

    // Transfers are positive, whole cents, and never more than creditors + debtors - 1.
    #[test]
    fn transfers_are_positive_and_bounded((members, expenses) in arb_group()) {
        let config = SettlementConfig::default();
        let balances = BalanceAccumulator::accumulate(&members, &expenses).balances;
        let transfers = TransferMatcher::settle(&balances, &config);

        for t in &transfers {
            prop_assert!(t.amount > Decimal::ZERO);
            prop_assert_eq!(t.amount, t.amount.round_dp(2));
            prop_assert_ne!(t.from, t.to);
        }
        let open = balances.iter().filter(|(_, v)| !config.is_settled(*v)).count();
        prop_assert!(transfers.len() <= open.saturating_sub(1));
    }

    // Same snapshot, same settlement.
    #[test]
    fn settlement_is_deterministic((members, expenses) in arb_group()) {
        let config = SettlementConfig::default();
        let first = settle(&members, &expenses, &config);
        let second = settle(&members, &expenses, &config);
        prop_assert_eq!(first, second);
    }

    // Expense order does not change balances.
    #[test]
    fn expense_order_is_irrelevant((members, expenses) in arb_group()) {
        let mut reversed = expenses.clone();
        reversed.reverse();
        let forward = BalanceAccumulator::accumulate(&members, &expenses).balances;
        let backward = BalanceAccumulator::accumulate(&members, &reversed).balances;
        for (member, amount) in forward.iter() {
            prop_assert!((backward.get(member) - amount).abs() <= EPS);
        }
    }

    // All-zero ratio weights settle exactly like an equal split.
    #[test]
    fn zero_weights_fall_back_to_equal(cents in 1i64..1_000_000, payer in 1u64..=4) {
        let group = members(4);
        let equal = Expense::new(
            ExpenseId::new(1),
            "x",
            Decimal::new(cents, 2),
            MemberId::new(payer),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let ratio = equal.clone().with_ratio(r#"{"1": 0, "3": 0}"#);
        prop_assert_eq!(
            BalanceAccumulator::accumulate(&group, &[equal]).balances,
            BalanceAccumulator::accumulate(&group, &[ratio]).balances
        );
    }
}
