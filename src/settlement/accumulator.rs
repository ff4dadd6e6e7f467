use crate::core::balance::Balances;
use crate::core::error::SettlementError;
use crate::core::expense::{Expense, ExpenseId};
use crate::core::member::{Member, MemberId};
use crate::settlement::split::SplitResolver;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balances of a group plus the expenses that could not be applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedBalances {
    pub balances: Balances,
    /// Expenses skipped because their payer is not a member of the group,
    /// or because applying them would overflow a balance.
    pub skipped: Vec<ExpenseId>,
}

/// Folds a group's expenses into one signed balance per member.
pub struct BalanceAccumulator;

impl BalanceAccumulator {
    /// Compute "amount paid minus amount owed" for every member.
    ///
    /// # Algorithm
    ///
    /// 1. Start every member at zero, so members without expenses still appear.
    /// 2. For each expense whose payer is a member: credit the payer the full
    ///    amount, then debit each member `amount * share`. The postings of one
    ///    expense land together or not at all.
    ///
    /// Expenses are independent of each other, so the result does not depend
    /// on their order beyond the last digits of decimal rounding.
    pub fn accumulate(members: &[Member], expenses: &[Expense]) -> AccumulatedBalances {
        let mut balances = Balances::zeroed(members.iter().map(|m| m.id));
        let member_ids: Vec<MemberId> = balances.iter().map(|(m, _)| m).collect();
        let mut skipped = Vec::new();

        for expense in expenses {
            if !balances.contains(expense.payer()) {
                warn!(
                    "skipping expense {} ('{}'): payer {} is not a group member",
                    expense.id(),
                    expense.description(),
                    expense.payer()
                );
                skipped.push(expense.id());
                continue;
            }

            let mut postings = vec![(expense.payer(), expense.amount())];
            let shares = SplitResolver::resolve(expense, &member_ids);
            let owed: Option<Vec<(MemberId, Decimal)>> = shares
                .into_iter()
                .map(|(member, share)| expense.amount().checked_mul(share).map(|d| (member, -d)))
                .collect();
            let applied = match owed {
                Some(owed) => {
                    postings.extend(owed);
                    balances.post(&postings)
                }
                None => Err(SettlementError::InvalidAmount(expense.amount())),
            };
            if let Err(reason) = applied {
                warn!("skipping expense {} ('{}'): {}", expense.id(), expense.description(), reason);
                skipped.push(expense.id());
            }
        }

        AccumulatedBalances { balances, skipped }
    }
}
