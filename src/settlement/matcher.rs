use crate::core::balance::Balances;
use crate::core::member::MemberId;
use crate::settlement::config::SettlementConfig;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A payment from a debtor to a creditor that clears part of their balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    /// Always positive, rounded to the configured scale.
    pub amount: Decimal,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}: {}", self.from, self.to, self.amount)
    }
}

/// Greedy debt matching.
///
/// Repeatedly pairs the largest remaining debtor with the largest remaining
/// creditor. This is not the minimum number of transfers (that problem is
/// NP-hard) but is linear after sorting and never emits more than
/// `creditors + debtors - 1` transfers.
pub struct TransferMatcher;

impl TransferMatcher {
    /// Produce the transfers that bring every balance back to zero.
    ///
    /// # Algorithm
    ///
    /// 1. Balances outside `tolerance` are rounded to the configured scale and
    ///    nudged by single units until they sum to exactly zero
    ///    (see [`quantize`](Self::quantize)).
    /// 2. Positive rounded balances are creditors, negative ones are debtors
    ///    (tracked as positive owed amounts). Both lists are sorted descending.
    ///    The sort is stable over member-id order, so equal amounts always pair
    ///    the same way for the same input, but no particular tie order is
    ///    promised.
    /// 3. Two-pointer sweep: pay `min(debt, credit)`, subtract it from both,
    ///    advance whichever side reaches zero.
    ///
    /// Every amount is a whole number of units, so each payment clears at
    /// least one side and the sweep ends with both lists exhausted.
    pub fn settle(balances: &Balances, config: &SettlementConfig) -> Vec<Transfer> {
        let quantized = Self::quantize(balances, config);

        let mut creditors: Vec<(MemberId, Decimal)> = quantized
            .iter()
            .filter(|(_, v)| *v > Decimal::ZERO)
            .copied()
            .collect();
        let mut debtors: Vec<(MemberId, Decimal)> = quantized
            .iter()
            .filter(|(_, v)| *v < Decimal::ZERO)
            .map(|(m, v)| (*m, -*v))
            .collect();

        creditors.sort_by(|a, b| b.1.cmp(&a.1));
        debtors.sort_by(|a, b| b.1.cmp(&a.1));

        let mut transfers = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < debtors.len() && j < creditors.len() {
            let (debtor, debt) = debtors[i];
            let (creditor, credit) = creditors[j];
            let pay = debt.min(credit);

            transfers.push(Transfer {
                from: debtor,
                to: creditor,
                amount: pay,
            });

            debtors[i].1 = debt - pay;
            creditors[j].1 = credit - pay;
            if debtors[i].1.is_zero() {
                i += 1;
            }
            if creditors[j].1.is_zero() {
                j += 1;
            }
        }

        transfers
    }

    /// Round open balances to the configured scale so that they sum to zero.
    ///
    /// Settled balances become zero. The remaining ones are rounded, then the
    /// leftover `sum / unit` units are taken back one at a time from the
    /// members rounding favoured most (or given to those it hurt most), ties
    /// by member id. Every result is within `1.5` units of its input.
    pub fn quantize(balances: &Balances, config: &SettlementConfig) -> Vec<(MemberId, Decimal)> {
        let unit = Decimal::new(1, config.scale);

        let mut rounded: Vec<(MemberId, Decimal, Decimal)> = balances
            .iter()
            .map(|(member, raw)| {
                if config.is_settled(raw) {
                    (member, Decimal::ZERO, Decimal::ZERO)
                } else {
                    let q = config.round(raw);
                    (member, q, q - raw)
                }
            })
            .collect();

        let drift = rounded
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, q, _)| acc.checked_add(*q))
            .unwrap_or(Decimal::ZERO);
        let steps = drift
            .checked_div(unit)
            .and_then(|units| units.round().abs().to_usize())
            .unwrap_or(0);
        if steps > 0 {
            let mut candidates: Vec<usize> = (0..rounded.len())
                .filter(|&k| !config.is_settled(balances.get(rounded[k].0)))
                .collect();
            if drift > Decimal::ZERO {
                candidates.sort_by(|&a, &b| rounded[b].2.cmp(&rounded[a].2));
            } else {
                candidates.sort_by(|&a, &b| rounded[a].2.cmp(&rounded[b].2));
            }
            let nudge = if drift > Decimal::ZERO { -unit } else { unit };
            for &k in candidates.iter().cycle().take(steps.min(candidates.len() * 2)) {
                rounded[k].1 = rounded[k].1.saturating_add(nudge);
            }
        }

        rounded.into_iter().map(|(member, q, _)| (member, q)).collect()
    }
}
