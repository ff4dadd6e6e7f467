use crate::finance::month::Month;
use crate::finance::transaction::{Budget, Transaction, TransactionKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// How much of a monthly budget has been spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub limit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub used: Decimal,
    /// Percentage of the limit used; 0 when the limit is 0.
    pub percent: f64,
}

/// Chart-ready totals over a set of transactions.
///
/// The three series are aligned with `months`: index `i` of each series
/// belongs to `months[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub category_totals: Vec<CategoryTotal>,
    pub months: Vec<Month>,
    #[serde(with = "float_series")]
    pub income_series: Vec<Decimal>,
    #[serde(with = "float_series")]
    pub expense_series: Vec<Decimal>,
    #[serde(with = "float_series")]
    pub trend_series: Vec<Decimal>,
    pub budgets: Vec<BudgetUsage>,
}

mod float_series {
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    use rust_decimal::Decimal;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(series: &[Decimal], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(series.iter().map(|d| d.to_f64().unwrap_or(0.0)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Decimal>, D::Error> {
        Vec::<f64>::deserialize(deserializer)?
            .into_iter()
            .map(|v| Decimal::from_f64(v).ok_or_else(|| D::Error::custom(format!("invalid amount {v}"))))
            .collect()
    }
}

impl MonthlySummary {
    /// Summarize `transactions`, restricted to `month` when given.
    ///
    /// Budget usage is only reported for a specific month: every budget of
    /// that month is compared with the month's expenses in its category.
    pub fn compute(transactions: &[Transaction], budgets: &[Budget], month: Option<Month>) -> Self {
        let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
        let mut income: BTreeMap<Month, Decimal> = BTreeMap::new();
        let mut expense: BTreeMap<Month, Decimal> = BTreeMap::new();

        let in_scope = transactions
            .iter()
            .filter(|t| month.map_or(true, |m| m.contains(t.date)));
        for tx in in_scope {
            let key = tx.month();
            match tx.kind {
                TransactionKind::Expense => {
                    *by_category.entry(tx.category.as_str()).or_insert(Decimal::ZERO) += tx.amount;
                    *expense.entry(key).or_insert(Decimal::ZERO) += tx.amount;
                }
                TransactionKind::Income => {
                    *income.entry(key).or_insert(Decimal::ZERO) += tx.amount;
                }
            }
        }

        let budgets = match month {
            Some(m) => budgets
                .iter()
                .filter(|b| b.month == m)
                .map(|b| {
                    let used = by_category
                        .get(b.category.as_str())
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    BudgetUsage {
                        category: b.category.clone(),
                        limit: b.limit,
                        used,
                        percent: percent_used(used, b.limit),
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        let months: Vec<Month> = income
            .keys()
            .chain(expense.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let series = |totals: &BTreeMap<Month, Decimal>| -> Vec<Decimal> {
            months
                .iter()
                .map(|m| totals.get(m).copied().unwrap_or(Decimal::ZERO).round_dp(2))
                .collect()
        };
        let income_series = series(&income);
        let expense_series = series(&expense);
        // Spending trend tracks expenses month over month.
        let trend_series = expense_series.clone();

        MonthlySummary {
            category_totals: by_category
                .into_iter()
                .map(|(category, total)| CategoryTotal {
                    category: category.to_string(),
                    total: total.round_dp(2),
                })
                .collect(),
            months,
            income_series,
            expense_series,
            trend_series,
            budgets,
        }
    }
}

/// `100 * used / limit` to two decimals; a zero limit reports 0.
pub fn percent_used(used: Decimal, limit: Decimal) -> f64 {
    if limit == Decimal::ZERO {
        return 0.0;
    }
    (used * Decimal::ONE_HUNDRED / limit)
        .round_dp(2)
        .to_f64()
        .unwrap_or(0.0)
}

impl std::fmt::Display for MonthlySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Monthly Summary ===")?;
        for (i, month) in self.months.iter().enumerate() {
            writeln!(
                f,
                "  {}  income {:>10}  expense {:>10}",
                month, self.income_series[i], self.expense_series[i]
            )?;
        }

        if !self.category_totals.is_empty() {
            writeln!(f, "\n--- Spending by category ---")?;
            for c in &self.category_totals {
                writeln!(f, "  {:<16} {:>10}", c.category, c.total)?;
            }
        }

        if !self.budgets.is_empty() {
            writeln!(f, "\n--- Budgets ---")?;
            for b in &self.budgets {
                writeln!(
                    f,
                    "  {:<16} {:>10} / {:<10} {:.1}%",
                    b.category, b.used, b.limit, b.percent
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(id: u64, kind: TransactionKind, amount: Decimal, category: &str, y: i32, m: u32, d: u32) -> Transaction {
        Transaction {
            id,
            amount,
            kind,
            category: category.into(),
            note: String::new(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    fn budget(id: u64, category: &str, limit: Decimal, month: &str) -> Budget {
        Budget {
            id,
            category: category.into(),
            limit,
            month: month.parse().unwrap(),
        }
    }

    fn sample() -> Vec<Transaction> {
        use TransactionKind::*;
        vec![
            tx(1, Expense, dec!(12.50), "Food", 2023, 12, 30),
            tx(2, Income, dec!(2000), "Salary", 2024, 1, 1),
            tx(3, Expense, dec!(30.255), "Food", 2024, 1, 5),
            tx(4, Expense, dec!(900), "Rent", 2024, 1, 2),
            tx(5, Expense, dec!(19.745), "Food", 2024, 1, 20),
        ]
    }

    #[test]
    fn test_all_time_series() {
        let summary = MonthlySummary::compute(&sample(), &[], None);
        let months: Vec<String> = summary.months.iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01"]);
        assert_eq!(summary.income_series, vec![Decimal::ZERO, dec!(2000)]);
        assert_eq!(summary.expense_series, vec![dec!(12.50), dec!(950)]);
        assert_eq!(summary.trend_series, summary.expense_series);
        assert_eq!(summary.category_totals[0].category, "Food");
        assert_eq!(summary.category_totals[0].total, dec!(62.50));
        assert!(summary.budgets.is_empty());
    }

    #[test]
    fn test_single_month_with_budgets() {
        let budgets = [
            budget(1, "Food", dec!(200), "2024-01"),
            budget(2, "Travel", Decimal::ZERO, "2024-01"),
            budget(3, "Food", dec!(10), "2023-12"),
        ];
        let summary = MonthlySummary::compute(&sample(), &budgets, Some("2024-01".parse().unwrap()));

        assert_eq!(summary.months.len(), 1);
        assert_eq!(summary.budgets.len(), 2);
        let food = &summary.budgets[0];
        assert_eq!(food.used, dec!(50));
        assert_relative_eq!(food.percent, 25.0);
        let travel = &summary.budgets[1];
        assert_eq!(travel.used, Decimal::ZERO);
        assert_relative_eq!(travel.percent, 0.0);
    }

    #[test]
    fn test_percent_used_zero_limit() {
        assert_relative_eq!(percent_used(dec!(50), Decimal::ZERO), 0.0);
        assert_relative_eq!(percent_used(dec!(1), dec!(3)), 33.33);
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = MonthlySummary::compute(&sample(), &[], None);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["months"][1], "2024-01");
        assert_eq!(json["incomeSeries"][1].as_f64(), Some(2000.0));
        assert_eq!(json["categoryTotals"][1]["category"], "Rent");
        assert!(json.get("trendSeries").is_some());
    }
}
