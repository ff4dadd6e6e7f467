//! Split resolution: one expense in, normalized per-member shares out.

use crate::core::expense::{Expense, SplitPolicy};
use crate::core::member::MemberId;
use log::debug;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Fraction of an expense owed by each member. Sums to one.
pub type Shares = BTreeMap<MemberId, Decimal>;

/// Why a stored split spec could not be used.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidSplitSpec {
    #[error("split spec is not valid JSON: {0}")]
    Syntax(String),
    #[error("split spec must be a JSON object")]
    NotAnObject,
    #[error("split spec is empty")]
    Empty,
    #[error("split spec key '{0}' is not a member id")]
    BadKey(String),
    #[error("weight for member {0} is not a number")]
    NonNumericWeight(String),
    #[error("weight for member {0} is negative")]
    NegativeWeight(MemberId),
    #[error("member {0} is not part of the group")]
    UnknownMember(MemberId),
    #[error("split weights are too large to add up")]
    WeightOverflow,
}

/// Validated ratio weights parsed from a stored split spec.
///
/// The stored spec is untrusted data: a JSON object whose keys are
/// string-encoded member ids and whose values are non-negative numbers.
/// Anything else is rejected with an [`InvalidSplitSpec`].
///
/// # Examples
///
/// ```
/// use group_settlement::settlement::split::SplitWeights;
/// use group_settlement::core::member::MemberId;
/// use rust_decimal_macros::dec;
///
/// let weights = SplitWeights::parse(r#"{"1": 1, "2": 3}"#).unwrap();
/// assert_eq!(weights.total(), dec!(4));
/// assert_eq!(weights.get(MemberId::new(2)), dec!(3));
///
/// assert!(SplitWeights::parse("not json").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SplitWeights(BTreeMap<MemberId, Decimal>);

impl SplitWeights {
    pub fn parse(raw: &str) -> Result<Self, InvalidSplitSpec> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| InvalidSplitSpec::Syntax(e.to_string()))?;
        let object = match value {
            Value::Object(object) => object,
            _ => return Err(InvalidSplitSpec::NotAnObject),
        };
        if object.is_empty() {
            return Err(InvalidSplitSpec::Empty);
        }

        let mut weights = BTreeMap::new();
        let mut total = Decimal::ZERO;
        for (key, value) in object {
            let member: MemberId = key
                .parse()
                .map_err(|_| InvalidSplitSpec::BadKey(key.clone()))?;
            let weight = match &value {
                Value::Number(n) => number_to_decimal(&n.to_string())
                    .ok_or_else(|| InvalidSplitSpec::NonNumericWeight(key.clone()))?,
                _ => return Err(InvalidSplitSpec::NonNumericWeight(key)),
            };
            if weight < Decimal::ZERO {
                return Err(InvalidSplitSpec::NegativeWeight(member));
            }
            if let Some(previous) = weights.insert(member, weight) {
                total -= previous;
            }
            total = total
                .checked_add(weight)
                .ok_or(InvalidSplitSpec::WeightOverflow)?;
        }
        Ok(Self(weights))
    }

    pub fn get(&self, member: MemberId) -> Decimal {
        self.0.get(&member).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of all weights. Cannot overflow: `parse` rejects weights whose
    /// running sum does not fit.
    pub fn total(&self) -> Decimal {
        self.0.values().sum()
    }

    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.0.keys().copied()
    }

    /// Reject weights naming anyone outside `members`.
    fn restrict_to(self, members: &[MemberId]) -> Result<Self, InvalidSplitSpec> {
        let unknown = self.members().find(|m| !members.contains(m));
        match unknown {
            Some(unknown) => Err(InvalidSplitSpec::UnknownMember(unknown)),
            None => Ok(self),
        }
    }
}

fn number_to_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Turns an expense's split policy and stored spec into shares.
pub struct SplitResolver;

impl SplitResolver {
    /// Resolve the shares of `expense` among `members`.
    ///
    /// Equal policy, or a ratio spec that is missing, malformed or has no
    /// positive weight, gives every member `1 / |members|`. A usable ratio spec
    /// gives `weight / total`, and members it does not mention owe nothing.
    ///
    /// Never fails. With no members the result is empty and nothing is divided.
    pub fn resolve(expense: &Expense, members: &[MemberId]) -> Shares {
        if members.is_empty() {
            return Shares::new();
        }
        if expense.split_policy() == SplitPolicy::Equal {
            return Self::equal(members);
        }
        let raw = match expense.split_spec() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                debug!("expense {}: ratio split without spec, splitting equally", expense.id());
                return Self::equal(members);
            }
        };

        let weights = match SplitWeights::parse(raw).and_then(|w| w.restrict_to(members)) {
            Ok(weights) => weights,
            Err(reason) => {
                debug!("expense {}: {}, splitting equally", expense.id(), reason);
                return Self::equal(members);
            }
        };

        let total = weights.total();
        if total <= Decimal::ZERO {
            debug!("expense {}: split weights sum to zero, splitting equally", expense.id());
            return Self::equal(members);
        }

        members
            .iter()
            .map(|m| (*m, weights.get(*m) / total))
            .collect()
    }

    /// Equal shares for every member.
    pub fn equal(members: &[MemberId]) -> Shares {
        if members.is_empty() {
            return Shares::new();
        }
        let share = Decimal::ONE / Decimal::from(members.len());
        members.iter().map(|m| (*m, share)).collect()
    }
}
