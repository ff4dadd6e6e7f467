use crate::core::member::MemberId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a shared expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(u64);

impl ExpenseId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an expense's amount is divided among the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Every member owes the same fraction.
    #[default]
    Equal,
    /// Members owe in proportion to the weights in the stored split spec.
    Ratio,
}

impl SplitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitPolicy::Equal => "equal",
            SplitPolicy::Ratio => "ratio",
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(SplitPolicy::Equal),
            "ratio" => Ok(SplitPolicy::Ratio),
            other => Err(format!("unknown split policy '{}'", other)),
        }
    }
}

/// A shared expense paid by one member on behalf of the group.
///
/// The split spec is kept exactly as it was stored: a JSON object mapping
/// string-encoded member ids to weights, e.g. `{"1": 1, "2": 3}`. It is only
/// interpreted when the policy is [`SplitPolicy::Ratio`], and only through
/// [`SplitWeights::parse`](crate::settlement::split::SplitWeights::parse).
///
/// # Examples
///
/// ```
/// use group_settlement::core::expense::{Expense, ExpenseId, SplitPolicy};
/// use group_settlement::core::member::MemberId;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let dinner = Expense::new(
///     ExpenseId::new(1),
///     "Dinner",
///     dec!(100),
///     MemberId::new(1),
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
/// )
/// .with_ratio(r#"{"1": 1, "2": 3}"#);
///
/// assert_eq!(dinner.split_policy(), SplitPolicy::Ratio);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    id: ExpenseId,
    description: String,
    amount: Decimal,
    payer: MemberId,
    date: NaiveDate,
    #[serde(default)]
    split_policy: SplitPolicy,
    #[serde(default)]
    split_spec: Option<String>,
}

impl Expense {
    /// Create an equally split expense.
    pub fn new(
        id: ExpenseId,
        description: impl Into<String>,
        amount: Decimal,
        payer: MemberId,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            amount,
            payer,
            date,
            split_policy: SplitPolicy::Equal,
            split_spec: None,
        }
    }

    /// Switch to a ratio split using the given raw spec.
    pub fn with_ratio(mut self, spec: impl Into<String>) -> Self {
        self.split_policy = SplitPolicy::Ratio;
        self.split_spec = Some(spec.into());
        self
    }

    pub fn with_split(mut self, policy: SplitPolicy, spec: Option<String>) -> Self {
        self.split_policy = policy;
        self.split_spec = spec;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn payer(&self) -> MemberId {
        self.payer
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn split_policy(&self) -> SplitPolicy {
        self.split_policy
    }

    pub fn split_spec(&self) -> Option<&str> {
        self.split_spec.as_deref()
    }
}

/// Input for recording an expense; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub payer: MemberId,
    /// Defaults to today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub split_policy: SplitPolicy,
    #[serde(default)]
    pub split_spec: Option<String>,
}

impl NewExpense {
    pub fn equal(description: impl Into<String>, amount: Decimal, payer: MemberId) -> Self {
        Self {
            description: description.into(),
            amount,
            payer,
            date: None,
            split_policy: SplitPolicy::Equal,
            split_spec: None,
        }
    }

    pub fn ratio(
        description: impl Into<String>,
        amount: Decimal,
        payer: MemberId,
        spec: impl Into<String>,
    ) -> Self {
        Self {
            split_policy: SplitPolicy::Ratio,
            split_spec: Some(spec.into()),
            ..Self::equal(description, amount, payer)
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}
