use crate::core::member::{GroupId, MemberId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the group store and the settlement service.
///
/// Bad data inside an expense (unknown payer, malformed split) is not an
/// error: those rows are skipped or fall back to an equal split.
#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("group {0} not found")]
    GroupNotFound(GroupId),
    #[error("member {member} is not part of group {group}")]
    MemberNotFound { group: GroupId, member: MemberId },
    #[error("expense amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("balance of member {0} is out of range")]
    BalanceOverflow(MemberId),
}
