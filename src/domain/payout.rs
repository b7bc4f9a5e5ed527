use crate::error::PayoutError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of the free-form recipient details field.
pub const MAX_RECIPIENT_DETAILS_LEN: usize = 255;

/// Identifier of a payout record. Assigned by the store at creation, never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayoutId(pub i64);

impl fmt::Display for PayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A positive monetary amount.
///
/// Wrapper around `rust_decimal::Decimal` enforcing the `amount > 0`
/// invariant at construction. The processing pipeline never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PayoutError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PayoutError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PayoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported payout currencies, serialized as ISO 4217 codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Rub,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Rub => "RUB",
        };
        write!(f, "{code}")
    }
}

/// Processing state of a payout record.
///
/// The pipeline only ever moves a record along `Pending -> Processing ->
/// Completed | Failed`; the two final states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PayoutStatus::Completed | PayoutStatus::Failed)
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// A persisted payout request.
///
/// `status` is written only by the processing pipeline and `deleted` only by
/// the soft-delete operation; both writers go through the store's exclusive
/// row lease. `deleted` is monotonic: once set it never resets, and the
/// record is never physically removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub amount: Amount,
    pub currency: Currency,
    pub recipient_details: String,
    pub comment: Option<String>,
    pub status: PayoutStatus,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a payout record.
#[derive(Debug, Clone)]
pub struct NewPayout {
    pub amount: Amount,
    pub currency: Currency,
    pub recipient_details: String,
    pub comment: Option<String>,
}

impl NewPayout {
    pub fn new(
        amount: Decimal,
        currency: Currency,
        recipient_details: impl Into<String>,
        comment: Option<String>,
    ) -> Result<Self, PayoutError> {
        Ok(Self {
            amount: Amount::new(amount)?,
            currency,
            recipient_details: validate_recipient_details(recipient_details.into())?,
            comment,
        })
    }
}

fn validate_recipient_details(details: String) -> Result<String, PayoutError> {
    if details.trim().is_empty() {
        return Err(PayoutError::Validation(
            "recipient details must not be empty".to_string(),
        ));
    }
    if details.chars().count() > MAX_RECIPIENT_DETAILS_LEN {
        return Err(PayoutError::Validation(format!(
            "recipient details exceed {MAX_RECIPIENT_DETAILS_LEN} characters"
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || c.is_whitespace() || "-_,.:;@".contains(c);
    if !details.chars().all(allowed) {
        return Err(PayoutError::Validation(
            "recipient details contain unsupported characters".to_string(),
        ));
    }
    Ok(details)
}

/// Restricted partial update: only the status and comment fields are
/// writable from the outside.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PayoutPatch {
    pub status: Option<PayoutStatus>,
    pub comment: Option<String>,
}
