use crate::domain::payout::PayoutId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PayoutError>;

#[derive(Error, Debug)]
pub enum PayoutError {
    #[error("payout #{0} not found")]
    NotFound(PayoutId),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("job queue unavailable: {0}")]
    QueueUnavailable(String),
    #[error("payment gateway error: {0}")]
    Gateway(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
