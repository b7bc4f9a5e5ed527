use crate::domain::payout::{Currency, NewPayout};
use crate::error::{PayoutError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of the payout request CSV: `amount, currency, recipient, comment`.
#[derive(Debug, Deserialize)]
struct PayoutRow {
    amount: Decimal,
    currency: Currency,
    recipient: String,
    comment: Option<String>,
}

/// Reads payout requests from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding validated requests lazily so large files are processed in a
/// streaming fashion.
pub struct PayoutReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PayoutReader<R> {
    /// Creates a new `PayoutReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn payouts(self) -> impl Iterator<Item = Result<NewPayout>> {
        self.reader.into_deserialize().map(|result| {
            let row: PayoutRow = result.map_err(PayoutError::from)?;
            NewPayout::new(row.amount, row.currency, row.recipient, row.comment)
        })
    }
}
