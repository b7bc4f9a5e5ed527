use crate::domain::payout::Payout;
use crate::error::Result;
use std::io::Write;

/// Writes final payout record states as CSV, one row per record.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_payouts(mut self, payouts: Vec<Payout>) -> Result<()> {
        for payout in payouts {
            self.writer.serialize(payout)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payout::{Currency, NewPayout};
    use crate::domain::ports::PayoutStore;
    use crate::infrastructure::in_memory::InMemoryPayoutStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_writer_emits_header_and_rows() {
        let store = InMemoryPayoutStore::new();
        store
            .create(NewPayout::new(dec!(10.00), Currency::Usd, "acct-1001", None).unwrap())
            .await
            .unwrap();

        let mut buffer = Vec::new();
        let writer = ReportWriter::new(&mut buffer);
        writer
            .write_payouts(store.list().await.unwrap())
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,amount,currency,recipient_details,comment,status,deleted,created_at,updated_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,10.00,USD,acct-1001,"));
        assert!(row.contains("pending"));
        assert!(row.contains("false"));
    }
}
