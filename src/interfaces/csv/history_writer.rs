use crate::domain::transaction::Transaction;
use crate::error::Result;
use std::io::Write;

/// Writes an account's transaction history as CSV, in the order given
/// (the log query already returns newest first).
pub struct HistoryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> HistoryWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        self.writer.write_record([
            "id",
            "sender_payment_id",
            "receiver_payment_id",
            "amount",
            "created_at",
        ])?;
        for tx in transactions {
            self.writer.write_record([
                tx.id.to_string().as_str(),
                tx.sender_payment_id.as_str(),
                tx.receiver_payment_id.as_str(),
                &tx.amount.value().to_string(),
                &tx.created_at.to_rfc3339(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
