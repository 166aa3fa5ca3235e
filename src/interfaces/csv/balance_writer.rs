use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

/// Writes the balance report as CSV.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    /// Writes one row per account, sorted by payment id for stable output.
    pub fn write_accounts(&mut self, mut accounts: Vec<Account>) -> Result<()> {
        accounts.sort_by(|a, b| a.payment_id.cmp(&b.payment_id));
        self.writer
            .write_record(["payment_id", "display_name", "balance"])?;
        for account in accounts {
            self.writer.write_record([
                account.payment_id.as_str(),
                account.display_name.as_str(),
                &account.balance.0.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
