use crate::error::Result;
use crate::payment::{LedgerEntry, PaymentLedger};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Append-only CSV file of refund rows, one [`LedgerEntry`] per line.
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> CsvLedger {
        CsvLedger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for result in reader.deserialize() {
            let entry: LedgerEntry = result?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl PaymentLedger for CsvLedger {
    fn record(&mut self, entry: LedgerEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let needs_header = std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(&entry)?;
        writer.flush()?;
        log::info!(
            "ledger entry {} amount {} appended to {}",
            entry.id,
            entry.amount,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::ExpressCheckoutSession;
    use crate::payment::{Payment, PaymentState};
    use chrono::Utc;

    fn temp_ledger() -> CsvLedger {
        let dir = std::env::temp_dir().join(format!("paypal-express-{}", uuid::Uuid::new_v4()));
        CsvLedger::new(dir.join("ledger.csv"))
    }

    #[test]
    fn missing_file_reads_as_empty() {
        assert!(temp_ledger().entries().unwrap().is_empty());
    }

    #[test]
    fn appends_with_single_header() {
        let mut ledger = temp_ledger();
        let payment = Payment::new(30.0, "USD", ExpressCheckoutSession::new("EC-1"));
        ledger
            .record(LedgerEntry::refund_of(&payment, 10.0, Some("R1".to_string()), Utc::now()))
            .unwrap();
        ledger
            .record(LedgerEntry::refund_of(&payment, 20.0, None, Utc::now()))
            .unwrap();

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].amount, -10.0);
        assert_eq!(entries[0].response_code.as_deref(), Some("R1"));
        assert_eq!(entries[1].amount, -20.0);
        assert_eq!(entries[1].response_code, None);
        assert_eq!(entries[1].state, PaymentState::Completed);

        let raw = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(raw.matches("source_payment_id").count(), 1);
        if let Some(dir) = ledger.path().parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
