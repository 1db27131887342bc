//! Export service - transaction log as CSV

use std::io::Write;
use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::AccountId;
use crate::ports::LedgerStore;

pub struct ExportService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> ExportService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Write the transaction log, or one account's part of it, as CSV
    ///
    /// A header row is always written. Returns the number of records.
    pub fn export_csv<W: Write>(&self, account: Option<AccountId>, writer: W) -> Result<usize> {
        let records = self.store.list_transactions(account)?;

        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
        if records.is_empty() {
            wtr.write_record(HEADER)?;
        }
        for record in &records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(records.len())
    }
}

/// Column names, matching the serialized field order of a record
const HEADER: [&str; 10] = [
    "id",
    "kind",
    "sender_id",
    "receiver_id",
    "amount",
    "sender_old_balance",
    "sender_new_balance",
    "receiver_old_balance",
    "receiver_new_balance",
    "created_at",
];
