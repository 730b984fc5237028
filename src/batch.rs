//! Batches: a header, ordered transaction entries and a control record.
//!
//! # Control record cache
//!
//! The batch control record is computed on first read and cached. Every
//! mutation that can change a total (adding, removing or mutably borrowing a
//! transaction, replacing the header) clears the cache so the next read
//! recomputes. A control record supplied with [`Batch::set_control`], as the
//! parser does, is returned verbatim until such a mutation happens.

use crate::amount::Amount;
use crate::codes::{ServiceClassCode, StandardEntryClass};
use crate::error::{AchError, FieldError, Result};
use crate::record::{FieldValues, Record};
use crate::schema::{self, fit_width, BATCH_CONTROL, BATCH_HEADER, ENTRY_HASH_MODULUS};
use crate::transaction::TransactionEntry;
use log::debug;
use std::cell::OnceCell;

/// A batch header, its transaction entries and its (cached) control record.
#[derive(Debug, Clone)]
pub struct Batch {
    header: Record,
    transactions: Vec<TransactionEntry>,
    control: OnceCell<Record>,
}

impl Batch {
    /// Creates an empty batch.
    pub fn new(header: Record) -> Result<Self> {
        Batch::with_transactions(header, Vec::new())
    }

    pub fn with_transactions(header: Record, transactions: Vec<TransactionEntry>) -> Result<Self> {
        header.expect_schema(&BATCH_HEADER)?;
        Ok(Batch {
            header,
            transactions,
            control: OnceCell::new(),
        })
    }

    pub fn header(&self) -> &Record {
        &self.header
    }

    /// Replaces the header and invalidates the control record.
    pub fn set_header(&mut self, header: Record) -> Result<()> {
        header.expect_schema(&BATCH_HEADER)?;
        self.header = header;
        self.invalidate();
        Ok(())
    }

    pub fn transactions(&self) -> &[TransactionEntry] {
        &self.transactions
    }

    /// Mutable access to one transaction. Invalidates the control record
    /// whenever the transaction exists, since addenda may change.
    pub fn transaction_mut(&mut self, index: usize) -> Option<&mut TransactionEntry> {
        if index < self.transactions.len() {
            self.invalidate();
        }
        self.transactions.get_mut(index)
    }

    pub fn add_transaction(&mut self, transaction: TransactionEntry) {
        self.transactions.push(transaction);
        self.invalidate();
    }

    pub fn remove_transaction(&mut self, index: usize) -> Option<TransactionEntry> {
        if index >= self.transactions.len() {
            return None;
        }
        let transaction = self.transactions.remove(index);
        self.invalidate();
        Some(transaction)
    }

    /// Installs a control record to be trusted as-is until the next mutation.
    pub fn set_control(&mut self, control: Record) -> Result<()> {
        control.expect_schema(&BATCH_CONTROL)?;
        self.control = OnceCell::from(control);
        Ok(())
    }

    /// The cached control record, computing it first if needed.
    pub fn control(&self) -> Result<&Record> {
        if let Some(control) = self.control.get() {
            return Ok(control);
        }
        let computed = self.compute_control()?;
        Ok(self.control.get_or_init(|| computed))
    }

    /// Whether a control record (computed or supplied) is currently cached.
    pub fn has_cached_control(&self) -> bool {
        self.control.get().is_some()
    }

    /// Computes a fresh control record from the current contents without
    /// touching the cache.
    pub fn compute_control(&self) -> Result<Record> {
        debug!(
            "Computing batch control for batch {} ({} transactions)",
            self.header.value("batch_number")?,
            self.transactions.len()
        );
        let values = FieldValues::new()
            .with("service_class_code", self.header.value("service_class_code")?)
            .with(
                "entry_and_addenda_count",
                fit_width("entry_and_addenda_count", self.entry_and_addenda_count() as u64, 6)?,
            )
            .with("entry_hash", self.entry_hash()?)
            .with(
                "total_debit_amount",
                fit_width("total_debit_amount", self.total_debit()?.cents(), 12)?,
            )
            .with(
                "total_credit_amount",
                fit_width("total_credit_amount", self.total_credit()?.cents(), 12)?,
            )
            .with("company_identification", self.header.value("company_identification")?)
            .with("odfi_identification", self.header.value("odfi_identification")?)
            .with("batch_number", self.header.value("batch_number")?);
        schema::batch_control(values)
    }

    /// Entry detail plus addenda lines across all transactions.
    pub fn entry_and_addenda_count(&self) -> usize {
        self.transactions.iter().map(TransactionEntry::line_count).sum()
    }

    /// Sum of routing prefixes, keeping the lowest 10 digits.
    pub fn entry_hash(&self) -> Result<u64> {
        let mut hash = 0u64;
        for transaction in &self.transactions {
            hash = (hash + transaction.entry_hash_contribution()?) % ENTRY_HASH_MODULUS;
        }
        Ok(hash)
    }

    pub fn total_debit(&self) -> Result<Amount> {
        self.transactions.iter().map(TransactionEntry::debit_amount).sum()
    }

    pub fn total_credit(&self) -> Result<Amount> {
        self.transactions.iter().map(TransactionEntry::credit_amount).sum()
    }

    /// Physical lines including the header and control records.
    pub fn line_count(&self) -> usize {
        self.entry_and_addenda_count() + 2
    }

    pub fn batch_number(&self) -> Result<u64> {
        self.header.int_value("batch_number")
    }

    pub fn standard_entry_class(&self) -> Result<StandardEntryClass> {
        let raw = self.header.value("standard_entry_class_code")?;
        raw.parse().map_err(|_| AchError::Field {
            field: "standard_entry_class_code",
            source: FieldError::ValueMismatch {
                value: raw.to_string(),
                expected: "standard entry class code".to_string(),
            },
        })
    }

    /// Typed service class; `None` for codes outside 200/220/225.
    pub fn service_class_code(&self) -> Result<Option<ServiceClassCode>> {
        let code = self.header.int_value("service_class_code")?;
        Ok(u16::try_from(code).ok().and_then(ServiceClassCode::from_code))
    }

    /// Header, each transaction's lines, then the control record.
    pub fn rendered_lines(&self) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(self.line_count());
        lines.push(self.header.render_line());
        for transaction in &self.transactions {
            lines.extend(transaction.rendered_lines());
        }
        lines.push(self.control()?.render_line());
        Ok(lines)
    }

    fn invalidate(&mut self) {
        if self.control.take().is_some() {
            debug!("Batch control invalidated");
        }
    }
}
