//! Transaction entries: one entry detail record plus its addenda.

use crate::amount::Amount;
use crate::codes::TransactionCode;
use crate::error::{AchError, Result};
use crate::record::Record;
use crate::schema::{ADDENDA, ENTRY_DETAIL};
use serde::Serialize;

/// An entry detail record and the addenda attached to it, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionEntry {
    #[serde(rename = "entry_detail")]
    entry: Record,
    addendas: Vec<Record>,
}

impl TransactionEntry {
    /// Creates an entry with no addenda.
    pub fn new(entry: Record) -> Result<Self> {
        TransactionEntry::with_addendas(entry, Vec::new())
    }

    pub fn with_addendas(entry: Record, addendas: Vec<Record>) -> Result<Self> {
        entry.expect_schema(&ENTRY_DETAIL)?;
        for addenda in &addendas {
            addenda.expect_schema(&ADDENDA)?;
        }
        Ok(TransactionEntry { entry, addendas })
    }

    pub fn entry(&self) -> &Record {
        &self.entry
    }

    pub fn addendas(&self) -> &[Record] {
        &self.addendas
    }

    pub fn add_addenda(&mut self, addenda: Record) -> Result<()> {
        addenda.expect_schema(&ADDENDA)?;
        self.addendas.push(addenda);
        Ok(())
    }

    /// Removes the addenda at `index`, if present.
    pub fn remove_addenda(&mut self, index: usize) -> Option<Record> {
        if index < self.addendas.len() {
            Some(self.addendas.remove(index))
        } else {
            None
        }
    }

    /// Physical lines this entry occupies: the entry itself plus each addenda.
    pub fn line_count(&self) -> usize {
        1 + self.addendas.len()
    }

    pub fn transaction_code(&self) -> Result<TransactionCode> {
        let code = self.entry.int_value("transaction_code")?;
        u8::try_from(code)
            .map(TransactionCode::from)
            .map_err(|_| AchError::InvalidNumber {
                field: "transaction_code".to_string(),
                value: code.to_string(),
            })
    }

    pub fn amount(&self) -> Result<Amount> {
        Ok(Amount::from_cents(self.entry.int_value("amount")?))
    }

    /// The amount when this entry debits the receiver, otherwise zero.
    pub fn debit_amount(&self) -> Result<Amount> {
        if self.transaction_code()?.is_debit() {
            self.amount()
        } else {
            Ok(Amount::ZERO)
        }
    }

    /// The amount when this entry credits the receiver, otherwise zero.
    pub fn credit_amount(&self) -> Result<Amount> {
        if self.transaction_code()?.is_credit() {
            self.amount()
        } else {
            Ok(Amount::ZERO)
        }
    }

    /// First 8 digits of the receiving routing number.
    pub fn entry_hash_contribution(&self) -> Result<u64> {
        let routing = self.entry.value("rdfi_routing")?;
        let prefix: String = routing.chars().take(8).collect();
        prefix.parse().map_err(|_| AchError::InvalidNumber {
            field: "rdfi_routing".to_string(),
            value: routing.to_string(),
        })
    }

    /// 15-digit ODFI identifier plus sequence number.
    pub fn trace_number(&self) -> Result<String> {
        Ok(format!(
            "{}{}",
            self.entry.value("trace_odfi_identifier")?,
            self.entry.value("trace_sequence_number")?
        ))
    }

    pub fn rendered_lines(&self) -> Vec<String> {
        std::iter::once(&self.entry)
            .chain(self.addendas.iter())
            .map(Record::render_line)
            .collect()
    }
}
