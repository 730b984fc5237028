//! Incremental construction of an [`AchFile`] from named field values.
//!
//! The builder fills in the values that follow from what is already in the
//! file: the ODFI identification taken from the origin routing number, batch
//! numbers, trace sequence numbers, addenda indicators and addenda sequence
//! numbers. Anything supplied explicitly wins over the derived value.
//!
//! # Example
//!
//! ```
//! use nacha_ach::builder::{EntryInput, FailureMode, FileBuilder};
//! use nacha_ach::record::FieldValues;
//!
//! let mut builder = FileBuilder::new(FieldValues::from([
//!     ("destination_routing", "012345678"),
//!     ("origin_routing", "102345678"),
//!     ("destination_name", "YOUR BANK"),
//!     ("origin_name", "YOUR FINANCIAL INSTITUTION"),
//! ]))
//! .unwrap();
//! builder
//!     .add_batch(FieldValues::from([
//!         ("company_name", "YOUR COMPANY"),
//!         ("company_identification", "1234567890"),
//!         ("company_entry_description", "BONUS"),
//!     ]))
//!     .unwrap();
//! let failed = builder
//!     .add_entries(
//!         vec![EntryInput::new(FieldValues::from([
//!             ("transaction_code", "22"),
//!             ("rdfi_routing", "123456789"),
//!             ("rdfi_account_number", "65656565"),
//!             ("amount", "300"),
//!             ("individual_name", "JANEY TEST"),
//!         ]))],
//!         None,
//!         FailureMode::Raise,
//!     )
//!     .unwrap();
//! assert!(failed.is_empty());
//! assert!(builder.render().unwrap().lines().count() % 10 == 0);
//! ```

use crate::amount::Amount;
use crate::batch::Batch;
use crate::error::{AchError, Result};
use crate::field::FieldDefinition;
use crate::file::{AchFile, RenderOptions};
use crate::record::{FieldValues, Record, Schema};
use crate::schema::{self, ADDENDA, BATCH_HEADER, ENTRY_DETAIL, FILE_HEADER};
use crate::transaction::TransactionEntry;
use log::{debug, warn};

/// What [`FileBuilder::add_entries`] does when an entry fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Stop at the first failure and return its error.
    #[default]
    Raise,
    /// Keep going and hand back every failed input with its error.
    Collect,
}

/// Named values for one entry detail plus the addenda to attach to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryInput {
    pub fields: FieldValues,
    pub addendas: Vec<FieldValues>,
}

impl EntryInput {
    pub fn new(fields: FieldValues) -> Self {
        EntryInput {
            fields,
            addendas: Vec::new(),
        }
    }

    pub fn with_addenda(mut self, addenda: FieldValues) -> Self {
        self.addendas.push(addenda);
        self
    }

    /// Sets the amount field from a dollar amount.
    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.fields.insert("amount", amount.cents());
        self
    }
}

/// Builds an ACH file one batch and entry at a time.
#[derive(Debug, Clone)]
pub struct FileBuilder {
    file: AchFile,
    default_odfi_identification: String,
}

impl FileBuilder {
    /// Starts a file from file header settings.
    pub fn new(settings: FieldValues) -> Result<Self> {
        let file = AchFile::new(schema::file_header(settings)?)?;
        let default_odfi_identification = file
            .header()
            .value("origin_routing")?
            .trim_start()
            .chars()
            .take(8)
            .collect();
        Ok(FileBuilder {
            file,
            default_odfi_identification,
        })
    }

    pub fn file(&self) -> &AchFile {
        &self.file
    }

    pub fn into_file(self) -> AchFile {
        self.file
    }

    pub fn render(&self) -> Result<String> {
        self.file.render()
    }

    pub fn render_with(&self, options: &RenderOptions) -> Result<String> {
        self.file.render_with(options)
    }

    /// Appends a batch. `odfi_identification` and `batch_number` default to
    /// the origin routing prefix and the next batch position.
    pub fn add_batch(&mut self, mut settings: FieldValues) -> Result<&mut Self> {
        settings.insert_default("odfi_identification", &self.default_odfi_identification);
        settings.insert_default("batch_number", self.file.batches().len() + 1);
        let batch = Batch::new(schema::batch_header(settings)?)?;
        debug!(
            "Adding batch {} for {}",
            batch.header().value("batch_number")?,
            batch.header().value("company_name")?.trim_end()
        );
        self.file.add_batch(batch);
        Ok(self)
    }

    /// Adds one entry and its addenda to the batch at `batch_index`, or to the
    /// last batch when `None`.
    pub fn add_entry(&mut self, input: &EntryInput, batch_index: Option<usize>) -> Result<&mut Self> {
        let index = self.resolve_batch(batch_index)?;
        let transaction = self.build_transaction(input)?;
        debug!(
            "Adding entry {} to batch {}",
            transaction.trace_number()?,
            index + 1
        );
        if let Some(batch) = self.file.batch_mut(index) {
            batch.add_transaction(transaction);
        }
        Ok(self)
    }

    /// Adds each input in order. In [`FailureMode::Collect`] failures are
    /// returned paired with their inputs; otherwise the first one is raised.
    pub fn add_entries(
        &mut self,
        inputs: Vec<EntryInput>,
        batch_index: Option<usize>,
        mode: FailureMode,
    ) -> Result<Vec<(EntryInput, AchError)>> {
        let mut failed = Vec::new();
        for input in inputs {
            if let Err(err) = self.add_entry(&input, batch_index) {
                match mode {
                    FailureMode::Raise => return Err(err),
                    FailureMode::Collect => {
                        warn!("Skipping entry: {}", err);
                        failed.push((input, err));
                    }
                }
            }
        }
        if !failed.is_empty() {
            warn!("{} entries failed", failed.len());
        }
        Ok(failed)
    }

    /// File header settings accepted by [`FileBuilder::new`].
    pub fn file_setting_fields(only_required: bool) -> Vec<&'static FieldDefinition> {
        settable_fields(&FILE_HEADER, only_required, &[])
    }

    /// Batch header settings accepted by [`FileBuilder::add_batch`].
    pub fn batch_fields(only_required: bool) -> Vec<&'static FieldDefinition> {
        settable_fields(
            &BATCH_HEADER,
            only_required,
            &["odfi_identification", "batch_number"],
        )
    }

    /// Entry detail values accepted in [`EntryInput::fields`].
    pub fn entry_fields(only_required: bool) -> Vec<&'static FieldDefinition> {
        settable_fields(
            &ENTRY_DETAIL,
            only_required,
            &["trace_odfi_identifier", "trace_sequence_number"],
        )
    }

    /// Addenda values accepted in [`EntryInput::addendas`].
    pub fn addenda_fields(only_required: bool) -> Vec<&'static FieldDefinition> {
        settable_fields(&ADDENDA, only_required, &["entry_detail_sequence_number"])
    }

    fn resolve_batch(&self, batch_index: Option<usize>) -> Result<usize> {
        let len = self.file.batches().len();
        if len == 0 {
            return Err(AchError::NoBatchForTransaction);
        }
        let index = batch_index.unwrap_or(len - 1);
        if index >= len {
            return Err(AchError::BatchIndex { index, len });
        }
        Ok(index)
    }

    fn build_transaction(&self, input: &EntryInput) -> Result<TransactionEntry> {
        let mut fields = input.fields.clone();
        let indicator = if input.addendas.is_empty() { 0 } else { 1 };
        fields.insert_default("addenda_record_indicator", indicator);
        fields.insert_default("trace_odfi_identifier", &self.default_odfi_identification);
        fields.insert_default(
            "trace_sequence_number",
            self.file.all_transactions().count() + 1,
        );
        let entry = schema::entry_detail(fields)?;
        let entry_sequence = entry.value("trace_sequence_number")?;

        let addendas = input
            .addendas
            .iter()
            .enumerate()
            .map(|(i, values)| {
                let mut values = values.clone();
                values.insert_default("entry_detail_sequence_number", entry_sequence);
                values.insert_default("addenda_sequence_number", i + 1);
                schema::addenda(values)
            })
            .collect::<Result<Vec<Record>>>()?;

        TransactionEntry::with_addendas(entry, addendas)
    }
}

fn settable_fields(
    schema: &'static Schema,
    only_required: bool,
    derived: &[&str],
) -> Vec<&'static FieldDefinition> {
    schema
        .fields
        .iter()
        .filter(|def| !only_required || (def.needs_value() && !derived.contains(&def.name)))
        .collect()
}
