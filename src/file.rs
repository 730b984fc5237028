//! The whole ACH file: header, batches and file control, plus rendering.

use crate::amount::Amount;
use crate::batch::Batch;
use crate::error::{AchError, Result};
use crate::record::{FieldValues, Record};
use crate::schema::{
    self, filler_line, fit_width, DEFAULT_BLOCKING_FACTOR, ENTRY_HASH_MODULUS, FILE_CONTROL,
    FILE_HEADER,
};
use crate::transaction::TransactionEntry;
use log::{debug, warn};
use std::cell::OnceCell;
use std::fmt;

/// Batch control fields derived from the batch's contents.
const BATCH_COMPUTED_FIELDS: [&str; 8] = [
    "service_class_code",
    "entry_and_addenda_count",
    "entry_hash",
    "total_debit_amount",
    "total_credit_amount",
    "company_identification",
    "odfi_identification",
    "batch_number",
];

/// File control fields derived from the batch controls.
const FILE_COMPUTED_FIELDS: [&str; 6] = [
    "batch_count",
    "block_count",
    "entry_and_addenda_count",
    "entry_hash",
    "total_debit_amount",
    "total_credit_amount",
];

/// How rendered lines are joined and terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Separator placed between lines.
    pub line_break: String,
    /// Appended after the last line.
    pub end: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            line_break: "\n".to_string(),
            end: "\n".to_string(),
        }
    }
}

/// A control field whose recorded value differs from the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDiscrepancy {
    /// Position of the batch, or `None` for the file control.
    pub batch: Option<usize>,
    pub field: &'static str,
    pub recorded: String,
    pub computed: String,
}

impl fmt::Display for ControlDiscrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.batch {
            Some(index) => write!(f, "batch {} control", index + 1)?,
            None => write!(f, "file control")?,
        }
        write!(
            f,
            " {}: recorded {}, computed {}",
            self.field, self.recorded, self.computed
        )
    }
}

/// An ACH file: header record, ordered batches and the (cached) file control.
///
/// The file control is computed lazily from the batch controls and cached
/// until a batch is added, removed or mutably borrowed, or the header is
/// replaced.
#[derive(Debug, Clone)]
pub struct AchFile {
    header: Record,
    batches: Vec<Batch>,
    control: OnceCell<Record>,
}

impl AchFile {
    pub fn new(header: Record) -> Result<Self> {
        AchFile::with_batches(header, Vec::new())
    }

    pub fn with_batches(header: Record, batches: Vec<Batch>) -> Result<Self> {
        header.expect_schema(&FILE_HEADER)?;
        Ok(AchFile {
            header,
            batches,
            control: OnceCell::new(),
        })
    }

    pub fn header(&self) -> &Record {
        &self.header
    }

    /// Replaces the header; the block count may change with it.
    pub fn set_header(&mut self, header: Record) -> Result<()> {
        header.expect_schema(&FILE_HEADER)?;
        self.header = header;
        self.invalidate();
        Ok(())
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Mutable access to one batch; marks the file control stale.
    pub fn batch_mut(&mut self, index: usize) -> Option<&mut Batch> {
        if index < self.batches.len() {
            self.invalidate();
        }
        self.batches.get_mut(index)
    }

    pub fn add_batch(&mut self, batch: Batch) {
        self.batches.push(batch);
        self.invalidate();
    }

    pub fn remove_batch(&mut self, index: usize) -> Option<Batch> {
        if index >= self.batches.len() {
            return None;
        }
        let batch = self.batches.remove(index);
        self.invalidate();
        Some(batch)
    }

    /// Every transaction in file order.
    pub fn all_transactions(&self) -> impl Iterator<Item = &TransactionEntry> {
        self.batches.iter().flat_map(|batch| batch.transactions())
    }

    /// Lines per block from the header, falling back to the default for zero.
    pub fn blocking_factor(&self) -> usize {
        match self.header.int_value("blocking_factor") {
            Ok(0) | Err(_) => {
                warn!(
                    "Unusable blocking factor {:?}, using {}",
                    self.header.get("blocking_factor"),
                    DEFAULT_BLOCKING_FACTOR
                );
                DEFAULT_BLOCKING_FACTOR
            }
            Ok(factor) => factor as usize,
        }
    }

    /// Installs a control record to be trusted as-is until the next mutation.
    pub fn set_control(&mut self, control: Record) -> Result<()> {
        control.expect_schema(&FILE_CONTROL)?;
        self.control = OnceCell::from(control);
        Ok(())
    }

    /// The cached file control, computing it first if needed.
    pub fn control(&self) -> Result<&Record> {
        if let Some(control) = self.control.get() {
            return Ok(control);
        }
        let computed = self.compute_control()?;
        Ok(self.control.get_or_init(|| computed))
    }

    pub fn has_cached_control(&self) -> bool {
        self.control.get().is_some()
    }

    /// Computes a fresh file control from the batch controls without
    /// touching the file's own cache.
    pub fn compute_control(&self) -> Result<Record> {
        let mut entry_and_addenda_count = 0u64;
        let mut entry_hash = 0u64;
        let mut total_debit = Amount::ZERO;
        let mut total_credit = Amount::ZERO;
        for batch in &self.batches {
            let control = batch.control()?;
            entry_and_addenda_count += control.int_value("entry_and_addenda_count")?;
            entry_hash = (entry_hash + control.int_value("entry_hash")?) % ENTRY_HASH_MODULUS;
            total_debit += Amount::from_cents(control.int_value("total_debit_amount")?);
            total_credit += Amount::from_cents(control.int_value("total_credit_amount")?);
        }

        let batch_count = self.batches.len() as u64;
        let line_count = entry_and_addenda_count + 2 * batch_count + 2;
        let block_count = line_count.div_ceil(self.blocking_factor() as u64);
        debug!(
            "Computing file control: {} batches, {} lines, {} blocks",
            batch_count, line_count, block_count
        );

        let values = FieldValues::new()
            .with("batch_count", fit_width("batch_count", batch_count, 6)?)
            .with("block_count", fit_width("block_count", block_count, 6)?)
            .with(
                "entry_and_addenda_count",
                fit_width("entry_and_addenda_count", entry_and_addenda_count, 8)?,
            )
            .with("entry_hash", entry_hash)
            .with(
                "total_debit_amount",
                fit_width("total_debit_amount", total_debit.cents(), 12)?,
            )
            .with(
                "total_credit_amount",
                fit_width("total_credit_amount", total_credit.cents(), 12)?,
            );
        schema::file_control(values)
    }

    /// Compares each recorded control against a recomputation from its
    /// immediate children. Only derived fields are compared.
    pub fn control_discrepancies(&self) -> Result<Vec<ControlDiscrepancy>> {
        let mut found = Vec::new();
        for (index, batch) in self.batches.iter().enumerate() {
            compare_controls(
                Some(index),
                batch.control()?,
                &batch.compute_control()?,
                &BATCH_COMPUTED_FIELDS,
                &mut found,
            )?;
        }
        compare_controls(
            None,
            self.control()?,
            &self.compute_control()?,
            &FILE_COMPUTED_FIELDS,
            &mut found,
        )?;

        for discrepancy in &found {
            warn!("Control mismatch: {}", discrepancy);
        }
        Ok(found)
    }

    /// Record lines before block padding.
    pub fn line_count(&self) -> usize {
        self.batches.iter().map(Batch::line_count).sum::<usize>() + 2
    }

    /// Every physical line, padded with filler to a whole number of blocks.
    pub fn rendered_lines(&self) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(self.line_count());
        lines.push(self.header.render_line());
        for batch in &self.batches {
            lines.extend(batch.rendered_lines()?);
        }
        lines.push(self.control()?.render_line());

        let blocking_factor = self.blocking_factor();
        while lines.len() % blocking_factor != 0 {
            lines.push(filler_line());
        }
        Ok(lines)
    }

    /// Renders with `"\n"` between lines and after the last.
    pub fn render(&self) -> Result<String> {
        self.render_with(&RenderOptions::default())
    }

    pub fn render_with(&self, options: &RenderOptions) -> Result<String> {
        let mut text = self.rendered_lines()?.join(&options.line_break);
        text.push_str(&options.end);
        Ok(text)
    }

    /// Looks up a batch, reporting the batch count when out of range.
    pub fn batch(&self, index: usize) -> Result<&Batch> {
        self.batches.get(index).ok_or(AchError::BatchIndex {
            index,
            len: self.batches.len(),
        })
    }

    fn invalidate(&mut self) {
        if self.control.take().is_some() {
            debug!("File control invalidated");
        }
    }
}

fn compare_controls(
    batch: Option<usize>,
    recorded: &Record,
    computed: &Record,
    fields: &[&'static str],
    found: &mut Vec<ControlDiscrepancy>,
) -> Result<()> {
    for &field in fields {
        let recorded_value = recorded.value(field)?;
        let computed_value = computed.value(field)?;
        if recorded_value != computed_value {
            found.push(ControlDiscrepancy {
                batch,
                field,
                recorded: recorded_value.to_string(),
                computed: computed_value.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(blocking_factor: &str) -> Record {
        schema::file_header(FieldValues::from([
            ("destination_routing", "012345678"),
            ("origin_routing", "102345678"),
            ("destination_name", "YOUR BANK"),
            ("origin_name", "YOUR COMPANY"),
            ("file_creation_date", "140902"),
            ("blocking_factor", blocking_factor),
        ]))
        .unwrap()
    }

    fn batch(batch_number: usize, amounts: &[(&str, &str)]) -> Batch {
        let batch_header = schema::batch_header(FieldValues::from([
            ("company_name", "YOUR COMPANY"),
            ("company_identification", "1234567890"),
            ("company_entry_description", "PAYROLL"),
            ("odfi_identification", "10234567"),
            ("effective_entry_date", "140903"),
        ])
        .with("batch_number", batch_number))
        .unwrap();
        let transactions = amounts
            .iter()
            .enumerate()
            .map(|(i, (code, amount))| {
                let entry = schema::entry_detail(
                    FieldValues::from([
                        ("transaction_code", *code),
                        ("rdfi_routing", "123456789"),
                        ("rdfi_account_number", "00001"),
                        ("amount", *amount),
                        ("individual_name", "TEST"),
                        ("trace_odfi_identifier", "10234567"),
                    ])
                    .with("trace_sequence_number", i + 1),
                )
                .unwrap();
                TransactionEntry::new(entry).unwrap()
            })
            .collect();
        Batch::with_transactions(batch_header, transactions).unwrap()
    }

    #[test]
    fn test_single_credit_scenario() {
        let mut file = AchFile::new(header("10")).unwrap();
        file.add_batch(batch(1, &[("22", "300")]));

        let control = file.control().unwrap();
        assert_eq!(control.int_value("batch_count").unwrap(), 1);
        assert_eq!(control.int_value("entry_and_addenda_count").unwrap(), 1);
        assert_eq!(control.int_value("total_credit_amount").unwrap(), 300);
        assert_eq!(control.int_value("total_debit_amount").unwrap(), 0);
        assert_eq!(control.int_value("entry_hash").unwrap(), 12345678);
        assert_eq!(control.int_value("block_count").unwrap(), 1);
    }

    #[test]
    fn test_control_sums_batches() {
        let mut file = AchFile::new(header("10")).unwrap();
        file.add_batch(batch(1, &[("22", "100"), ("27", "50")]));
        file.add_batch(batch(2, &[("32", "7")]));

        let control = file.control().unwrap();
        assert_eq!(control.int_value("batch_count").unwrap(), 2);
        assert_eq!(control.int_value("entry_and_addenda_count").unwrap(), 3);
        assert_eq!(control.int_value("entry_hash").unwrap(), 3 * 12345678);
        assert_eq!(control.int_value("total_credit_amount").unwrap(), 107);
        assert_eq!(control.int_value("total_debit_amount").unwrap(), 50);
        assert_eq!(file.all_transactions().count(), 3);
    }

    #[test]
    fn test_cache_invalidated_by_batch_changes() {
        let mut file = AchFile::new(header("10")).unwrap();
        file.add_batch(batch(1, &[("22", "100")]));
        assert_eq!(file.control().unwrap().int_value("batch_count").unwrap(), 1);

        file.add_batch(batch(2, &[("22", "100")]));
        assert!(!file.has_cached_control());
        assert_eq!(file.control().unwrap().int_value("batch_count").unwrap(), 2);

        file.batch_mut(1).unwrap().remove_transaction(0).unwrap();
        assert_eq!(
            file.control().unwrap().int_value("total_credit_amount").unwrap(),
            100
        );

        file.remove_batch(0).unwrap();
        assert_eq!(file.control().unwrap().int_value("batch_count").unwrap(), 1);
        assert!(file.remove_batch(3).is_none());
    }

    #[test]
    fn test_blocking_factor_from_header() {
        let mut file = AchFile::new(header("2")).unwrap();
        file.add_batch(batch(1, &[("22", "1"), ("22", "2"), ("27", "3")]));
        assert_eq!(file.blocking_factor(), 2);
        // 3 entries + batch header/control + file header/control = 7 lines
        assert_eq!(file.control().unwrap().int_value("block_count").unwrap(), 4);

        file.set_header(header("10")).unwrap();
        assert_eq!(file.control().unwrap().int_value("block_count").unwrap(), 1);
    }

    #[test]
    fn test_zero_blocking_factor_falls_back() {
        let file = AchFile::new(header("0")).unwrap();
        assert_eq!(file.blocking_factor(), DEFAULT_BLOCKING_FACTOR);
    }

    #[test]
    fn test_render_pads_to_block_boundary() {
        let mut file = AchFile::new(header("10")).unwrap();
        file.add_batch(batch(1, &[("22", "300")]));
        let lines = file.rendered_lines().unwrap();
        assert_eq!(lines.len(), 10);
        assert_eq!(file.line_count(), 5);
        assert!(lines[5..].iter().all(|line| *line == filler_line()));
        assert!(lines.iter().all(|line| line.len() == schema::RECORD_SIZE));
    }

    #[test]
    fn test_exact_block_gets_no_filler() {
        let mut file = AchFile::new(header("5")).unwrap();
        file.add_batch(batch(1, &[("22", "300")]));
        let lines = file.rendered_lines().unwrap();
        assert_eq!(lines.len(), 5);
        assert!(lines[4].starts_with("9000001000001"));
    }

    #[test]
    fn test_render_with_options() {
        let file = AchFile::new(header("2")).unwrap();
        let text = file
            .render_with(&RenderOptions {
                line_break: "\r\n".to_string(),
                end: String::new(),
            })
            .unwrap();
        assert_eq!(text.matches("\r\n").count(), 1);
        assert!(!text.ends_with("\r\n"));
        assert!(file.render().unwrap().ends_with('\n'));
    }

    #[test]
    fn test_control_discrepancies_report_supplied_values() {
        let mut file = AchFile::new(header("10")).unwrap();
        file.add_batch(batch(1, &[("22", "300")]));
        let stale = file
            .compute_control()
            .unwrap()
            .with_value("total_credit_amount", "999")
            .unwrap();
        file.set_control(stale).unwrap();

        let found = file.control_discrepancies().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].batch, None);
        assert_eq!(found[0].field, "total_credit_amount");
        assert_eq!(found[0].recorded, "000000000999");
        assert_eq!(found[0].computed, "000000000300");
        assert_eq!(
            found[0].to_string(),
            "file control total_credit_amount: recorded 000000000999, computed 000000000300"
        );
    }

    #[test]
    fn test_control_overflow_is_reported() {
        let amounts = vec![("22", "9999999999"); 101];
        let mut file = AchFile::new(header("10")).unwrap();
        file.add_batch(batch(1, &amounts));
        assert!(matches!(
            file.control(),
            Err(AchError::ControlOverflow { field: "total_credit_amount", width: 12, .. })
        ));
    }

    #[test]
    fn test_batch_index_error() {
        let file = AchFile::new(header("10")).unwrap();
        assert!(matches!(
            file.batch(0),
            Err(AchError::BatchIndex { index: 0, len: 0 })
        ));
    }
}
