//! Parsing raw ACH text back into the aggregate tree.
//!
//! Parsing happens in two passes. [`Parser::parse_records`] splits the text
//! into physical lines and decodes each into a typed [`Record`];
//! [`Parser::assemble`] walks the records and rebuilds the
//! file/batch/transaction tree.
//!
//! By default the control records found in the input are attached verbatim,
//! so a file whose totals were altered upstream still renders byte for byte.
//! Set [`ParseOptions::recompute_controls`] to discard them and let the tree
//! compute its own.

use crate::batch::Batch;
use crate::error::{AchError, Result};
use crate::file::AchFile;
use crate::record::Record;
use crate::schema::{
    filler_line, schema_for_code, ADDENDA_CODE, BATCH_CONTROL_CODE, BATCH_HEADER_CODE,
    ENTRY_DETAIL_CODE, FILE_CONTROL_CODE, FILE_HEADER_CODE,
};
use crate::transaction::TransactionEntry;
use log::{debug, trace};

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Token separating physical lines.
    pub line_break: String,
    /// Recompute batch and file controls instead of keeping the decoded ones.
    pub recompute_controls: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            line_break: "\n".to_string(),
            recompute_controls: false,
        }
    }
}

/// Decoded record tagged with its 1-based physical line number.
pub type NumberedRecord = (usize, Record);

/// Text to tree parser.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Parser { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses `text` into a file.
    pub fn parse(&self, text: &str) -> Result<AchFile> {
        let records = self.parse_records(text)?;
        self.assemble(records)
    }

    /// Decodes every non-blank, non-filler line. Failures carry their line
    /// number.
    pub fn parse_records(&self, text: &str) -> Result<Vec<NumberedRecord>> {
        let filler = filler_line();
        let mut records = Vec::new();
        for (index, line) in text.split(self.options.line_break.as_str()).enumerate() {
            let line_number = index + 1;
            if line.trim().is_empty() || line == filler {
                trace!("Line {}: skipped", line_number);
                continue;
            }
            let record = decode_line(line).map_err(|e| e.at_line(line_number))?;
            records.push((line_number, record));
        }
        debug!("Decoded {} records", records.len());
        Ok(records)
    }

    /// Rebuilds the tree from decoded records. The first record must be the
    /// file header.
    pub fn assemble(&self, records: Vec<NumberedRecord>) -> Result<AchFile> {
        let mut records = records.into_iter();
        let (header_line, header) = records.next().ok_or(AchError::EmptyFile)?;
        if header.type_code() != FILE_HEADER_CODE {
            return Err(AchError::UnexpectedRecord {
                found: header.schema().name,
                context: "where the file header belongs",
            }
            .at_line(header_line));
        }

        let mut assembly = Assembly {
            file: AchFile::new(header)?,
            open_batch: None,
            pending: None,
            file_control: None,
            recompute: self.options.recompute_controls,
        };
        for (line, record) in records {
            assembly.push(record).map_err(|e| e.at_line(line))?;
        }
        assembly.finish()
    }
}

/// Parses `text` with default options.
pub fn parse(text: &str) -> Result<AchFile> {
    Parser::new().parse(text)
}

fn decode_line(line: &str) -> Result<Record> {
    let code = line.chars().next().ok_or(AchError::EmptyFile)?;
    let schema = schema_for_code(code).ok_or(AchError::UnknownRecordType { code })?;
    Record::from_line(schema, line)
}

/// Walk state while reassembling the tree.
struct Assembly {
    file: AchFile,
    open_batch: Option<Batch>,
    pending: Option<TransactionEntry>,
    file_control: Option<Record>,
    recompute: bool,
}

impl Assembly {
    fn push(&mut self, record: Record) -> Result<()> {
        if self.file_control.is_some() {
            return Err(unexpected(&record, "after the file control"));
        }

        match record.type_code() {
            BATCH_HEADER_CODE => {
                if self.open_batch.is_some() {
                    return Err(unexpected(&record, "before the open batch was closed"));
                }
                self.open_batch = Some(Batch::new(record)?);
            }
            ENTRY_DETAIL_CODE => {
                let Some(batch) = self.open_batch.as_mut() else {
                    return Err(unexpected(&record, "outside a batch"));
                };
                if let Some(transaction) = self.pending.take() {
                    batch.add_transaction(transaction);
                }
                self.pending = Some(TransactionEntry::new(record)?);
            }
            ADDENDA_CODE => {
                let Some(transaction) = self.pending.as_mut() else {
                    return Err(unexpected(&record, "without a preceding entry detail"));
                };
                transaction.add_addenda(record)?;
            }
            BATCH_CONTROL_CODE => {
                let Some(mut batch) = self.open_batch.take() else {
                    return Err(unexpected(&record, "outside a batch"));
                };
                if let Some(transaction) = self.pending.take() {
                    batch.add_transaction(transaction);
                }
                if !self.recompute {
                    batch.set_control(record)?;
                }
                debug!(
                    "Assembled batch {} with {} transactions",
                    batch.header().value("batch_number")?,
                    batch.transactions().len()
                );
                self.file.add_batch(batch);
            }
            FILE_CONTROL_CODE => {
                if self.open_batch.is_some() {
                    return Err(unexpected(&record, "before the open batch was closed"));
                }
                self.file_control = Some(record);
            }
            _ => return Err(unexpected(&record, "after the file header")),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<AchFile> {
        if let Some(batch) = &self.open_batch {
            return Err(AchError::UnexpectedRecord {
                found: batch.header().schema().name,
                context: "left open at the end of the file",
            });
        }
        match self.file_control.take() {
            Some(_) if self.recompute => {}
            Some(control) => self.file.set_control(control)?,
            None if self.recompute => {}
            None => return Err(AchError::MissingFileControl),
        }
        debug!("Assembled file with {} batches", self.file.batches().len());
        Ok(self.file)
    }
}

fn unexpected(record: &Record, context: &'static str) -> AchError {
    AchError::UnexpectedRecord {
        found: record.schema().name,
        context,
    }
}
