//! Inspection views of a parsed or built file: a nested JSON document and a
//! flat CSV listing of entries. Neither is used by the codec itself.

use crate::amount::Amount;
use crate::batch::Batch;
use crate::error::Result;
use crate::file::AchFile;
use crate::record::Record;
use crate::transaction::TransactionEntry;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct FileView<'a> {
    file_header: &'a Record,
    batches: Vec<BatchView<'a>>,
    file_control: &'a Record,
}

#[derive(Serialize)]
struct BatchView<'a> {
    batch_header: &'a Record,
    transactions: &'a [TransactionEntry],
    batch_control: &'a Record,
}

impl<'a> BatchView<'a> {
    fn new(batch: &'a Batch) -> Result<Self> {
        Ok(BatchView {
            batch_header: batch.header(),
            transactions: batch.transactions(),
            batch_control: batch.control()?,
        })
    }
}

/// One CSV row per transaction.
#[derive(Debug, Serialize)]
struct EntryRow<'a> {
    batch_number: u64,
    trace_number: String,
    transaction_code: String,
    direction: &'static str,
    rdfi_routing: &'a str,
    rdfi_account_number: &'a str,
    individual_name: &'a str,
    amount: Amount,
    addenda_count: usize,
}

impl AchFile {
    fn view(&self) -> Result<FileView<'_>> {
        Ok(FileView {
            file_header: self.header(),
            batches: self
                .batches()
                .iter()
                .map(BatchView::new)
                .collect::<Result<_>>()?,
            file_control: self.control()?,
        })
    }

    /// Every record's field values, nested as file header, batches (each with
    /// header, transactions and control) and file control.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.view()?)?)
    }

    /// Pretty-printed JSON; fields keep their layout order.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.view()?)?)
    }
}

/// Writes one CSV row per transaction with amounts in dollars.
pub fn write_entries_csv<W: Write>(file: &AchFile, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for batch in file.batches() {
        let batch_number = batch.batch_number()?;
        for transaction in batch.transactions() {
            let code = transaction.transaction_code()?;
            let entry = transaction.entry();
            csv_writer.serialize(EntryRow {
                batch_number,
                trace_number: transaction.trace_number()?,
                transaction_code: code.to_string(),
                direction: if code.is_debit() { "debit" } else { "credit" },
                rdfi_routing: entry.value("rdfi_routing")?,
                rdfi_account_number: entry.value("rdfi_account_number")?.trim(),
                individual_name: entry.value("individual_name")?.trim(),
                amount: transaction.amount()?,
                addenda_count: transaction.addendas().len(),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const SAMPLE: &str = include_str!("../tests/data/sample.ach");

    #[test]
    fn test_json_nests_records_in_schema_order() {
        let file = parse(SAMPLE).unwrap();
        let json = file.to_json_value().unwrap();

        assert_eq!(json["file_header"]["origin_name"], "YOUR COMPANY                   ");
        let batch = &json["batches"][0];
        assert_eq!(batch["batch_header"]["batch_number"], "0000001");
        assert_eq!(
            batch["transactions"][0]["addendas"][0]["addenda_sequence_number"],
            "0001"
        );
        assert_eq!(batch["transactions"][2]["entry_detail"]["amount"], "0000001213");
        assert_eq!(batch["batch_control"]["entry_hash"], "0037014587");
        assert_eq!(json["file_control"]["batch_count"], "000001");
    }

    #[test]
    fn test_json_text_keeps_field_order() {
        let text = parse(SAMPLE).unwrap().to_json().unwrap();
        let record_type = text.find("\"record_type_code\"").unwrap();
        let priority = text.find("\"priority_code\"").unwrap();
        assert!(record_type < priority);
    }

    #[test]
    fn test_entries_csv() {
        let file = parse(SAMPLE).unwrap();
        let mut out = Vec::new();
        write_entries_csv(&file, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(
            rows[0],
            "batch_number,trace_number,transaction_code,direction,rdfi_routing,rdfi_account_number,individual_name,amount,addenda_count"
        );
        assert_eq!(
            rows[1],
            "1,123456780000001,22,credit,123456780,11232132,ALICE WANDERDUST,10.00,1"
        );
        assert_eq!(
            rows[2],
            "1,123456780000002,27,debit,123456780,234234234,BILLY HOLIDAY,150.00,0"
        );
        assert_eq!(rows.len(), 4);
    }
}
