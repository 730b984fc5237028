//! The six NACHA record layouts and their defaults.
//!
//! Every layout is exactly [`RECORD_SIZE`] characters wide; this is checked
//! at compile time for the built-in layouts.

use crate::error::{AchError, Result};
use crate::field::{FieldDefinition, FieldType, AUTO_NOW, AUTO_TOMORROW};
use crate::record::{fields_width, FieldValues, Record, Schema};

/// Width of every physical line.
pub const RECORD_SIZE: usize = 94;

/// Lines per block unless the file header says otherwise.
pub const DEFAULT_BLOCKING_FACTOR: usize = 10;

/// Character that fills block-padding lines.
pub const FILLER_CHAR: char = '9';

pub const FILE_HEADER_CODE: char = '1';
pub const BATCH_HEADER_CODE: char = '5';
pub const ENTRY_DETAIL_CODE: char = '6';
pub const ADDENDA_CODE: char = '7';
pub const BATCH_CONTROL_CODE: char = '8';
pub const FILE_CONTROL_CODE: char = '9';

/// Entry hashes keep only their lowest 10 digits.
pub const ENTRY_HASH_MODULUS: u64 = 10_000_000_000;

/// Convenience key on entry details, split into the two trace fields.
pub const TRACE_NUMBER: &str = "trace_number";

use FieldType::{AlphaNumeric, BlankPaddedRoutingNumber, Date, Integer, Time};

const FILE_HEADER_FIELDS: [FieldDefinition; 13] = [
    FieldDefinition::new("record_type_code", "Record Type Code", Integer, 1).with_default("1"),
    FieldDefinition::new("priority_code", "Priority Code", Integer, 2).with_default("1"),
    FieldDefinition::new("destination_routing", "Immediate Destination Routing", BlankPaddedRoutingNumber, 10)
        .with_auto_correct(true),
    FieldDefinition::new("origin_routing", "Immediate Origin Routing", BlankPaddedRoutingNumber, 10)
        .with_auto_correct(true),
    FieldDefinition::new("file_creation_date", "File Creation Date", Date, 6)
        .with_default(AUTO_NOW)
        .with_auto_correct(true),
    FieldDefinition::new("file_creation_time", "File Creation Time", Time, 4).optional(),
    FieldDefinition::new("file_id_modifier", "File ID Modifier", AlphaNumeric, 1).with_default("A"),
    FieldDefinition::new("record_size", "Record Size", Integer, 3).with_default("094"),
    FieldDefinition::new("blocking_factor", "Blocking Factor", Integer, 2).with_default("10"),
    FieldDefinition::new("format_code", "Format Code", Integer, 1).with_default("1"),
    FieldDefinition::new("destination_name", "Destination Financial Institution Name", AlphaNumeric, 23),
    FieldDefinition::new("origin_name", "Origin Financial Institution Name", AlphaNumeric, 23),
    FieldDefinition::new("reference_code", "Reference Code", AlphaNumeric, 8).with_default(""),
];

const BATCH_HEADER_FIELDS: [FieldDefinition; 13] = [
    FieldDefinition::new("record_type_code", "Record Type Code", Integer, 1).with_default("5"),
    FieldDefinition::new("service_class_code", "Service Class Code", Integer, 3).with_default("200"),
    FieldDefinition::new("company_name", "Company Name", AlphaNumeric, 16),
    FieldDefinition::new("company_discretionary_data", "Company Discretionary Data", AlphaNumeric, 20).optional(),
    FieldDefinition::new("company_identification", "Company Identification Number", Integer, 10),
    FieldDefinition::new("standard_entry_class_code", "Standard Entry Class Code", AlphaNumeric, 3).with_default("PPD"),
    FieldDefinition::new("company_entry_description", "Company Entry Description", AlphaNumeric, 10),
    FieldDefinition::new("company_descriptive_date", "Company Descriptive Date", Date, 6).optional(),
    FieldDefinition::new("effective_entry_date", "Effective Entry Date", Date, 6)
        .with_default(AUTO_TOMORROW)
        .with_auto_correct(true),
    FieldDefinition::new("settlement_date", "Settlement Date", AlphaNumeric, 3).optional(),
    FieldDefinition::new("originator_status_code", "Originator Status Code", Integer, 1).with_default("1"),
    FieldDefinition::new("odfi_identification", "ODFI Identification", Integer, 8),
    FieldDefinition::new("batch_number", "Batch Number", Integer, 7),
];

const ENTRY_DETAIL_FIELDS: [FieldDefinition; 11] = [
    FieldDefinition::new("record_type_code", "Record Type Code", Integer, 1).with_default("6"),
    FieldDefinition::new("transaction_code", "Transaction Code", Integer, 2),
    FieldDefinition::new("rdfi_routing", "RDFI Routing Number", Integer, 9),
    FieldDefinition::new("rdfi_account_number", "RDFI Account Number", AlphaNumeric, 17),
    FieldDefinition::new("amount", "Amount In Cents", Integer, 10),
    FieldDefinition::new("individual_identification_number", "Individual Identification Number", AlphaNumeric, 15)
        .optional(),
    FieldDefinition::new("individual_name", "Individual Name", AlphaNumeric, 22),
    FieldDefinition::new("discretionary_data", "Discretionary Data", AlphaNumeric, 2).optional(),
    FieldDefinition::new("addenda_record_indicator", "Addenda Record Indicator", Integer, 1).with_default("1"),
    FieldDefinition::new("trace_odfi_identifier", "Trace Number: ODFI Identifier", Integer, 8),
    FieldDefinition::new("trace_sequence_number", "Trace Number: Sequence Number", Integer, 7),
];

const ADDENDA_FIELDS: [FieldDefinition; 5] = [
    FieldDefinition::new("record_type_code", "Record Type Code", Integer, 1).with_default("7"),
    FieldDefinition::new("addenda_type_code", "Addenda Type Code", Integer, 2).with_default("05"),
    FieldDefinition::new("payment_related_information", "Payment Related Information", AlphaNumeric, 80).optional(),
    FieldDefinition::new("addenda_sequence_number", "Addenda Sequence Number", Integer, 4).with_default("1"),
    FieldDefinition::new("entry_detail_sequence_number", "Entry Detail Sequence Number", Integer, 7),
];

const BATCH_CONTROL_FIELDS: [FieldDefinition; 11] = [
    FieldDefinition::new("record_type_code", "Record Type Code", Integer, 1).with_default("8"),
    FieldDefinition::new("service_class_code", "Service Class Code", Integer, 3).with_default("200"),
    FieldDefinition::new("entry_and_addenda_count", "Entry and Addenda Count", Integer, 6),
    FieldDefinition::new("entry_hash", "Entry Hash", Integer, 10),
    FieldDefinition::new("total_debit_amount", "Total Debit Amount", Integer, 12),
    FieldDefinition::new("total_credit_amount", "Total Credit Amount", Integer, 12),
    FieldDefinition::new("company_identification", "Company Identification", Integer, 10),
    FieldDefinition::new("message_authentication_code", "Message Authentication Code", AlphaNumeric, 19).optional(),
    FieldDefinition::new("reserved", "Reserved", AlphaNumeric, 6).optional(),
    FieldDefinition::new("odfi_identification", "ODFI Identification", Integer, 8),
    FieldDefinition::new("batch_number", "Batch Number", Integer, 7),
];

const FILE_CONTROL_FIELDS: [FieldDefinition; 8] = [
    FieldDefinition::new("record_type_code", "Record Type Code", Integer, 1).with_default("9"),
    FieldDefinition::new("batch_count", "Batch Count", Integer, 6),
    FieldDefinition::new("block_count", "Block Count", Integer, 6),
    FieldDefinition::new("entry_and_addenda_count", "Entry and Addenda Count", Integer, 8),
    FieldDefinition::new("entry_hash", "Entry Hash", Integer, 10),
    FieldDefinition::new("total_debit_amount", "Total Debit Amount", Integer, 12),
    FieldDefinition::new("total_credit_amount", "Total Credit Amount", Integer, 12),
    FieldDefinition::new("reserved", "Reserved", AlphaNumeric, 39).optional(),
];

pub static FILE_HEADER: Schema = Schema::new("file header", FILE_HEADER_CODE, RECORD_SIZE, &FILE_HEADER_FIELDS);
pub static BATCH_HEADER: Schema = Schema::new("batch header", BATCH_HEADER_CODE, RECORD_SIZE, &BATCH_HEADER_FIELDS);
pub static ENTRY_DETAIL: Schema = Schema::new("entry detail", ENTRY_DETAIL_CODE, RECORD_SIZE, &ENTRY_DETAIL_FIELDS);
pub static ADDENDA: Schema = Schema::new("addenda", ADDENDA_CODE, RECORD_SIZE, &ADDENDA_FIELDS);
pub static BATCH_CONTROL: Schema = Schema::new("batch control", BATCH_CONTROL_CODE, RECORD_SIZE, &BATCH_CONTROL_FIELDS);
pub static FILE_CONTROL: Schema = Schema::new("file control", FILE_CONTROL_CODE, RECORD_SIZE, &FILE_CONTROL_FIELDS);

const _: () = {
    assert!(fields_width(&FILE_HEADER_FIELDS) == RECORD_SIZE);
    assert!(fields_width(&BATCH_HEADER_FIELDS) == RECORD_SIZE);
    assert!(fields_width(&ENTRY_DETAIL_FIELDS) == RECORD_SIZE);
    assert!(fields_width(&ADDENDA_FIELDS) == RECORD_SIZE);
    assert!(fields_width(&BATCH_CONTROL_FIELDS) == RECORD_SIZE);
    assert!(fields_width(&FILE_CONTROL_FIELDS) == RECORD_SIZE);
};

/// Layout for a record type character.
pub fn schema_for_code(code: char) -> Option<&'static Schema> {
    match code {
        FILE_HEADER_CODE => Some(&FILE_HEADER),
        BATCH_HEADER_CODE => Some(&BATCH_HEADER),
        ENTRY_DETAIL_CODE => Some(&ENTRY_DETAIL),
        ADDENDA_CODE => Some(&ADDENDA),
        BATCH_CONTROL_CODE => Some(&BATCH_CONTROL),
        FILE_CONTROL_CODE => Some(&FILE_CONTROL),
        _ => None,
    }
}

/// A full line of block-padding filler.
pub fn filler_line() -> String {
    std::iter::repeat(FILLER_CHAR).take(RECORD_SIZE).collect()
}

pub fn file_header(values: FieldValues) -> Result<Record> {
    Record::new(&FILE_HEADER, values)
}

pub fn batch_header(values: FieldValues) -> Result<Record> {
    Record::new(&BATCH_HEADER, values)
}

/// Builds an entry detail. A `trace_number` value is split into its 8-digit
/// ODFI identifier and 7-digit sequence number.
pub fn entry_detail(mut values: FieldValues) -> Result<Record> {
    if let Some(trace) = values.remove(TRACE_NUMBER) {
        let (odfi, sequence) = split_trace_number(&trace);
        values.insert("trace_odfi_identifier", odfi);
        values.insert("trace_sequence_number", sequence);
    }
    Record::new(&ENTRY_DETAIL, values)
}

pub fn addenda(values: FieldValues) -> Result<Record> {
    Record::new(&ADDENDA, values)
}

pub fn batch_control(values: FieldValues) -> Result<Record> {
    Record::new(&BATCH_CONTROL, values)
}

pub fn file_control(values: FieldValues) -> Result<Record> {
    Record::new(&FILE_CONTROL, values)
}

/// Passes `value` through when it fits in `width` digits.
pub(crate) fn fit_width(field: &'static str, value: u64, width: usize) -> Result<u64> {
    if value.to_string().len() > width {
        return Err(AchError::ControlOverflow { field, value, width });
    }
    Ok(value)
}

/// Splits a trace number into its first 8 and following 7 characters.
pub fn split_trace_number(trace: &str) -> (String, String) {
    let odfi: String = trace.chars().take(8).collect();
    let sequence: String = trace.chars().skip(8).take(7).collect();
    (odfi, sequence)
}
