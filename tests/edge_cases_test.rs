//! Library-level scenario tests: round trips, aggregation, cache
//! invalidation and builder behaviour across the whole tree.

use chrono::{Duration, Local};
use nacha_ach::field::{Field, FieldDefinition, FieldType};
use nacha_ach::schema::{self, filler_line, RECORD_SIZE};
use nacha_ach::{
    parse, AchError, EntryInput, FailureMode, FieldError, FieldValues, FileBuilder,
    TransactionEntry,
};
use std::fs;

fn sample() -> String {
    fs::read_to_string("tests/data/sample.ach").unwrap()
}

fn scenario_builder() -> FileBuilder {
    let mut builder = FileBuilder::new(FieldValues::from([
        ("destination_routing", "012345678"),
        ("origin_routing", "102345678"),
        ("destination_name", "YOUR BANK"),
        ("origin_name", "YOUR FINANCIAL INSTITUTION"),
    ]))
    .unwrap();
    builder
        .add_batch(FieldValues::from([
            ("company_name", "YOUR COMPANY"),
            ("company_identification", "1234567890"),
            ("company_entry_description", "TEST"),
        ]))
        .unwrap();
    builder
}

fn entry(code: &str, routing: &str, amount: &str) -> EntryInput {
    EntryInput::new(FieldValues::from([
        ("transaction_code", code),
        ("rdfi_routing", routing),
        ("rdfi_account_number", "65656565"),
        ("amount", amount),
        ("individual_name", "JANEY TEST"),
    ]))
}

// ==================== ROUND TRIPS ====================

#[test]
fn test_parse_then_render_is_identity() {
    let text = sample();
    assert_eq!(parse(&text).unwrap().render().unwrap(), text);
}

#[test]
fn test_builder_reproduces_parsed_file() {
    let text = sample();
    let parsed = parse(&text).unwrap();

    let mut builder = FileBuilder::new(parsed.header().to_field_values()).unwrap();
    for batch in parsed.batches() {
        let inputs = batch
            .transactions()
            .iter()
            .map(|tx| EntryInput {
                fields: tx.entry().to_field_values(),
                addendas: tx.addendas().iter().map(|a| a.to_field_values()).collect(),
            })
            .collect();
        builder.add_batch(batch.header().to_field_values()).unwrap();
        let failed = builder.add_entries(inputs, None, FailureMode::Raise).unwrap();
        assert!(failed.is_empty());
    }

    assert_eq!(builder.render().unwrap(), text);
}

#[test]
fn test_multi_batch_file_round_trips() {
    let mut builder = scenario_builder();
    builder
        .add_entries(
            vec![
                entry("22", "123456789", "300"),
                entry("27", "023456789", "125").with_addenda(FieldValues::from([(
                    "payment_related_information",
                    "FIRST BATCH NOTE",
                )])),
            ],
            None,
            FailureMode::Raise,
        )
        .unwrap();
    builder
        .add_batch(FieldValues::from([
            ("company_name", "OTHER COMPANY"),
            ("company_identification", "9876543210"),
            ("company_entry_description", "REFUND"),
        ]))
        .unwrap();
    builder
        .add_entry(
            &entry("32", "223456789", "4200")
                .with_addenda(FieldValues::from([("payment_related_information", "ONE")]))
                .with_addenda(FieldValues::from([("payment_related_information", "TWO")])),
            None,
        )
        .unwrap();

    let text = builder.render().unwrap();
    assert_eq!(text.lines().count(), 20);

    let parsed = parse(&text).unwrap();
    assert_eq!(parsed.batches().len(), 2);
    assert_eq!(parsed.batches()[1].transactions()[0].addendas().len(), 2);
    assert!(parsed.control_discrepancies().unwrap().is_empty());
    assert_eq!(parsed.render().unwrap(), text);
}

#[test]
fn test_control_characters_in_names_stay_on_one_line() {
    for name in ["JOHN\nDOE", "JOHN\rDOE", "JOHN\tDOE", "JOHN\u{2003}DOE"] {
        let mut builder = scenario_builder();
        let mut input = entry("22", "123456789", "300");
        input.fields.insert("individual_name", name);
        builder.add_entry(&input, None).unwrap();

        let text = builder.render().unwrap();
        assert!(text.lines().all(|line| line.len() == RECORD_SIZE), "{:?}", name);

        let parsed = parse(&text).unwrap();
        let tx = &parsed.batches()[0].transactions()[0];
        assert_eq!(tx.entry().get("individual_name"), Some("JOHN DOE              "));
        assert_eq!(parsed.render().unwrap(), text);
    }
}

// ==================== AGGREGATION ====================

#[test]
fn test_single_credit_scenario() {
    let mut builder = scenario_builder();
    builder.add_entry(&entry("22", "123456789", "300"), None).unwrap();

    let rendered = builder.render().unwrap();
    let file_control = rendered
        .lines()
        .find(|line| line.starts_with('9') && *line != filler_line())
        .unwrap();

    let control = builder.file().control().unwrap();
    assert_eq!(control.render_line(), file_control);
    assert_eq!(control.int_value("entry_and_addenda_count").unwrap(), 1);
    assert_eq!(control.int_value("total_credit_amount").unwrap(), 300);
    assert_eq!(control.int_value("total_debit_amount").unwrap(), 0);
    assert_eq!(control.int_value("batch_count").unwrap(), 1);
}

#[test]
fn test_mixed_entries_with_addendas() {
    let mut builder = scenario_builder();
    let inputs = vec![
        entry("22", "123456789", "300"),
        entry("27", "123456789", "300").with_addenda(FieldValues::from([(
            "payment_related_information",
            "REVERSING THE LAST TRANSACTION PLS AND THX",
        )])),
        entry("22", "023456789", "7000").with_addenda(FieldValues::from([(
            "payment_related_information",
            "WHERE'S MY MONEY",
        )])),
    ];
    builder.add_entries(inputs, None, FailureMode::Raise).unwrap();

    let control = builder.file().control().unwrap();
    assert_eq!(control.int_value("entry_and_addenda_count").unwrap(), 5);
    assert_eq!(control.int_value("total_credit_amount").unwrap(), 7300);
    assert_eq!(control.int_value("total_debit_amount").unwrap(), 300);
    assert_eq!(
        control.int_value("entry_hash").unwrap(),
        12345678 + 12345678 + 2345678
    );
}

#[test]
fn test_blocking_factor_two() {
    let text = sample();
    let mut file = parse(&text).unwrap();
    let header = file.header().with_value("blocking_factor", "2").unwrap();
    file.set_header(header).unwrap();

    assert_eq!(file.control().unwrap().int_value("block_count").unwrap(), 4);
    // 8 record lines are already a multiple of 2
    assert_eq!(file.rendered_lines().unwrap().len(), 8);
}

// ==================== CACHE INVALIDATION ====================

#[test]
fn test_controls_follow_mutations() {
    let mut file = parse(&sample()).unwrap();
    assert_eq!(
        file.control().unwrap().int_value("entry_and_addenda_count").unwrap(),
        4
    );

    let removed = file.batch_mut(0).unwrap().remove_transaction(0).unwrap();
    assert_eq!(removed.addendas().len(), 1);
    assert_eq!(
        file.control().unwrap().int_value("entry_and_addenda_count").unwrap(),
        2
    );
    assert_eq!(
        file.batches()[0].control().unwrap().int_value("total_credit_amount").unwrap(),
        1213
    );

    file.batch_mut(0).unwrap().add_transaction(removed);
    assert_eq!(
        file.control().unwrap().int_value("total_credit_amount").unwrap(),
        2213
    );
}

#[test]
fn test_addenda_mutation_through_owner() {
    let mut file = parse(&sample()).unwrap();
    let memo = schema::addenda(FieldValues::from([
        ("payment_related_information", "SECOND NOTE"),
        ("entry_detail_sequence_number", "1"),
        ("addenda_sequence_number", "2"),
    ]))
    .unwrap();
    file.batch_mut(0)
        .unwrap()
        .transaction_mut(0)
        .unwrap()
        .add_addenda(memo)
        .unwrap();

    assert_eq!(
        file.control().unwrap().int_value("entry_and_addenda_count").unwrap(),
        5
    );
    assert!(file.control_discrepancies().unwrap().is_empty());
}

#[test]
fn test_empty_batch_renders() {
    let mut builder = scenario_builder();
    builder.add_batch(FieldValues::from([
        ("company_name", "OTHER COMPANY"),
        ("company_identification", "1234567890"),
        ("company_entry_description", "EMPTY"),
    ]))
    .unwrap();
    builder.add_entry(&entry("22", "123456789", "1"), Some(0)).unwrap();

    let file = builder.file();
    assert_eq!(file.batches()[1].transactions().len(), 0);
    assert_eq!(file.batches()[1].control().unwrap().get("batch_number"), Some("0000002"));
    assert_eq!(file.control().unwrap().int_value("batch_count").unwrap(), 2);
}

// ==================== PADDING ====================

#[test]
fn test_every_line_is_record_width_and_blocks_are_full() {
    for entries in 0..12 {
        let mut builder = scenario_builder();
        for _ in 0..entries {
            builder.add_entry(&entry("22", "123456789", "1"), None).unwrap();
        }
        let rendered = builder.render().unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines.iter().all(|line| line.len() == RECORD_SIZE));
        assert_eq!(lines.len() % 10, 0);

        let record_lines = entries + 4;
        let fillers = lines.iter().filter(|line| **line == filler_line()).count();
        assert_eq!(fillers, (10 - record_lines % 10) % 10);
    }
}

// ==================== FIELD RULES ====================

#[test]
fn test_hash_in_alphanumeric_field() {
    let strict = FieldDefinition::new("memo", "Memo", FieldType::AlphaNumeric, 10)
        .with_auto_correct(false);
    assert!(matches!(
        Field::new(strict, Some("PAY#ROLL")),
        Err(FieldError::ValueMismatch { .. })
    ));

    let lenient = strict.with_auto_correct(true);
    assert_eq!(Field::new(lenient, Some("PAY#ROLL")).unwrap().value(), "PAYROLL   ");
}

#[test]
fn test_tomorrow_resolves_at_construction() {
    let builder = scenario_builder();
    let expected = (Local::now().date_naive() + Duration::days(1))
        .format("%y%m%d")
        .to_string();
    assert_eq!(
        builder.file().batches()[0].header().get("effective_entry_date"),
        Some(expected.as_str())
    );
}

#[test]
fn test_unknown_names_rejected_by_builder() {
    let mut builder = scenario_builder();
    let input = entry("22", "123456789", "1").with_addenda(FieldValues::from([("memo", "HI")]));
    match builder.add_entry(&input, None) {
        Err(AchError::UnknownFields { names, .. }) => assert_eq!(names, vec!["memo"]),
        other => panic!("Expected UnknownFields, got {:?}", other.map(|_| ())),
    }
    assert_eq!(builder.file().all_transactions().count(), 0);
}

#[test]
fn test_wrong_record_in_transaction() {
    let text = sample();
    let parsed = parse(&text).unwrap();
    let header = parsed.batches()[0].header().clone();
    assert!(matches!(
        TransactionEntry::new(header),
        Err(AchError::WrongRecordType { expected: "entry detail", .. })
    ));
}
