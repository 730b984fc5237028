//! # NACHA ACH
//!
//! Generates and parses NACHA-format ACH files: fixed-width flat files of
//! 94-character records used for US interbank funds transfer.
//!
//! ## Design Principles
//!
//! - **Exact widths**: every field is corrected, validated and padded to its
//!   layout width; every rendered line is exactly 94 characters
//! - **Lazy controls**: batch and file control records are computed on first
//!   read, cached, and recomputed after any mutation
//! - **Faithful round trips**: parsed control records are kept verbatim, so
//!   `render(parse(text)) == text`
//! - **Integer money**: amounts are cents, converted to dollars via `rust_decimal`
//!
//! ## Example
//!
//! ```
//! use nacha_ach::parser::parse;
//!
//! let text = std::fs::read_to_string("tests/data/sample.ach").unwrap();
//! let file = parse(&text).unwrap();
//! assert_eq!(file.batches().len(), 1);
//! assert_eq!(file.render().unwrap(), text);
//! ```

pub mod amount;
pub mod batch;
pub mod builder;
pub mod codes;
pub mod error;
pub mod export;
pub mod field;
pub mod file;
pub mod parser;
pub mod record;
pub mod schema;
pub mod transaction;

pub use amount::Amount;
pub use batch::Batch;
pub use builder::{EntryInput, FailureMode, FileBuilder};
pub use codes::{ServiceClassCode, StandardEntryClass, TransactionCode};
pub use error::{AchError, FieldError, Result};
pub use export::write_entries_csv;
pub use field::{Field, FieldDefinition, FieldType};
pub use file::{AchFile, ControlDiscrepancy, RenderOptions};
pub use parser::{parse, ParseOptions, Parser};
pub use record::{FieldValues, Record, Schema};
pub use transaction::TransactionEntry;
