//! NACHA ACH CLI
//!
//! Inspects an ACH file: checks its control totals, dumps it as JSON or lists
//! its entries as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- check payroll.ach
//! cargo run -- json payroll.ach > payroll.json
//! cargo run -- entries payroll.ach > entries.csv
//! ```
//!
//! `check` exits with status 1 when any recorded control differs from the
//! recomputed one.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use nacha_ach::{parse, write_entries_csv, AchError, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns `false` when the file parsed but failed its control check.
fn run() -> Result<bool> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(AchError::MissingArgument);
    }

    let command = args[1].as_str();
    if !matches!(command, "check" | "json" | "entries") {
        return Err(AchError::UnknownCommand(command.to_string()));
    }

    let text = fs::read_to_string(&args[2])?;
    let file = parse(&text)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match command {
        "check" => {
            let discrepancies = file.control_discrepancies()?;
            for discrepancy in &discrepancies {
                writeln!(handle, "MISMATCH {}", discrepancy)?;
            }
            if !discrepancies.is_empty() {
                return Ok(false);
            }
            writeln!(
                handle,
                "OK: {} batches, {} entries",
                file.batches().len(),
                file.all_transactions().count()
            )?;
        }
        "json" => writeln!(handle, "{}", file.to_json()?)?,
        _ => write_entries_csv(&file, handle)?,
    }

    Ok(true)
}
