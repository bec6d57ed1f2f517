use serde_json::Value;
use std::io;

use super::{flatten, format_value};

/// Write the result as two-column `field,value` CSV to stdout.
///
/// Every array element is expanded, so histograms and cash-flow schedules
/// come out in full.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in flatten(body, usize::MAX) {
        let _ = wtr.write_record([key, format_value(&val, "")]);
    }

    let _ = wtr.flush();
}
