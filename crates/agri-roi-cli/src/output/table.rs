use colored::Colorize;
use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten, format_value};

/// Object arrays longer than this (histograms, cash-flow schedules on long
/// horizons) are summarised instead of expanded.
const MAX_EXPANDED_ROWS: usize = 12;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    print_flat_object(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(value, MAX_EXPANDED_ROWS) {
        builder.push_record([key, format_value(&val, "-")]);
    }
    println!("{}", Table::from(builder));
}
