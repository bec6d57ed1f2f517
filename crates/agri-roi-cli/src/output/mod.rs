pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Flatten nested objects into dotted `(path, value)` rows.
///
/// Arrays of scalars stay as one row; arrays of objects are indexed
/// (`scenarios.0.npv`) unless longer than `max_array`, in which case they
/// collapse to an item count.
pub fn flatten(value: &Value, max_array: usize) -> Vec<(String, Value)> {
    let mut rows = Vec::new();
    flatten_into(&mut rows, String::new(), value, max_array);
    rows
}

fn flatten_into(rows: &mut Vec<(String, Value)>, prefix: String, value: &Value, max_array: usize) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten_into(rows, join(key), val, max_array);
            }
        }
        Value::Array(arr) if arr.iter().any(Value::is_object) => {
            if arr.len() > max_array {
                rows.push((prefix, Value::String(format!("[{} items]", arr.len()))));
            } else {
                for (i, val) in arr.iter().enumerate() {
                    flatten_into(rows, join(&i.to_string()), val, max_array);
                }
            }
        }
        _ => rows.push((prefix, value.clone())),
    }
}

/// Render a scalar (or scalar array) for a table cell or CSV field.
pub fn format_value(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value(v, null)).collect();
            items.join("; ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
