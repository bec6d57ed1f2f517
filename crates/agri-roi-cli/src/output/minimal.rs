use serde_json::Value;

/// Print just the headline answer.
///
/// Looks up well-known result paths in priority order; the first one
/// present answers. Falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", headline(result_obj));
}

/// Dotted paths, most specific first: analyze, risk, monte-carlo,
/// scenarios, economics.
const PRIORITY_PATHS: [&str; 5] = [
    "recommendation.tier",
    "risk_level",
    "mean_npv",
    "weighted_npv",
    "viability.economic_score",
];

fn headline(result: &Value) -> String {
    for path in PRIORITY_PATHS {
        if let Some(val) = lookup(result, path) {
            if !val.is_null() {
                return format_minimal(val);
            }
        }
    }

    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }
    format_minimal(result)
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
