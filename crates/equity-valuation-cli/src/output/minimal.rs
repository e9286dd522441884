use serde_json::Value;

use super::cell;

/// Fields that best summarize each command, in priority order. Dotted keys
/// reach into nested objects.
const PRIORITY_KEYS: [&str; 9] = [
    "sentence",
    "combined_fair_value",
    "fair_value",
    "selected.dps",
    "score",
    "label",
    "upside",
    "price",
    "ticker",
];

/// Print just the key figure of the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(items) => {
            for item in items {
                println!("{}", key_figure(item));
            }
        }
        other => println!("{}", key_figure(other)),
    }
}

fn key_figure(value: &Value) -> String {
    let Value::Object(map) = value else {
        return cell(value);
    };

    for key in PRIORITY_KEYS {
        if let Some(val) = lookup(value, key) {
            if !val.is_null() {
                return cell(val);
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, cell(val)),
        None => "N/A".to_string(),
    }
}

fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted.split('.').try_fold(value, |v, part| v.get(part))
}
