use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, flat_rows};

/// Render the result envelope as tables, followed by warnings and methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(items)) => {
                print_comparison(items);
                print_footer(map);
            }
            Some(Value::Object(result)) => {
                print_field_table(result);
                print_footer(map);
            }
            _ => print_field_table(map),
        },
        Value::Array(items) => print_comparison(items),
        _ => println!("{}", cell(value)),
    }
}

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flat_rows(map) {
        builder.push_record([key, cell(&val)]);
    }
    println!("{}", Table::from(builder));
}

/// One column per ticker, one row per flattened field.
fn print_comparison(items: &[Value]) {
    if items.is_empty() {
        println!("(empty)");
        return;
    }

    let columns: Vec<Vec<(String, Value)>> = items
        .iter()
        .map(|item| match item {
            Value::Object(map) => flat_rows(map),
            other => vec![("value".to_string(), other.clone())],
        })
        .collect();

    let mut header = vec!["Field".to_string()];
    header.extend(columns.iter().enumerate().map(|(i, rows)| {
        rows.iter()
            .find(|(k, _)| k == "ticker")
            .map(|(_, v)| cell(v))
            .unwrap_or_else(|| format!("#{}", i + 1))
    }));

    let mut builder = Builder::default();
    builder.push_record(header);
    for (key, _) in &columns[0] {
        if key == "ticker" {
            continue;
        }
        let mut row = vec![key.clone()];
        row.extend(columns.iter().map(|rows| {
            rows.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| cell(v))
                .unwrap_or_default()
        }));
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
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
