use serde_json::Value;
use std::io;

use super::{cell, flat_rows};

/// Write output as CSV to stdout: `field,value` for a single result, one row
/// per item for a comparison.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in flat_rows(map) {
                let _ = wtr.write_record([key, csv_cell(&val)]);
            }
        }
        Value::Array(items) => write_rows(&mut wtr, items),
        other => {
            let _ = wtr.write_record([csv_cell(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, items: &[Value]) {
    let rows: Vec<Vec<(String, Value)>> = items
        .iter()
        .filter_map(|item| item.as_object().map(flat_rows))
        .collect();
    let Some(first) = rows.first() else {
        return;
    };

    let headers: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for row in &rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| csv_cell(v))
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&record);
    }
}

/// CSV leaves absent values empty rather than N/A.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => cell(other),
    }
}
