use serde_json::{Map, Value};
use std::io;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Fields whose rows are the natural CSV body of a result.
const ROW_FIELDS: [&str; 2] = ["net_cash_flow_projection", "periods"];

/// Write output as CSV to stdout.
///
/// Schedules and projections are written one row per period; anything else
/// becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match row_field(result) {
                Some(rows) => write_rows(&mut wtr, rows),
                None => write_fields(&mut wtr, result),
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn row_field(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    ROW_FIELDS
        .iter()
        .find_map(|f| map.get(*f).and_then(Value::as_array))
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_rows(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    // Nested objects (the sale event) are flattened one level with a prefix
    let mut headers: Vec<String> = Vec::new();
    for item in arr.iter().filter_map(Value::as_object) {
        for (key, val) in item {
            let columns: Vec<String> = match val {
                Value::Object(inner) => inner.keys().map(|k| format!("{key}.{k}")).collect(),
                _ => vec![key.clone()],
            };
            for c in columns {
                if !headers.contains(&c) {
                    headers.push(c);
                }
            }
        }
    }
    if headers.is_empty() {
        headers = first.keys().cloned().collect();
    }
    let _ = wtr.write_record(&headers);

    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers.iter().map(|h| lookup(map, h)).collect();
        let _ = wtr.write_record(&row);
    }
}

fn lookup(map: &Map<String, Value>, header: &str) -> String {
    let value = match header.split_once('.') {
        Some((outer, inner)) => map.get(outer).and_then(|o| o.get(inner)),
        None => map.get(header),
    };
    value.map(format_csv_value).unwrap_or_default()
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
