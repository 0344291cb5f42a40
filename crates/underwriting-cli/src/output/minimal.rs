use serde_json::Value;

/// Result fields that answer each command, in priority order.
const PRIORITY_KEYS: [&str; 5] = [
    "maximum_loan_amount",
    "payment",
    "present_value",
    "closing_balance",
    "acquisition_cost",
];

/// Print just the key answer value from the output.
///
/// Looks for the well-known answer fields first, then falls back to the
/// first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        let answer = PRIORITY_KEYS
            .iter()
            .find_map(|k| map.get(*k).filter(|v| !v.is_null()));
        if let Some(val) = answer {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
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
