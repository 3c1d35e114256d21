use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go in a Field/Value table; arrays of records such as
/// `horizons` or `amortization_schedule` each get a table of their own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    let Value::Object(res_map) = result else {
        print_flat_object(envelope);
        return;
    };

    let mut nested: Vec<(&String, &Vec<Value>)> = Vec::new();
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in res_map {
        match val {
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                nested.push((key, rows));
            }
            _ => builder.push_record([key.as_str(), &format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, rows) in nested {
        println!("\n{}:", key);
        print_array_table(rows);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Render one cell. IRR outcomes collapse to `status (rate)`.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => match map.get("status").and_then(Value::as_str) {
            Some(status) => {
                let rate = map.get("rate").or_else(|| map.get("last_guess"));
                match rate {
                    Some(r) => format!("{} ({})", status, format_value(r)),
                    None => status.to_string(),
                }
            }
            None => match map.get("discount_rate").zip(map.get("npv")) {
                Some((rate, npv)) => format!("{} @ {}", format_value(npv), format_value(rate)),
                None => serde_json::to_string(value).unwrap_or_default(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_irr_outcome_cell() {
        let converged = json!({"status": "converged", "rate": "0.0970", "iterations": 4});
        assert_eq!(format_value(&converged), "converged (0.0970)");
        assert_eq!(format_value(&json!({"status": "no_sign_change"})), "no_sign_change");
    }

    #[test]
    fn test_npv_list_cell() {
        let npvs = json!([
            {"discount_rate": "0.05", "npv": "-12.5"},
            {"discount_rate": "0.08", "npv": "-40"}
        ]);
        assert_eq!(format_value(&npvs), "-12.5 @ 0.05, -40 @ 0.08");
    }
}
