use serde_json::Value;

use super::table::format_value;

/// Print just the key answer value from the output.
///
/// Looks for well-known headline fields in priority order, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "recommendation",
        "monthly_payment",
        "npv",
        "irr",
        "monthly_irr",
        "monthly_cash_flow",
        "annualized_roi",
        "total_return",
        "cap_rate",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_value(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val));
            return;
        }
    }

    println!("{}", format_value(result_obj));
}
