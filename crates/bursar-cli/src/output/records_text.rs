use serde_json::Value;

use super::format::{format_instant, value_str};

pub fn render_alerts(data: &Value) -> String {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if rows.is_empty() {
        return "No alerts. Run `bursar sweep run` to refresh.".to_string();
    }

    let mut lines = vec![format!("{} alert(s):", rows.len()), String::new()];
    for row in &rows {
        let due_label = row
            .get("due_at")
            .and_then(Value::as_i64)
            .map(format_instant)
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "  [{}] {} ({}) due {} — {}",
            value_str(row, "severity"),
            value_str(row, "title"),
            value_str(row, "status"),
            due_label,
            value_str(row, "fingerprint"),
        ));
    }
    lines.join("\n")
}

pub fn render_suggestions(data: &Value) -> String {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if rows.is_empty() {
        return "No suggestions. Run `bursar sweep run` to refresh.".to_string();
    }

    let mut lines = vec![format!("{} suggestion(s):", rows.len()), String::new()];
    for row in &rows {
        lines.push(format!(
            "  [{}] {} ({}) — {}",
            value_str(row, "status"),
            value_str(row, "kind"),
            summarize_payload(row.get("payload")),
            value_str(row, "fingerprint"),
        ));
    }
    lines.join("\n")
}

fn summarize_payload(payload: Option<&Value>) -> String {
    let Some(payload) = payload else {
        return "no detail".to_string();
    };

    if let Some(source) = payload.get("income_source").and_then(Value::as_str) {
        return format!("allocate income from `{source}`");
    }
    if let Some(bill_name) = payload.get("bill_name").and_then(Value::as_str) {
        let observation = payload
            .get("observation")
            .and_then(Value::as_str)
            .unwrap_or("observation");
        return format!("{observation} for `{bill_name}`");
    }
    "no detail".to_string()
}
