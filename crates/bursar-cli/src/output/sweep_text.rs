use serde_json::Value;

use super::format::{value_i64, value_str};

pub fn render_sweep(data: &Value) -> String {
    if data.get("skipped").and_then(Value::as_bool).unwrap_or(false) {
        return format!(
            "Sweep skipped ({} mode, cycle {}): {}",
            value_str(data, "mode"),
            value_str(data, "cycle_key"),
            value_str(data, "skip_reason"),
        );
    }

    let mut lines = vec![
        format!(
            "Sweep complete ({} mode, cycle {}, policy {}).",
            value_str(data, "mode"),
            value_str(data, "cycle_key"),
            value_str(data, "policy_version"),
        ),
        String::new(),
        format!("  Alerts created:      {}", value_i64(data, "alerts_created")),
        format!("  Alerts updated:      {}", value_i64(data, "alerts_updated")),
        format!("  Alerts resolved:     {}", value_i64(data, "alerts_resolved")),
        format!(
            "  Suggestions created: {}",
            value_i64(data, "suggestions_created")
        ),
    ];

    lines.push(String::new());
    lines.push("Next: `bursar alerts list` or `bursar suggestions list`.".to_string());
    lines.join("\n")
}

pub fn render_demo(data: &Value) -> String {
    let mut lines = vec![
        format!(
            "Demo ledger seeded at {} (topic: {}).",
            value_str(data, "home"),
            value_str(data, "topic"),
        ),
        String::new(),
    ];

    let result = data
        .get("detail")
        .and_then(|detail| detail.get("result"))
        .cloned()
        .unwrap_or(Value::Null);
    match value_str(data, "topic") {
        "purchase" => lines.push(super::purchase_text::render_purchase(&result)),
        _ => lines.push(render_sweep(&result)),
    }

    lines.join("\n")
}
