use serde_json::Value;

use super::format::{value_i64, value_str};

pub fn render_purchase(data: &Value) -> String {
    let mut lines = vec![
        format!(
            "Posted `{}` for {} {} (entry {}).",
            value_str(data, "merchant"),
            value_i64(data, "total_minor"),
            value_str(data, "currency"),
            value_str(data, "entry_id"),
        ),
        String::new(),
    ];

    let rows = data
        .get("lines")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for row in &rows {
        let label = row
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or("(unlabeled)");
        let synthetic_marker = if row
            .get("fx_synthetic")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            " [synthetic fx]"
        } else {
            ""
        };
        lines.push(format!(
            "  {:<10} {:>10} {}  {}  -> {} {}{}",
            value_str(row, "kind"),
            value_i64(row, "amount_minor"),
            value_str(row, "currency"),
            label,
            value_i64(row, "fx_base_minor"),
            value_str(row, "fx_base_currency"),
            synthetic_marker,
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_purchase;

    #[test]
    fn renders_funding_and_allocation_lines_with_fx_base() {
        let rendered = render_purchase(&json!({
            "merchant": "Corner Market",
            "total_minor": 12_000,
            "currency": "USD",
            "entry_id": "ent_1",
            "lines": [
                {
                    "kind": "funding",
                    "amount_minor": -12_000,
                    "currency": "USD",
                    "label": "Corner Market",
                    "fx_base_minor": -12_000,
                    "fx_base_currency": "USD",
                    "fx_synthetic": false,
                },
                {
                    "kind": "allocation",
                    "amount_minor": 12_000,
                    "currency": "USD",
                    "label": null,
                    "fx_base_minor": 12_000,
                    "fx_base_currency": "USD",
                    "fx_synthetic": true,
                },
            ]
        }));
        assert!(rendered.contains("Posted `Corner Market`"));
        assert!(rendered.contains("funding"));
        assert!(rendered.contains("(unlabeled)"));
        assert!(rendered.contains("[synthetic fx]"));
    }
}
