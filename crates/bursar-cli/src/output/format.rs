use chrono::DateTime;
use serde_json::Value;

pub fn value_str<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("-")
}

pub fn value_i64(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Renders an epoch-millisecond instant as a UTC `YYYY-MM-DD HH:MM` label.
/// Display only; zone-aware calendar logic stays in the client library.
pub fn format_instant(instant_ms: i64) -> String {
    DateTime::from_timestamp_millis(instant_ms)
        .map(|instant| instant.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| instant_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::format_instant;

    #[test]
    fn instants_render_as_utc_labels() {
        assert_eq!(format_instant(0), "1970-01-01 00:00");
        // 2024-02-29 09:00:00 UTC
        assert_eq!(format_instant(1_709_197_200_000), "2024-02-29 09:00");
    }
}
