use rusqlite::{Connection, params};
use serde_json::Value;
use ulid::Ulid;

use crate::clock::now_epoch_ms;

/// Best-effort audit trail. The primary operation's success never depends on
/// an audit row landing, so failures are swallowed and only logged.
pub fn record_best_effort(connection: &Connection, user_id: &str, action: &str, detail: &Value) {
    let audit_id = format!("aud_{}", Ulid::new());
    let detail_body = detail.to_string();
    let result = connection.execute(
        "INSERT INTO audit_log (audit_id, user_id, action, detail, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![audit_id, user_id, action, detail_body, now_epoch_ms()],
    );

    if let Err(error) = result {
        log::warn!("audit write skipped for action `{action}`: {error}");
    }
}
