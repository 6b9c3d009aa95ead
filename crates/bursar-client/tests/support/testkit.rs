use std::fs;
use std::path::{Path, PathBuf};

use bursar_client::commands::alerts::{self, AlertsListOptions};
use bursar_client::commands::suggestions::{self, SuggestionsListOptions};
use bursar_client::commands::sweep::{self, SweepRunOptions};
use bursar_client::setup::ensure_initialized_at;
use bursar_client::state::open_connection;
use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::{Connection, params};
use serde_json::Value;
use tempfile::{Builder, TempDir};

pub const TEST_USER: &str = "usr_local";

pub fn temp_home_in_tmp(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir_in("/tmp")?;
    let home = dir.path().join("ledger-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn open_initialized(home: &Path) -> Connection {
    let setup = ensure_initialized_at(home);
    assert!(setup.is_ok());
    let connection = setup.and_then(|context| open_connection(&context.db_path));
    assert!(connection.is_ok());
    connection.expect("connection opens after successful setup")
}

pub fn utc_ms(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
        .unwrap_or(0)
}

pub fn seed_account(connection: &Connection, account_id: &str, currency: &str) {
    let inserted = connection.execute(
        "INSERT INTO accounts (account_id, user_id, name, kind, currency, created_at, updated_at)
         VALUES (?1, ?2, ?1, 'checking', ?3, 0, 0)",
        params![account_id, TEST_USER, currency],
    );
    assert!(inserted.is_ok());
}

pub fn seed_monthly_bill(connection: &Connection, bill_id: &str, amount: f64, due_day: i64) {
    let inserted = connection.execute(
        "INSERT INTO bills (bill_id, user_id, name, amount, currency, cadence, due_day, created_at)
         VALUES (?1, ?2, ?1, ?3, 'USD', 'monthly', ?4, 0)",
        params![bill_id, TEST_USER, amount, due_day],
    );
    assert!(inserted.is_ok());
}

pub fn seed_subscription_bill(connection: &Connection, bill_id: &str, amount: f64, due_day: i64) {
    let inserted = connection.execute(
        "INSERT INTO bills (bill_id, user_id, name, amount, currency, cadence, due_day,
                            category, is_subscription, created_at)
         VALUES (?1, ?2, ?1, ?3, 'USD', 'monthly', ?4, 'Subscriptions', 1, 0)",
        params![bill_id, TEST_USER, amount, due_day],
    );
    assert!(inserted.is_ok());
}

pub fn update_bill_amount(connection: &Connection, bill_id: &str, amount: f64) {
    let updated = connection.execute(
        "UPDATE bills SET amount = ?1 WHERE bill_id = ?2",
        params![amount, bill_id],
    );
    assert!(updated.is_ok());
}

pub fn delete_bill(connection: &Connection, bill_id: &str) {
    let deleted = connection.execute("DELETE FROM bills WHERE bill_id = ?1", [bill_id]);
    assert!(deleted.is_ok());
}

pub fn seed_income(connection: &Connection, income_id: &str, source: &str, amount: f64) {
    let inserted = connection.execute(
        "INSERT INTO incomes (income_id, user_id, source, amount, currency, created_at)
         VALUES (?1, ?2, ?3, ?4, 'USD', 0)",
        params![income_id, TEST_USER, source, amount],
    );
    assert!(inserted.is_ok());
}

pub fn seed_rule(connection: &Connection, rule_id: &str, match_mode: &str, pattern: &str) {
    let inserted = connection.execute(
        "INSERT INTO allocation_rules (rule_id, user_id, name, match_mode, pattern, enabled, created_at)
         VALUES (?1, ?2, ?1, ?3, ?4, 1, 0)",
        params![rule_id, TEST_USER, match_mode, pattern],
    );
    assert!(inserted.is_ok());
}

pub fn seed_fx_rate(connection: &Connection, currency: &str, rate_per_usd: f64, as_of_ms: i64) {
    let inserted = connection.execute(
        "INSERT OR REPLACE INTO fx_rates (currency, rate_per_usd, as_of, source, synthetic)
         VALUES (?1, ?2, ?3, 'test', 0)",
        params![currency, rate_per_usd, as_of_ms],
    );
    assert!(inserted.is_ok());
}

pub fn set_preference(connection: &Connection, scope: &str, key: &str, value: &str) {
    let inserted = connection.execute(
        "INSERT OR REPLACE INTO preferences (user_id, scope, key, value, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0)",
        params![TEST_USER, scope, key, value],
    );
    assert!(inserted.is_ok());
}

pub fn sweep_at(home: &Path, mode: &str, now_ms: i64) -> Value {
    let result = sweep::run_with_options(SweepRunOptions {
        mode: Some(mode.to_string()),
        user: Some(TEST_USER.to_string()),
        now_ms: Some(now_ms),
        home_override: Some(home),
    });
    assert!(result.is_ok());
    if let Ok(success) = result {
        let payload = serde_json::to_value(success);
        assert!(payload.is_ok());
        if let Ok(value) = payload {
            return value;
        }
    }
    Value::Null
}

pub fn alert_rows(home: &Path, status: Option<&str>) -> Vec<Value> {
    let result = alerts::list_with_options(AlertsListOptions {
        status: status.map(std::string::ToString::to_string),
        user: Some(TEST_USER.to_string()),
        home_override: Some(home),
    });
    assert!(result.is_ok());
    result
        .ok()
        .and_then(|success| success.data.get("rows").and_then(Value::as_array).cloned())
        .unwrap_or_default()
}

pub fn suggestion_rows(home: &Path, status: Option<&str>) -> Vec<Value> {
    let result = suggestions::list_with_options(SuggestionsListOptions {
        status: status.map(std::string::ToString::to_string),
        user: Some(TEST_USER.to_string()),
        home_override: Some(home),
    });
    assert!(result.is_ok());
    result
        .ok()
        .and_then(|success| success.data.get("rows").and_then(Value::as_array).cloned())
        .unwrap_or_default()
}
