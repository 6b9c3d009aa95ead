use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::Connection;

use crate::ClientResult;
use crate::state::map_sqlite_error;

pub const PREF_TIMEZONE: &str = "timezone";
pub const PREF_BASE_CURRENCY: &str = "base_currency";
pub const PREF_DUE_REMINDERS_ENABLED: &str = "due_reminders_enabled";
pub const PREF_DUE_REMINDER_DAYS: &str = "due_reminder_days";
pub const PREF_MONTHLY_CYCLE_ENABLED: &str = "monthly_cycle_enabled";

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const DEFAULT_DUE_REMINDER_DAYS: i64 = 3;

/// Single precedence rule for every preference: explicit argument, then the
/// user-scope stored value, then the dashboard-scope stored value, then the
/// hard default. Call sites never chain their own fallbacks.
pub fn resolve_preference<T>(
    explicit: Option<T>,
    user_value: Option<T>,
    dashboard_value: Option<T>,
    default_value: T,
) -> T {
    explicit
        .or(user_value)
        .or(dashboard_value)
        .unwrap_or(default_value)
}

#[derive(Debug, Clone, Default)]
pub struct StoredPreferences {
    user_scope: BTreeMap<String, String>,
    dashboard_scope: BTreeMap<String, String>,
}

impl StoredPreferences {
    pub fn timezone(&self, explicit: Option<&str>) -> String {
        resolve_preference(
            explicit.map(str::to_string),
            self.user_scope.get(PREF_TIMEZONE).cloned(),
            self.dashboard_scope.get(PREF_TIMEZONE).cloned(),
            DEFAULT_TIMEZONE.to_string(),
        )
    }

    pub fn base_currency(&self, explicit: Option<&str>) -> String {
        resolve_preference(
            explicit.map(str::to_string),
            self.user_scope.get(PREF_BASE_CURRENCY).cloned(),
            self.dashboard_scope.get(PREF_BASE_CURRENCY).cloned(),
            DEFAULT_BASE_CURRENCY.to_string(),
        )
        .trim()
        .to_ascii_uppercase()
    }

    pub fn due_reminders_enabled(&self, explicit: Option<bool>) -> bool {
        resolve_preference(
            explicit,
            self.bool_value("user", PREF_DUE_REMINDERS_ENABLED),
            self.bool_value("dashboard", PREF_DUE_REMINDERS_ENABLED),
            true,
        )
    }

    pub fn due_reminder_days(&self, explicit: Option<i64>) -> i64 {
        let days = resolve_preference(
            explicit,
            self.int_value("user", PREF_DUE_REMINDER_DAYS),
            self.int_value("dashboard", PREF_DUE_REMINDER_DAYS),
            DEFAULT_DUE_REMINDER_DAYS,
        );
        days.max(0)
    }

    pub fn monthly_cycle_enabled(&self, explicit: Option<bool>) -> bool {
        resolve_preference(
            explicit,
            self.bool_value("user", PREF_MONTHLY_CYCLE_ENABLED),
            self.bool_value("dashboard", PREF_MONTHLY_CYCLE_ENABLED),
            false,
        )
    }

    fn scope_map(&self, scope: &str) -> &BTreeMap<String, String> {
        if scope == "dashboard" {
            &self.dashboard_scope
        } else {
            &self.user_scope
        }
    }

    fn bool_value(&self, scope: &str, key: &str) -> Option<bool> {
        self.scope_map(scope).get(key).map(|value| parse_bool(value))
    }

    fn int_value(&self, scope: &str, key: &str) -> Option<i64> {
        self.scope_map(scope)
            .get(key)
            .and_then(|value| value.trim().parse::<i64>().ok())
    }
}

pub fn load_preferences(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<StoredPreferences> {
    let mut statement = connection
        .prepare("SELECT scope, key, value FROM preferences WHERE user_id = ?1")
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            let scope: String = row.get(0)?;
            let key: String = row.get(1)?;
            let value: String = row.get(2)?;
            Ok((scope, key, value))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut prefs = StoredPreferences::default();
    for row in rows_iter {
        let (scope, key, value) = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        if scope == "dashboard" {
            prefs.dashboard_scope.insert(key, value);
        } else {
            prefs.user_scope.insert(key, value);
        }
    }

    Ok(prefs)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
