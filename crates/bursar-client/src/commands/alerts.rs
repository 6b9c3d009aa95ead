use std::path::Path;

use rusqlite::params;

use crate::ClientResult;
use crate::commands::common::{load_setup, parse_status_filter, resolve_user};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{AlertRow, AlertsData};
use crate::state::{map_sqlite_error, open_connection};
use crate::sweep::types::{AlertSource, AlertStatus, Severity};

const STATUS_VALUES: [&str; 3] = ["open", "snoozed", "resolved"];

#[derive(Debug, Default)]
pub struct AlertsListOptions<'a> {
    pub status: Option<String>,
    pub user: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn list(status: Option<&str>, user: Option<&str>) -> ClientResult<SuccessEnvelope> {
    list_with_options(AlertsListOptions {
        status: status.map(std::string::ToString::to_string),
        user: user.map(std::string::ToString::to_string),
        home_override: None,
    })
}

#[doc(hidden)]
pub fn list_with_options(options: AlertsListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let status_filter =
        parse_status_filter(options.status.as_deref(), &STATUS_VALUES, "alerts list")?;
    let user_id = resolve_user(options.user.as_deref());

    let connection = open_connection(&setup.db_path)?;
    let mut statement = connection
        .prepare(
            "SELECT alert_id, fingerprint, title, detail, severity, entity_type,
                    entity_id, due_at, cycle_key, status, source, resolved_at
             FROM alerts
             WHERE user_id = ?1
               AND (?2 IS NULL OR status = ?2)
             ORDER BY due_at IS NULL, due_at ASC, alert_id ASC",
        )
        .map_err(|error| map_sqlite_error(&setup.db_path, &error))?;

    let rows_iter = statement
        .query_map(params![user_id, status_filter], |row| {
            let severity: String = row.get(4)?;
            let status: String = row.get(9)?;
            let source: String = row.get(10)?;
            Ok(AlertRow {
                alert_id: row.get(0)?,
                fingerprint: row.get(1)?,
                title: row.get(2)?,
                detail: row.get(3)?,
                severity: Severity::parse_or_default(&severity).as_str().to_string(),
                entity_type: row.get(5)?,
                entity_id: row.get(6)?,
                due_at: row.get(7)?,
                cycle_key: row.get(8)?,
                status: AlertStatus::parse_or_default(&status).as_str().to_string(),
                source: AlertSource::parse_or_default(&source).as_str().to_string(),
                resolved_at: row.get(11)?,
            })
        })
        .map_err(|error| map_sqlite_error(&setup.db_path, &error))?;

    let mut rows: Vec<AlertRow> = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&setup.db_path, &error))?);
    }

    let data = AlertsData {
        user_id,
        status: status_filter,
        rows,
    };
    success("alerts list", data)
}
