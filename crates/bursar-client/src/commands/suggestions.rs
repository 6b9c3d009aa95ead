use std::path::Path;

use rusqlite::params;

use crate::ClientResult;
use crate::commands::common::{load_setup, parse_status_filter, resolve_user};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{SuggestionRow, SuggestionsData};
use crate::state::{map_sqlite_error, open_connection};
use crate::sweep::normalize::payload_from_column;
use crate::sweep::types::SuggestionStatus;

const STATUS_VALUES: [&str; 4] = ["open", "accepted", "dismissed", "snoozed"];

#[derive(Debug, Default)]
pub struct SuggestionsListOptions<'a> {
    pub status: Option<String>,
    pub user: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn list(status: Option<&str>, user: Option<&str>) -> ClientResult<SuccessEnvelope> {
    list_with_options(SuggestionsListOptions {
        status: status.map(std::string::ToString::to_string),
        user: user.map(std::string::ToString::to_string),
        home_override: None,
    })
}

#[doc(hidden)]
pub fn list_with_options(options: SuggestionsListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let status_filter = parse_status_filter(
        options.status.as_deref(),
        &STATUS_VALUES,
        "suggestions list",
    )?;
    let user_id = resolve_user(options.user.as_deref());

    let connection = open_connection(&setup.db_path)?;
    let mut statement = connection
        .prepare(
            "SELECT suggestion_id, fingerprint, kind, status, payload
             FROM suggestions
             WHERE user_id = ?1
               AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, suggestion_id DESC",
        )
        .map_err(|error| map_sqlite_error(&setup.db_path, &error))?;

    let rows_iter = statement
        .query_map(params![user_id, status_filter], |row| {
            let status: String = row.get(3)?;
            let payload: Option<String> = row.get(4)?;
            Ok(SuggestionRow {
                suggestion_id: row.get(0)?,
                fingerprint: row.get(1)?,
                kind: row.get(2)?,
                status: SuggestionStatus::parse_or_default(&status)
                    .as_str()
                    .to_string(),
                payload: payload_from_column(payload.as_deref()),
            })
        })
        .map_err(|error| map_sqlite_error(&setup.db_path, &error))?;

    let mut rows: Vec<SuggestionRow> = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&setup.db_path, &error))?);
    }

    let data = SuggestionsData {
        user_id,
        status: status_filter,
        rows,
    };
    success("suggestions list", data)
}
