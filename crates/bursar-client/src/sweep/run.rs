use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde_json::json;
use ulid::Ulid;

use crate::ClientResult;
use crate::audit::record_best_effort;
use crate::clock::{TimeZoneClock, now_epoch_ms};
use crate::money::MoneyConverter;
use crate::prefs::load_preferences;
use crate::state::map_sqlite_error;
use crate::sweep::alerts::{AlertContext, desired_alerts};
use crate::sweep::policy::{SWEEP_POLICY_V1, SWEEP_POLICY_VERSION};
use crate::sweep::query::{load_fraction_digits, load_fx_quotes, load_user_state};
use crate::sweep::reconcile::{SweepDiff, reconcile_alerts};
use crate::sweep::suggest::{SuggestionInput, desired_suggestions};
use crate::sweep::types::{AlertSource, AlertStatus, DesiredSuggestion, SweepMode};

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub user_id: String,
    pub mode: SweepMode,
    /// Test seam; live sweeps read the wall clock.
    pub now_ms: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SweepSummary {
    pub user_id: String,
    pub mode: SweepMode,
    pub cycle_key: String,
    pub alerts_created: i64,
    pub alerts_updated: i64,
    pub alerts_resolved: i64,
    pub suggestions_created: i64,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

/// One sweep execution for one user: load state, compute the desired
/// alert/suggestion sets, reconcile against what is persisted, apply the
/// diff. Re-running with unchanged state converges to a no-op.
pub fn run_sweep(
    connection: &mut Connection,
    db_path: &Path,
    options: &SweepOptions,
) -> ClientResult<SweepSummary> {
    let now_ms = options.now_ms.unwrap_or_else(now_epoch_ms);
    let clock = TimeZoneClock::new();
    let policy = SWEEP_POLICY_V1;

    let prefs = load_preferences(connection, db_path, &options.user_id)?;
    let zone_name = prefs.timezone(None);
    let cycle_key = clock.cycle_key(now_ms, &zone_name);

    if options.mode == SweepMode::Monthly {
        if !prefs.monthly_cycle_enabled(None) {
            return Ok(skipped_summary(
                options,
                cycle_key,
                "monthly cycle runs are disabled for this user",
            ));
        }
        if cycle_run_completed(connection, db_path, &options.user_id, &cycle_key)? {
            return Ok(skipped_summary(
                options,
                cycle_key,
                "this month's cycle run already completed",
            ));
        }
    }

    let state = load_user_state(connection, db_path, &options.user_id)?;
    let money = MoneyConverter::new(
        load_fraction_digits(connection, db_path)?,
        load_fx_quotes(connection, db_path)?,
    );

    let alert_context = AlertContext {
        clock: &clock,
        zone_name: &zone_name,
        now_ms,
        reminder_days: prefs.due_reminder_days(None),
        reminders_enabled: prefs.due_reminders_enabled(None),
        policy,
    };
    let desired = desired_alerts(&state.bills, &state.loans, &alert_context);
    let diff = reconcile_alerts(&desired, &state.unresolved_alerts, now_ms, policy);

    let suggestions = desired_suggestions(&SuggestionInput {
        incomes: &state.incomes,
        rules: &state.rules,
        bills: &state.bills,
        latest_price_by_bill: &state.latest_price_by_bill,
        open_fingerprints: &state.open_suggestion_fingerprints,
        money: &money,
        policy,
    });

    let summary = apply_sweep(connection, db_path, options, now_ms, &cycle_key, &diff, &suggestions)?;

    record_best_effort(
        connection,
        &options.user_id,
        "sweep.run",
        &json!({
            "mode": options.mode.as_str(),
            "cycle_key": summary.cycle_key,
            "alerts_created": summary.alerts_created,
            "alerts_updated": summary.alerts_updated,
            "alerts_resolved": summary.alerts_resolved,
            "suggestions_created": summary.suggestions_created,
        }),
    );

    Ok(summary)
}

fn apply_sweep(
    connection: &mut Connection,
    db_path: &Path,
    options: &SweepOptions,
    now_ms: i64,
    cycle_key: &str,
    diff: &SweepDiff,
    suggestions: &[DesiredSuggestion],
) -> ClientResult<SweepSummary> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut alerts_created = 0_i64;
    for record in &diff.creates {
        let alert_id = format!("alr_{}", Ulid::new());
        transaction
            .execute(
                "INSERT INTO alerts (
                    alert_id, user_id, fingerprint, title, detail, severity,
                    entity_type, entity_id, due_at, cycle_key, status, source,
                    created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    alert_id,
                    &options.user_id,
                    &record.fingerprint,
                    &record.title,
                    &record.detail,
                    record.severity.as_str(),
                    &record.entity_type,
                    &record.entity_id,
                    record.due_at_ms,
                    &record.cycle_key,
                    AlertStatus::Open.as_str(),
                    AlertSource::Automation.as_str(),
                    now_ms,
                    now_ms
                ],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        alerts_created += 1;
    }

    // Zero affected rows means another pass already patched or removed the
    // record; skip rather than fail.
    let mut alerts_updated = 0_i64;
    for update in &diff.updates {
        let affected = transaction
            .execute(
                "UPDATE alerts SET
                    title = ?1,
                    detail = ?2,
                    severity = ?3,
                    due_at = ?4,
                    cycle_key = ?5,
                    status = ?6,
                    updated_at = ?7,
                    resolved_at = NULL
                 WHERE alert_id = ?8",
                params![
                    &update.desired.title,
                    &update.desired.detail,
                    update.desired.severity.as_str(),
                    update.desired.due_at_ms,
                    &update.desired.cycle_key,
                    AlertStatus::Open.as_str(),
                    now_ms,
                    &update.alert_id
                ],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        alerts_updated += i64::try_from(affected).unwrap_or(0);
    }

    let mut alerts_resolved = 0_i64;
    for alert_id in &diff.resolves {
        let affected = transaction
            .execute(
                "UPDATE alerts SET status = ?1, resolved_at = ?2, updated_at = ?2
                 WHERE alert_id = ?3 AND status <> ?1",
                params![AlertStatus::Resolved.as_str(), now_ms, alert_id],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        alerts_resolved += i64::try_from(affected).unwrap_or(0);
    }

    let mut suggestions_created = 0_i64;
    for suggestion in suggestions {
        insert_suggestion(&transaction, db_path, &options.user_id, suggestion, now_ms)?;
        suggestions_created += 1;
    }

    if options.mode == SweepMode::Monthly {
        transaction
            .execute(
                "INSERT OR REPLACE INTO cycle_runs (user_id, cycle_key, mode, completed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![&options.user_id, cycle_key, options.mode.as_str(), now_ms],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    Ok(SweepSummary {
        user_id: options.user_id.clone(),
        mode: options.mode,
        cycle_key: cycle_key.to_string(),
        alerts_created,
        alerts_updated,
        alerts_resolved,
        suggestions_created,
        skipped: false,
        skip_reason: None,
    })
}

fn insert_suggestion(
    transaction: &Transaction<'_>,
    db_path: &Path,
    user_id: &str,
    suggestion: &DesiredSuggestion,
    now_ms: i64,
) -> ClientResult<()> {
    let suggestion_id = format!("sug_{}", Ulid::new());
    transaction
        .execute(
            "INSERT INTO suggestions (
                suggestion_id, user_id, fingerprint, kind, status, payload,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                suggestion_id,
                user_id,
                &suggestion.fingerprint,
                suggestion.kind.as_str(),
                "open",
                suggestion.payload.to_string(),
                now_ms
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    if let Some(observation) = &suggestion.price_observation {
        let event_id = format!("evt_{}", Ulid::new());
        transaction
            .execute(
                "INSERT INTO subscription_price_events (
                    event_id, user_id, bill_id, amount, previous_amount, recorded_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event_id,
                    user_id,
                    &observation.bill_id,
                    observation.amount,
                    observation.previous_amount,
                    now_ms
                ],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok(())
}

fn cycle_run_completed(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    cycle_key: &str,
) -> ClientResult<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM cycle_runs WHERE user_id = ?1 AND cycle_key = ?2 LIMIT 1",
            params![user_id, cycle_key],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(found.unwrap_or(false))
}

fn skipped_summary(options: &SweepOptions, cycle_key: String, reason: &str) -> SweepSummary {
    SweepSummary {
        user_id: options.user_id.clone(),
        mode: options.mode,
        cycle_key,
        alerts_created: 0,
        alerts_updated: 0,
        alerts_resolved: 0,
        suggestions_created: 0,
        skipped: true,
        skip_reason: Some(reason.to_string()),
    }
}

pub const fn policy_version() -> &'static str {
    SWEEP_POLICY_VERSION
}
