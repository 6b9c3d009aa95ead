mod support;

use serde_json::Value;
use support::testkit::{
    alert_rows, delete_bill, open_initialized, seed_monthly_bill, set_preference, sweep_at,
    temp_home_in_tmp, utc_ms,
};

#[test]
fn due_reminder_scenario_creates_one_medium_alert_with_clamped_due_date() {
    let temp = temp_home_in_tmp("bursar-sweep-scenario");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_monthly_bill(&connection, "bill_1", 50.0, 31);
            set_preference(&connection, "user", "due_reminders_enabled", "true");
            set_preference(&connection, "user", "due_reminder_days", "3");
        }

        let now = utc_ms(2024, 2, 25, 12, 0);
        let payload = sweep_at(&home, "hourly", now);
        assert_eq!(payload["data"]["alerts_created"], 1);
        assert_eq!(payload["data"]["cycle_key"], "2024-02");
        assert_eq!(payload["data"]["policy_version"], "sweep/v1");

        let rows = alert_rows(&home, Some("open"));
        assert_eq!(rows.len(), 1);
        let alert = &rows[0];
        assert_eq!(alert["fingerprint"], "bill-due:bill_1:31");
        assert_eq!(alert["severity"], "medium");
        assert_eq!(alert["source"], "automation");
        // Day 31 clamps to Feb 29 in the 2024 leap year; due hour is 09:00
        // in the user's (UTC) zone.
        assert_eq!(
            alert["due_at"].as_i64(),
            Some(utc_ms(2024, 2, 29, 9, 0))
        );
    }
}

#[test]
fn rerunning_an_unchanged_sweep_is_idempotent() {
    let temp = temp_home_in_tmp("bursar-sweep-idempotent");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_monthly_bill(&connection, "bill_1", 50.0, 28);
        }

        let now = utc_ms(2024, 2, 26, 12, 0);
        let first = sweep_at(&home, "hourly", now);
        assert_eq!(first["data"]["alerts_created"], 1);

        let second = sweep_at(&home, "hourly", now);
        assert_eq!(second["data"]["alerts_created"], 0);
        assert_eq!(second["data"]["alerts_updated"], 1);
        assert_eq!(second["data"]["alerts_resolved"], 0);

        // Still exactly one open record for the fingerprint.
        let rows = alert_rows(&home, Some("open"));
        assert_eq!(rows.len(), 1);
    }
}

#[test]
fn disappearing_conditions_resolve_automated_alerts() {
    let temp = temp_home_in_tmp("bursar-sweep-resolve");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_monthly_bill(&connection, "bill_1", 50.0, 28);
        }

        let now = utc_ms(2024, 2, 26, 12, 0);
        sweep_at(&home, "hourly", now);

        {
            let connection = open_initialized(&home);
            delete_bill(&connection, "bill_1");
        }
        let second = sweep_at(&home, "hourly", now);
        assert_eq!(second["data"]["alerts_resolved"], 1);

        let open_rows = alert_rows(&home, Some("open"));
        assert!(open_rows.is_empty());
        let resolved_rows = alert_rows(&home, Some("resolved"));
        assert_eq!(resolved_rows.len(), 1);
        assert!(resolved_rows[0]["resolved_at"].is_i64());

        // A third run with the condition still gone changes nothing.
        let third = sweep_at(&home, "hourly", now);
        assert_eq!(third["data"]["alerts_resolved"], 0);
        assert_eq!(third["data"]["alerts_created"], 0);
    }
}

#[test]
fn manually_created_alerts_survive_reconciliation() {
    let temp = temp_home_in_tmp("bursar-sweep-manual");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            let inserted = connection.execute(
                "INSERT INTO alerts (alert_id, user_id, fingerprint, title, detail, severity,
                                     entity_type, entity_id, status, source, created_at, updated_at)
                 VALUES ('alr_manual', 'usr_local', 'note:remortgage', 'Check remortgage rates',
                         'Manually tracked.', 'low', 'note', 'note_1', 'open', 'manual', 0, 0)",
                [],
            );
            assert!(inserted.is_ok());
        }

        let payload = sweep_at(&home, "hourly", utc_ms(2024, 2, 26, 12, 0));
        assert_eq!(payload["data"]["alerts_resolved"], 0);

        let rows = alert_rows(&home, Some("open"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["source"], "manual");
    }
}

#[test]
fn snoozed_alerts_only_rejoin_after_their_due_instant_passes() {
    let temp = temp_home_in_tmp("bursar-sweep-snooze");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_monthly_bill(&connection, "bill_1", 50.0, 28);
        }
        sweep_at(&home, "hourly", utc_ms(2024, 2, 26, 12, 0));

        {
            let connection = open_initialized(&home);
            let snoozed = connection.execute(
                "UPDATE alerts SET status = 'snoozed' WHERE fingerprint = 'bill-due:bill_1:28'",
                [],
            );
            assert!(snoozed.is_ok());
        }

        // The snooze target (Feb 28 09:00) is still ahead: the snoozed
        // record is invisible, so the still-true condition creates a fresh
        // open record under the same fingerprint.
        let while_snoozed = sweep_at(&home, "hourly", utc_ms(2024, 2, 26, 13, 0));
        assert_eq!(while_snoozed["data"]["alerts_created"], 1);
        assert_eq!(while_snoozed["data"]["alerts_resolved"], 0);

        // Re-point the snooze into the past while the bill is still inside
        // the reminder window: the expired snooze rejoins matching, absorbs
        // the update as the oldest record, and the surplus duplicate created
        // while it was snoozed resolves. The set converges back to one
        // record per fingerprint.
        {
            let connection = open_initialized(&home);
            let repointed = connection.execute(
                "UPDATE alerts SET due_at = ?1 WHERE status = 'snoozed'",
                [utc_ms(2024, 2, 26, 9, 0)],
            );
            assert!(repointed.is_ok());
        }
        let expired = sweep_at(&home, "hourly", utc_ms(2024, 2, 26, 14, 0));
        assert_eq!(expired["data"]["alerts_created"].as_i64(), Some(0));
        assert_eq!(expired["data"]["alerts_updated"].as_i64(), Some(1));
        assert_eq!(expired["data"]["alerts_resolved"].as_i64(), Some(1));
        assert_eq!(alert_rows(&home, Some("open")).len(), 1);
    }
}

#[test]
fn monthly_mode_is_gated_by_flag_and_cycle_completion() {
    let temp = temp_home_in_tmp("bursar-sweep-monthly");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_monthly_bill(&connection, "bill_1", 50.0, 28);
        }
        let now = utc_ms(2024, 2, 26, 12, 0);

        // Disabled by default.
        let disabled = sweep_at(&home, "monthly", now);
        assert_eq!(disabled["data"]["skipped"], true);
        assert!(alert_rows(&home, None).is_empty());

        {
            let connection = open_initialized(&home);
            set_preference(&connection, "user", "monthly_cycle_enabled", "true");
        }

        let enabled = sweep_at(&home, "monthly", now);
        assert_eq!(enabled["data"]["skipped"], false);
        assert_eq!(enabled["data"]["alerts_created"], 1);

        // Same cycle again: skipped as already completed.
        let repeat = sweep_at(&home, "monthly", utc_ms(2024, 2, 27, 12, 0));
        assert_eq!(repeat["data"]["skipped"], true);
        let reason = repeat["data"]["skip_reason"].as_str().unwrap_or_default();
        assert!(reason.contains("already completed"));

        // Hourly mode ignores the gate entirely.
        let hourly = sweep_at(&home, "hourly", utc_ms(2024, 2, 27, 12, 0));
        assert_eq!(hourly["data"]["skipped"], false);
    }
}

#[test]
fn reminders_disabled_preference_suppresses_alerts_but_not_resolution() {
    let temp = temp_home_in_tmp("bursar-sweep-disabled");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_monthly_bill(&connection, "bill_1", 50.0, 28);
        }
        let now = utc_ms(2024, 2, 26, 12, 0);
        let first = sweep_at(&home, "hourly", now);
        assert_eq!(first["data"]["alerts_created"], 1);

        {
            let connection = open_initialized(&home);
            set_preference(&connection, "user", "due_reminders_enabled", "false");
        }

        // Desired set is now empty, so the open automated alert resolves.
        let second = sweep_at(&home, "hourly", now);
        assert_eq!(second["data"]["alerts_created"], 0);
        assert_eq!(second["data"]["alerts_resolved"], 1);
    }
}

#[test]
fn sweeps_write_best_effort_audit_records() {
    let temp = temp_home_in_tmp("bursar-sweep-audit");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_monthly_bill(&connection, "bill_1", 50.0, 28);
        }
        sweep_at(&home, "hourly", utc_ms(2024, 2, 26, 12, 0));

        let connection = open_initialized(&home);
        let count = connection.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE action = 'sweep.run'",
            [],
            |row| row.get::<_, i64>(0),
        );
        assert!(count.is_ok());
        if let Ok(rows) = count {
            assert_eq!(rows, 1);
        }
    }
}

#[test]
fn timezone_preference_shifts_cycle_keys() {
    let temp = temp_home_in_tmp("bursar-sweep-zone");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            set_preference(&connection, "user", "timezone", "America/Los_Angeles");
        }

        // 2024-03-01 02:00 UTC is still February in Los Angeles.
        let payload = sweep_at(&home, "hourly", utc_ms(2024, 3, 1, 2, 0));
        assert_eq!(payload["data"]["cycle_key"], "2024-02");
    }
}

#[test]
fn sweep_summaries_expose_the_contract_fields() {
    let temp = temp_home_in_tmp("bursar-sweep-contract");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let payload = sweep_at(&home, "manual", utc_ms(2024, 2, 26, 12, 0));
        let data = &payload["data"];
        assert_eq!(data["mode"], "manual");
        assert_eq!(data["user_id"], "usr_local");
        assert!(data["cycle_key"].is_string());
        assert!(data["alerts_created"].is_i64());
        assert!(data["alerts_updated"].is_i64());
        assert!(data["alerts_resolved"].is_i64());
        assert!(data["suggestions_created"].is_i64());
        assert_eq!(data["skipped"], Value::Bool(false));
    }
}
