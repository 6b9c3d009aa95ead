mod support;

use serde_json::Value;
use support::testkit::{
    open_initialized, seed_income, seed_monthly_bill, seed_rule, seed_subscription_bill,
    suggestion_rows, sweep_at, temp_home_in_tmp, update_bill_amount, utc_ms,
};

fn fingerprints(rows: &[Value]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get("fingerprint").and_then(Value::as_str))
        .map(std::string::ToString::to_string)
        .collect()
}

#[test]
fn uncovered_income_surfaces_one_allocation_suggestion_until_reviewed() {
    let temp = temp_home_in_tmp("bursar-suggest-income");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_income(&connection, "inc_payroll", "ACME CORP PAYROLL", 4_200.0);
            seed_monthly_bill(&connection, "bill_rent", 1_650.0, 1);
        }

        let now = utc_ms(2024, 2, 20, 12, 0);
        let first = sweep_at(&home, "hourly", now);
        assert_eq!(first["data"]["suggestions_created"], 1);

        let rows = suggestion_rows(&home, Some("open"));
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["fingerprint"], "income-allocation:inc_payroll");
        assert_eq!(row["kind"], "income_allocation");

        let buckets = row["payload"]["buckets"].as_array().cloned().unwrap_or_default();
        assert_eq!(buckets.len(), 3);
        let total: i64 = buckets
            .iter()
            .map(|bucket| bucket["percent"].as_i64().unwrap_or(0))
            .sum();
        assert_eq!(total, 100);

        // Re-running while the suggestion is open never duplicates it.
        let second = sweep_at(&home, "hourly", now);
        assert_eq!(second["data"]["suggestions_created"], 0);
        assert_eq!(suggestion_rows(&home, Some("open")).len(), 1);
    }
}

#[test]
fn covering_rule_prevents_income_suggestions() {
    let temp = temp_home_in_tmp("bursar-suggest-covered");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_income(&connection, "inc_payroll", "ACME CORP PAYROLL", 4_200.0);
            seed_rule(&connection, "rule_payroll", "contains", "acme");
        }

        let payload = sweep_at(&home, "hourly", utc_ms(2024, 2, 20, 12, 0));
        assert_eq!(payload["data"]["suggestions_created"], 0);
    }
}

#[test]
fn malformed_regex_rules_do_not_abort_the_sweep() {
    let temp = temp_home_in_tmp("bursar-suggest-regex");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_income(&connection, "inc_payroll", "ACME CORP PAYROLL", 4_200.0);
            seed_rule(&connection, "rule_broken", "regex", "([unclosed");
        }

        let payload = sweep_at(&home, "hourly", utc_ms(2024, 2, 20, 12, 0));
        // The broken rule matches nothing, so the income still surfaces.
        assert_eq!(payload["data"]["suggestions_created"], 1);
    }
}

#[test]
fn subscription_baseline_then_price_change_mints_new_fingerprints() {
    let temp = temp_home_in_tmp("bursar-suggest-price");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_subscription_bill(&connection, "bill_stream", 15.99, 5);
        }
        let now = utc_ms(2024, 2, 20, 12, 0);

        let first = sweep_at(&home, "hourly", now);
        assert_eq!(first["data"]["suggestions_created"], 1);
        let rows = suggestion_rows(&home, Some("open"));
        assert_eq!(
            fingerprints(&rows),
            vec!["subscription:bill_stream:baseline:1599".to_string()]
        );
        assert_eq!(rows[0]["payload"]["observation"], "baseline");

        // Unchanged amount: nothing new even though the baseline is open.
        let second = sweep_at(&home, "hourly", now);
        assert_eq!(second["data"]["suggestions_created"], 0);

        // A one-cent change is a new logical condition with a new
        // fingerprint, not a duplicate of the old one.
        {
            let connection = open_initialized(&home);
            update_bill_amount(&connection, "bill_stream", 16.00);
        }
        let third = sweep_at(&home, "hourly", now);
        assert_eq!(third["data"]["suggestions_created"], 1);

        let after_change = suggestion_rows(&home, Some("open"));
        let prints = fingerprints(&after_change);
        assert!(prints.contains(&"subscription:bill_stream:change:1600".to_string()));
        assert_eq!(prints.len(), 2);

        let change_row = after_change
            .iter()
            .find(|row| row["fingerprint"] == "subscription:bill_stream:change:1600")
            .cloned()
            .unwrap_or(Value::Null);
        assert_eq!(change_row["payload"]["previous_amount"], 15.99);
        assert!(change_row["payload"]["delta_pct"].is_f64());

        // Repeated sweeps before review do not duplicate the change record.
        let fourth = sweep_at(&home, "hourly", now);
        assert_eq!(fourth["data"]["suggestions_created"], 0);
    }
}

#[test]
fn sub_half_cent_drift_is_treated_as_unchanged() {
    let temp = temp_home_in_tmp("bursar-suggest-tolerance");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_subscription_bill(&connection, "bill_stream", 15.99, 5);
        }
        let now = utc_ms(2024, 2, 20, 12, 0);
        sweep_at(&home, "hourly", now);

        {
            let connection = open_initialized(&home);
            update_bill_amount(&connection, "bill_stream", 15.994);
        }
        let payload = sweep_at(&home, "hourly", now);
        assert_eq!(payload["data"]["suggestions_created"], 0);
    }
}

#[test]
fn dismissed_suggestions_free_the_fingerprint_for_recreation() {
    let temp = temp_home_in_tmp("bursar-suggest-dismissed");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        {
            let connection = open_initialized(&home);
            seed_income(&connection, "inc_payroll", "ACME CORP PAYROLL", 4_200.0);
        }
        let now = utc_ms(2024, 2, 20, 12, 0);
        sweep_at(&home, "hourly", now);

        // User review happens outside the sweep; simulate a dismissal.
        {
            let connection = open_initialized(&home);
            let dismissed = connection.execute(
                "UPDATE suggestions SET status = 'dismissed', reviewed_at = 1
                 WHERE fingerprint = 'income-allocation:inc_payroll'",
                [],
            );
            assert!(dismissed.is_ok());
        }

        // Only the open-fingerprint check gates creation, so the condition
        // surfaces again as a fresh open record.
        let payload = sweep_at(&home, "hourly", now);
        assert_eq!(payload["data"]["suggestions_created"], 1);
        assert_eq!(suggestion_rows(&home, Some("open")).len(), 1);
        assert_eq!(suggestion_rows(&home, Some("dismissed")).len(), 1);
    }
}
