use std::path::Path;

use rusqlite::{Connection, params};

use crate::ClientResult;
use crate::clock::now_epoch_ms;
use crate::state::map_sqlite_error;

/// Deterministic sample household used by the `demo` commands: two accounts,
/// one payroll income with no covering rule, a rent and internet bill, one
/// subscription, one EUR bill, a car loan, and USD quotes for EUR/GBP/JPY.
/// Seeding is idempotent so demo commands can be re-run freely.
pub fn seed_sample_household(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<()> {
    let now_ms = now_epoch_ms();

    let accounts: [(&str, &str, &str, &str); 3] = [
        ("acct_checking", "Everyday checking", "checking", "USD"),
        ("acct_savings", "Rainy-day savings", "savings", "USD"),
        ("acct_credit", "Household card", "credit_card", "USD"),
    ];
    for (account_id, name, kind, currency) in accounts {
        connection
            .execute(
                "INSERT OR IGNORE INTO accounts (
                    account_id, user_id, name, kind, currency, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![account_id, user_id, name, kind, currency, now_ms],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    connection
        .execute(
            "INSERT OR IGNORE INTO incomes (
                income_id, user_id, source, amount, currency, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                "inc_payroll",
                user_id,
                "ACME CORP PAYROLL",
                4_200.0,
                "USD",
                now_ms
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let bills: [(&str, &str, f64, &str, i64, Option<&str>, i64); 4] = [
        ("bill_rent", "Rent", 1_650.0, "USD", 1, None, 0),
        ("bill_internet", "Internet", 79.99, "USD", 12, None, 0),
        (
            "bill_streambox",
            "StreamBox",
            15.99,
            "USD",
            5,
            Some("Subscriptions"),
            1,
        ),
        ("bill_gym", "Gym", 35.0, "EUR", 20, None, 0),
    ];
    for (bill_id, name, amount, currency, due_day, category, is_subscription) in bills {
        connection
            .execute(
                "INSERT OR IGNORE INTO bills (
                    bill_id, user_id, name, amount, currency, cadence, due_day,
                    category, is_subscription, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, 'monthly', ?6, ?7, ?8, ?9)",
                params![
                    bill_id,
                    user_id,
                    name,
                    amount,
                    currency,
                    due_day,
                    category,
                    is_subscription,
                    now_ms
                ],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    connection
        .execute(
            "INSERT OR IGNORE INTO loans (
                loan_id, user_id, name, payment_amount, currency, payment_day, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                "loan_car",
                user_id,
                "Car loan",
                312.50,
                "USD",
                15,
                now_ms
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    // Deliberately does not match the payroll income, so the demo sweep
    // surfaces an income-allocation suggestion.
    connection
        .execute(
            "INSERT OR IGNORE INTO allocation_rules (
                rule_id, user_id, name, match_mode, pattern, enabled, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                "rule_freelance",
                user_id,
                "Freelance autosave",
                "contains",
                "freelance",
                now_ms
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let quotes: [(&str, f64); 3] = [("EUR", 0.92), ("GBP", 0.79), ("JPY", 155.0)];
    for (currency, rate) in quotes {
        connection
            .execute(
                "INSERT OR IGNORE INTO fx_rates (currency, rate_per_usd, as_of, source, synthetic)
                 VALUES (?1, ?2, ?3, 'sample', 0)",
                params![currency, rate, now_ms],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok(())
}
