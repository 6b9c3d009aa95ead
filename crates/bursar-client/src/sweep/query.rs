use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rusqlite::Connection;

use crate::ClientResult;
use crate::money::FxQuote;
use crate::state::map_sqlite_error;
use crate::sweep::normalize::{
    AccountColumns, AlertColumns, BillColumns, IncomeColumns, LoanColumns, RuleColumns,
    account_from_columns, alert_from_columns, bill_from_columns, income_from_columns,
    loan_from_columns, rule_from_columns, suggestion_status_from_column,
};
use crate::sweep::types::{
    Account, AllocationRule, Bill, IncomeSource, Loan, StoredAlert, SuggestionStatus,
};

/// One user's full sweep snapshot, loaded up front so the engines run over a
/// consistent in-memory view.
#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub accounts: Vec<Account>,
    pub incomes: Vec<IncomeSource>,
    pub bills: Vec<Bill>,
    pub loans: Vec<Loan>,
    pub rules: Vec<AllocationRule>,
    pub unresolved_alerts: Vec<StoredAlert>,
    pub open_suggestion_fingerprints: BTreeSet<String>,
    pub latest_price_by_bill: BTreeMap<String, f64>,
}

pub fn load_user_state(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<UserState> {
    Ok(UserState {
        accounts: load_accounts(connection, db_path, user_id)?,
        incomes: load_incomes(connection, db_path, user_id)?,
        bills: load_bills(connection, db_path, user_id)?,
        loans: load_loans(connection, db_path, user_id)?,
        rules: load_rules(connection, db_path, user_id)?,
        unresolved_alerts: load_unresolved_alerts(connection, db_path, user_id)?,
        open_suggestion_fingerprints: load_open_suggestion_fingerprints(
            connection, db_path, user_id,
        )?,
        latest_price_by_bill: load_latest_price_events(connection, db_path, user_id)?,
    })
}

pub fn load_accounts(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Vec<Account>> {
    let mut statement = connection
        .prepare(
            "SELECT account_id, name, kind, currency
             FROM accounts
             WHERE user_id = ?1
             ORDER BY account_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            Ok(AccountColumns {
                account_id: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                currency: row.get(3)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut accounts: Vec<Account> = Vec::new();
    for row in rows_iter {
        let columns = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        accounts.push(account_from_columns(columns));
    }
    Ok(accounts)
}

fn load_incomes(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Vec<IncomeSource>> {
    let mut statement = connection
        .prepare(
            "SELECT income_id, source, amount, currency
             FROM incomes
             WHERE user_id = ?1
             ORDER BY income_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            Ok(IncomeColumns {
                income_id: row.get(0)?,
                source: row.get(1)?,
                amount: row.get(2)?,
                currency: row.get(3)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut incomes: Vec<IncomeSource> = Vec::new();
    for row in rows_iter {
        let columns = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        incomes.push(income_from_columns(columns));
    }
    Ok(incomes)
}

fn load_bills(connection: &Connection, db_path: &Path, user_id: &str) -> ClientResult<Vec<Bill>> {
    let mut statement = connection
        .prepare(
            "SELECT bill_id, name, amount, currency, cadence, due_day,
                    interval_days, anchor_at, category, is_subscription
             FROM bills
             WHERE user_id = ?1
             ORDER BY bill_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            Ok(BillColumns {
                bill_id: row.get(0)?,
                name: row.get(1)?,
                amount: row.get(2)?,
                currency: row.get(3)?,
                cadence: row.get(4)?,
                due_day: row.get(5)?,
                interval_days: row.get(6)?,
                anchor_at: row.get(7)?,
                category: row.get(8)?,
                is_subscription: row.get(9)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut bills: Vec<Bill> = Vec::new();
    for row in rows_iter {
        let columns = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        bills.push(bill_from_columns(columns));
    }
    Ok(bills)
}

fn load_loans(connection: &Connection, db_path: &Path, user_id: &str) -> ClientResult<Vec<Loan>> {
    let mut statement = connection
        .prepare(
            "SELECT loan_id, name, payment_amount, currency, payment_day
             FROM loans
             WHERE user_id = ?1
             ORDER BY loan_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            Ok(LoanColumns {
                loan_id: row.get(0)?,
                name: row.get(1)?,
                payment_amount: row.get(2)?,
                currency: row.get(3)?,
                payment_day: row.get(4)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut loans: Vec<Loan> = Vec::new();
    for row in rows_iter {
        let columns = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        loans.push(loan_from_columns(columns));
    }
    Ok(loans)
}

fn load_rules(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Vec<AllocationRule>> {
    let mut statement = connection
        .prepare(
            "SELECT rule_id, name, match_mode, pattern, enabled
             FROM allocation_rules
             WHERE user_id = ?1
             ORDER BY rule_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            Ok(RuleColumns {
                rule_id: row.get(0)?,
                name: row.get(1)?,
                match_mode: row.get(2)?,
                pattern: row.get(3)?,
                enabled: row.get(4)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rules: Vec<AllocationRule> = Vec::new();
    for row in rows_iter {
        let columns = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        rules.push(rule_from_columns(columns));
    }
    Ok(rules)
}

fn load_unresolved_alerts(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Vec<StoredAlert>> {
    let mut statement = connection
        .prepare(
            "SELECT alert_id, fingerprint, status, source, due_at
             FROM alerts
             WHERE user_id = ?1 AND status <> 'resolved'
             ORDER BY alert_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            Ok(AlertColumns {
                alert_id: row.get(0)?,
                fingerprint: row.get(1)?,
                status: row.get(2)?,
                source: row.get(3)?,
                due_at: row.get(4)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut alerts: Vec<StoredAlert> = Vec::new();
    for row in rows_iter {
        let columns = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        alerts.push(alert_from_columns(columns));
    }
    Ok(alerts)
}

fn load_open_suggestion_fingerprints(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<BTreeSet<String>> {
    let mut statement = connection
        .prepare(
            "SELECT fingerprint, status
             FROM suggestions
             WHERE user_id = ?1",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            let fingerprint: String = row.get(0)?;
            let status: Option<String> = row.get(1)?;
            Ok((fingerprint, status))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut fingerprints: BTreeSet<String> = BTreeSet::new();
    for row in rows_iter {
        let (fingerprint, status) = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        if suggestion_status_from_column(status.as_deref()) == SuggestionStatus::Open {
            fingerprints.insert(fingerprint);
        }
    }
    Ok(fingerprints)
}

/// Latest observed subscription amount per bill, by recording order.
fn load_latest_price_events(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<BTreeMap<String, f64>> {
    let mut statement = connection
        .prepare(
            "SELECT bill_id, amount
             FROM subscription_price_events
             WHERE user_id = ?1
             ORDER BY recorded_at ASC, event_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_id], |row| {
            let bill_id: String = row.get(0)?;
            let amount: f64 = row.get(1)?;
            Ok((bill_id, amount))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut latest: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows_iter {
        let (bill_id, amount) = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        latest.insert(bill_id, amount);
    }
    Ok(latest)
}

pub fn load_fraction_digits(
    connection: &Connection,
    db_path: &Path,
) -> ClientResult<BTreeMap<String, u32>> {
    let mut statement = connection
        .prepare("SELECT currency, fraction_digits FROM currency_meta")
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([], |row| {
            let currency: String = row.get(0)?;
            let digits: i64 = row.get(1)?;
            Ok((currency, digits))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut digits_by_currency: BTreeMap<String, u32> = BTreeMap::new();
    for row in rows_iter {
        let (currency, digits) = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        let clamped = u32::try_from(digits.clamp(0, 8)).unwrap_or(2);
        digits_by_currency.insert(currency, clamped);
    }
    Ok(digits_by_currency)
}

pub fn load_fx_quotes(
    connection: &Connection,
    db_path: &Path,
) -> ClientResult<BTreeMap<String, FxQuote>> {
    let mut statement = connection
        .prepare("SELECT currency, rate_per_usd, as_of, source, synthetic FROM fx_rates")
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([], |row| {
            let currency: String = row.get(0)?;
            let rate: f64 = row.get(1)?;
            let as_of_ms: i64 = row.get(2)?;
            let source: String = row.get(3)?;
            let synthetic: i64 = row.get(4)?;
            Ok((
                currency,
                FxQuote {
                    rate,
                    as_of_ms,
                    source,
                    synthetic: synthetic != 0,
                },
            ))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut quotes: BTreeMap<String, FxQuote> = BTreeMap::new();
    for row in rows_iter {
        let (currency, quote) = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        quotes.insert(currency, quote);
    }
    Ok(quotes)
}
