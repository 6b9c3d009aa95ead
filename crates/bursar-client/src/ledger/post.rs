use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde_json::json;
use ulid::Ulid;

use crate::audit::record_best_effort;
use crate::clock::now_epoch_ms;
use crate::money::{FxConversion, MoneyConverter, normalize_currency_code};
use crate::prefs::load_preferences;
use crate::state::map_sqlite_error;
use crate::sweep::query::{load_accounts, load_fraction_digits, load_fx_quotes};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub struct SplitInput {
    pub label: Option<String>,
    pub amount: f64,
    pub linked_account_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PurchaseInput {
    pub user_id: String,
    pub merchant: String,
    pub total_amount: f64,
    pub currency: String,
    pub payment_account_id: String,
    pub splits: Vec<SplitInput>,
    /// Test seam; live postings read the wall clock.
    pub posted_at_ms: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PostedLine {
    pub line_id: String,
    pub kind: String,
    pub direction: String,
    pub amount_minor: i64,
    pub currency: String,
    pub label: Option<String>,
    pub linked_account_id: Option<String>,
    pub fx_rate: f64,
    pub fx_base_minor: i64,
    pub fx_base_currency: String,
    pub fx_as_of_ms: i64,
    pub fx_source: String,
    pub fx_synthetic: bool,
}

#[derive(Debug, Clone)]
pub struct PostedPurchase {
    pub purchase_id: String,
    pub entry_id: String,
    pub merchant: String,
    pub total_minor: i64,
    pub currency: String,
    pub base_currency: String,
    pub funding_line: PostedLine,
    pub allocation_lines: Vec<PostedLine>,
}

/// Posts one purchase as a double-sided ledger entry: one funding line for
/// the cash leaving the payment account, one allocation line per split.
/// Validation happens before any write; once validated, FX gaps degrade to
/// flagged synthetic snapshots rather than failing the posting.
///
/// Post-condition: allocation minor amounts sum to exactly the negated
/// funding minor amount, for every currency precision and split count.
pub fn post_purchase(
    connection: &mut Connection,
    db_path: &Path,
    input: &PurchaseInput,
) -> ClientResult<PostedPurchase> {
    let currency = validate_currency(&input.currency)?;
    if !(input.total_amount > 0.0) {
        return Err(ClientError::invalid_amount(
            "Purchase total must be greater than zero.",
        ));
    }
    let merchant = input.merchant.trim();
    if merchant.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Merchant must not be empty.",
            Some("purchase create"),
        ));
    }
    for split in &input.splits {
        if !(split.amount > 0.0) {
            return Err(ClientError::invalid_split(
                "Split amounts must be greater than zero.",
            ));
        }
    }

    // Fail closed on unknown account references before any write.
    let known_accounts: BTreeSet<String> = load_accounts(connection, db_path, &input.user_id)?
        .into_iter()
        .map(|account| account.account_id)
        .collect();
    if !known_accounts.contains(&input.payment_account_id) {
        return Err(ClientError::unknown_account(&input.payment_account_id));
    }
    for split in &input.splits {
        if let Some(linked) = &split.linked_account_id
            && !known_accounts.contains(linked)
        {
            return Err(ClientError::unknown_account(linked));
        }
    }

    let money = MoneyConverter::new(
        load_fraction_digits(connection, db_path)?,
        load_fx_quotes(connection, db_path)?,
    );
    let prefs = load_preferences(connection, db_path, &input.user_id)?;
    let base_currency = prefs.base_currency(None);

    let total_minor = money.to_minor_units(input.total_amount, &currency);
    if total_minor <= 0 {
        return Err(ClientError::invalid_amount(
            "Purchase total rounds to zero in this currency's minor units.",
        ));
    }

    // A caller that supplies no splits gets one covering the full total.
    let splits: Vec<SplitInput> = if input.splits.is_empty() {
        vec![SplitInput {
            label: None,
            amount: input.total_amount,
            linked_account_id: None,
        }]
    } else {
        input.splits.clone()
    };

    let weights: Vec<i64> = splits
        .iter()
        .map(|split| money.to_minor_units(split.amount, &currency))
        .collect();
    let allocated = money.split_allocate(total_minor, &weights);

    let posted_at_ms = input.posted_at_ms.unwrap_or_else(now_epoch_ms);
    let purchase_id = format!("pur_{}", Ulid::new());
    let entry_id = format!("ent_{}", Ulid::new());

    let total_fx = fx_snapshot(&money, input.total_amount, &currency, &base_currency);
    let funding_line = PostedLine {
        line_id: format!("lin_{}", Ulid::new()),
        kind: "funding".to_string(),
        direction: "credit".to_string(),
        amount_minor: -total_minor,
        currency: currency.clone(),
        label: Some(merchant.to_string()),
        linked_account_id: Some(input.payment_account_id.clone()),
        fx_rate: total_fx.rate,
        fx_base_minor: -money.to_minor_units(total_fx.amount, &base_currency),
        fx_base_currency: base_currency.clone(),
        fx_as_of_ms: total_fx.as_of_ms,
        fx_source: total_fx.source,
        fx_synthetic: total_fx.synthetic,
    };

    let mut allocation_lines: Vec<PostedLine> = Vec::with_capacity(splits.len());
    for (split, amount_minor) in splits.iter().zip(allocated.iter()) {
        let split_major = money.from_minor_units(*amount_minor, &currency);
        let split_fx = fx_snapshot(&money, split_major, &currency, &base_currency);
        allocation_lines.push(PostedLine {
            line_id: format!("lin_{}", Ulid::new()),
            kind: "allocation".to_string(),
            direction: "debit".to_string(),
            amount_minor: *amount_minor,
            currency: currency.clone(),
            label: split.label.clone(),
            linked_account_id: split.linked_account_id.clone(),
            fx_rate: split_fx.rate,
            fx_base_minor: money.to_minor_units(split_fx.amount, &base_currency),
            fx_base_currency: base_currency.clone(),
            fx_as_of_ms: split_fx.as_of_ms,
            fx_source: split_fx.source,
            fx_synthetic: split_fx.synthetic,
        });
    }

    persist_posting(
        connection,
        db_path,
        input,
        merchant,
        &purchase_id,
        &entry_id,
        total_minor,
        &currency,
        posted_at_ms,
        &funding_line,
        &allocation_lines,
    )?;

    record_best_effort(
        connection,
        &input.user_id,
        "purchase.post",
        &json!({
            "purchase_id": purchase_id,
            "merchant": merchant,
            "total_minor": total_minor,
            "currency": currency,
            "base_currency": base_currency,
            "allocation_lines": allocation_lines.len(),
            "fx_synthetic": funding_line.fx_synthetic,
        }),
    );

    Ok(PostedPurchase {
        purchase_id,
        entry_id,
        merchant: merchant.to_string(),
        total_minor,
        currency,
        base_currency,
        funding_line,
        allocation_lines,
    })
}

fn fx_snapshot(
    money: &MoneyConverter,
    amount: f64,
    currency: &str,
    base_currency: &str,
) -> FxConversion {
    money.convert(amount, currency, base_currency)
}

#[allow(clippy::too_many_arguments)]
fn persist_posting(
    connection: &mut Connection,
    db_path: &Path,
    input: &PurchaseInput,
    merchant: &str,
    purchase_id: &str,
    entry_id: &str,
    total_minor: i64,
    currency: &str,
    posted_at_ms: i64,
    funding_line: &PostedLine,
    allocation_lines: &[PostedLine],
) -> ClientResult<()> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    transaction
        .execute(
            "INSERT INTO purchases (
                purchase_id, user_id, merchant, total_minor, currency,
                payment_account_id, posted_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                purchase_id,
                &input.user_id,
                merchant,
                total_minor,
                currency,
                &input.payment_account_id,
                posted_at_ms
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    transaction
        .execute(
            "INSERT INTO ledger_entries (
                entry_id, user_id, purchase_id, amount_minor, currency, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry_id,
                &input.user_id,
                purchase_id,
                -total_minor,
                currency,
                posted_at_ms
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    insert_line(&transaction, db_path, entry_id, funding_line)?;
    for line in allocation_lines {
        insert_line(&transaction, db_path, entry_id, line)?;
    }

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

fn insert_line(
    transaction: &Transaction<'_>,
    db_path: &Path,
    entry_id: &str,
    line: &PostedLine,
) -> ClientResult<()> {
    transaction
        .execute(
            "INSERT INTO ledger_lines (
                line_id, entry_id, kind, direction, amount_minor, currency,
                label, linked_account_id, fx_rate, fx_base_minor,
                fx_base_currency, fx_as_of, fx_source, fx_synthetic
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                &line.line_id,
                entry_id,
                &line.kind,
                &line.direction,
                line.amount_minor,
                &line.currency,
                &line.label,
                &line.linked_account_id,
                line.fx_rate,
                line.fx_base_minor,
                &line.fx_base_currency,
                line.fx_as_of_ms,
                &line.fx_source,
                if line.fx_synthetic { 1_i64 } else { 0_i64 }
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

fn validate_currency(code: &str) -> ClientResult<String> {
    let normalized = normalize_currency_code(code);
    if normalized.len() != 3 || !normalized.bytes().all(|byte| byte.is_ascii_alphabetic()) {
        return Err(ClientError::unknown_currency(code));
    }
    Ok(normalized)
}
