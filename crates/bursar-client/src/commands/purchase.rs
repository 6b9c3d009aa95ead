use std::path::Path;

use crate::commands::common::{load_setup, resolve_user};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{LedgerLineRow, PurchaseData};
use crate::ledger::{PostedLine, PurchaseInput, SplitInput, post_purchase};
use crate::state::open_connection;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct PurchaseCreateOptions<'a> {
    pub merchant: String,
    pub amount: f64,
    pub currency: String,
    pub payment_account_id: String,
    pub splits: Vec<String>,
    pub user: Option<String>,
    pub now_ms: Option<i64>,
    pub home_override: Option<&'a Path>,
}

pub fn create(
    merchant: &str,
    amount: f64,
    currency: &str,
    payment_account_id: &str,
    splits: &[String],
    user: Option<&str>,
) -> ClientResult<SuccessEnvelope> {
    create_with_options(PurchaseCreateOptions {
        merchant: merchant.to_string(),
        amount,
        currency: currency.to_string(),
        payment_account_id: payment_account_id.to_string(),
        splits: splits.to_vec(),
        user: user.map(std::string::ToString::to_string),
        now_ms: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn create_with_options(options: PurchaseCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let mut connection = open_connection(&setup.db_path)?;

    let mut splits: Vec<SplitInput> = Vec::with_capacity(options.splits.len());
    for raw in &options.splits {
        splits.push(parse_split_arg(raw)?);
    }

    let input = PurchaseInput {
        user_id: resolve_user(options.user.as_deref()),
        merchant: options.merchant.clone(),
        total_amount: options.amount,
        currency: options.currency.clone(),
        payment_account_id: options.payment_account_id.clone(),
        splits,
        posted_at_ms: options.now_ms,
    };
    let posted = post_purchase(&mut connection, &setup.db_path, &input)?;

    let mut lines: Vec<LedgerLineRow> = Vec::with_capacity(posted.allocation_lines.len() + 1);
    lines.push(line_row(&posted.funding_line));
    lines.extend(posted.allocation_lines.iter().map(line_row));

    let data = PurchaseData {
        purchase_id: posted.purchase_id,
        entry_id: posted.entry_id,
        merchant: posted.merchant,
        total_minor: posted.total_minor,
        currency: posted.currency,
        base_currency: posted.base_currency,
        lines,
    };
    success("purchase create", data)
}

/// One `--split` argument: `label=amount` or `label=amount:account_id`.
pub fn parse_split_arg(raw: &str) -> ClientResult<SplitInput> {
    let trimmed = raw.trim();
    let Some((label, remainder)) = trimmed.split_once('=') else {
        return Err(ClientError::invalid_split(&format!(
            "Split `{trimmed}` is missing the `label=amount` separator."
        )));
    };

    let label = label.trim();
    if label.is_empty() {
        return Err(ClientError::invalid_split(&format!(
            "Split `{trimmed}` has an empty label."
        )));
    }

    let (amount_part, account_part) = match remainder.split_once(':') {
        Some((amount, account)) => (amount.trim(), Some(account.trim())),
        None => (remainder.trim(), None),
    };

    let Ok(amount) = amount_part.parse::<f64>() else {
        return Err(ClientError::invalid_split(&format!(
            "Split `{trimmed}` has a non-numeric amount `{amount_part}`."
        )));
    };

    Ok(SplitInput {
        label: Some(label.to_string()),
        amount,
        linked_account_id: account_part
            .filter(|value| !value.is_empty())
            .map(std::string::ToString::to_string),
    })
}

fn line_row(line: &PostedLine) -> LedgerLineRow {
    LedgerLineRow {
        line_id: line.line_id.clone(),
        kind: line.kind.clone(),
        direction: line.direction.clone(),
        amount_minor: line.amount_minor,
        currency: line.currency.clone(),
        label: line.label.clone(),
        linked_account_id: line.linked_account_id.clone(),
        fx_rate: line.fx_rate,
        fx_base_minor: line.fx_base_minor,
        fx_base_currency: line.fx_base_currency.clone(),
        fx_source: line.fx_source.clone(),
        fx_synthetic: line.fx_synthetic,
    }
}
