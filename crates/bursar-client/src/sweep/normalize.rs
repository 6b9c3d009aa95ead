use serde_json::{Value, json};

use crate::sweep::types::{
    Account, AlertSource, AlertStatus, AllocationRule, Bill, BillCadence, IncomeSource, Loan,
    MatchMode, StoredAlert, SuggestionStatus,
};

/// One boundary function per entity keeps schema drift in one place: raw
/// column values come in, a normalized struct with defaults for missing or
/// legacy fields comes out.

pub struct AccountColumns {
    pub account_id: String,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub currency: Option<String>,
}

pub fn account_from_columns(columns: AccountColumns) -> Account {
    Account {
        name: non_empty_or(columns.name, &columns.account_id),
        kind: non_empty_or(columns.kind, "checking"),
        currency: currency_or_usd(columns.currency),
        account_id: columns.account_id,
    }
}

pub struct IncomeColumns {
    pub income_id: String,
    pub source: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

pub fn income_from_columns(columns: IncomeColumns) -> IncomeSource {
    IncomeSource {
        income_id: columns.income_id,
        source: columns.source.map(|value| value.trim().to_string()).unwrap_or_default(),
        amount: columns.amount.filter(|value| value.is_finite()).unwrap_or(0.0),
        currency: currency_or_usd(columns.currency),
    }
}

pub struct BillColumns {
    pub bill_id: String,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub cadence: Option<String>,
    pub due_day: Option<i64>,
    pub interval_days: Option<i64>,
    pub anchor_at: Option<i64>,
    pub category: Option<String>,
    pub is_subscription: Option<i64>,
}

pub fn bill_from_columns(columns: BillColumns) -> Bill {
    Bill {
        name: non_empty_or(columns.name, &columns.bill_id),
        amount: columns.amount.filter(|value| value.is_finite()).unwrap_or(0.0),
        currency: currency_or_usd(columns.currency),
        cadence: BillCadence::parse_or_default(columns.cadence.as_deref().unwrap_or("")),
        due_day: clamp_day_column(columns.due_day),
        interval_days: columns.interval_days.filter(|value| *value >= 1),
        anchor_ms: columns.anchor_at,
        category: columns
            .category
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        is_subscription: columns.is_subscription.unwrap_or(0) != 0,
        bill_id: columns.bill_id,
    }
}

pub struct LoanColumns {
    pub loan_id: String,
    pub name: Option<String>,
    pub payment_amount: Option<f64>,
    pub currency: Option<String>,
    pub payment_day: Option<i64>,
}

pub fn loan_from_columns(columns: LoanColumns) -> Loan {
    Loan {
        name: non_empty_or(columns.name, &columns.loan_id),
        payment_amount: columns
            .payment_amount
            .filter(|value| value.is_finite())
            .unwrap_or(0.0),
        currency: currency_or_usd(columns.currency),
        payment_day: clamp_day_column(columns.payment_day),
        loan_id: columns.loan_id,
    }
}

pub struct RuleColumns {
    pub rule_id: String,
    pub name: Option<String>,
    pub match_mode: Option<String>,
    pub pattern: Option<String>,
    pub enabled: Option<i64>,
}

pub fn rule_from_columns(columns: RuleColumns) -> AllocationRule {
    AllocationRule {
        name: non_empty_or(columns.name, &columns.rule_id),
        match_mode: MatchMode::parse_or_default(columns.match_mode.as_deref().unwrap_or("")),
        pattern: columns.pattern.unwrap_or_default().trim().to_string(),
        enabled: columns.enabled.unwrap_or(1) != 0,
        rule_id: columns.rule_id,
    }
}

pub struct AlertColumns {
    pub alert_id: String,
    pub fingerprint: String,
    pub status: Option<String>,
    pub source: Option<String>,
    pub due_at: Option<i64>,
}

pub fn alert_from_columns(columns: AlertColumns) -> StoredAlert {
    StoredAlert {
        alert_id: columns.alert_id,
        fingerprint: columns.fingerprint,
        status: AlertStatus::parse_or_default(columns.status.as_deref().unwrap_or("")),
        source: AlertSource::parse_or_default(columns.source.as_deref().unwrap_or("")),
        due_at_ms: columns.due_at,
    }
}

pub fn suggestion_status_from_column(status: Option<&str>) -> SuggestionStatus {
    SuggestionStatus::parse_or_default(status.unwrap_or(""))
}

/// Malformed stored payloads degrade to an empty object so downstream
/// consumers always see JSON.
pub fn payload_from_column(payload: Option<&str>) -> Value {
    payload
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({}))
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .map(|inner| inner.trim().to_string())
        .filter(|inner| !inner.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn currency_or_usd(value: Option<String>) -> String {
    value
        .map(|inner| inner.trim().to_ascii_uppercase())
        .filter(|inner| !inner.is_empty())
        .unwrap_or_else(|| "USD".to_string())
}

fn clamp_day_column(value: Option<i64>) -> u32 {
    let day = value.unwrap_or(1).clamp(1, 31);
    u32::try_from(day).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::sweep::types::{AlertSource, AlertStatus, BillCadence, MatchMode};

    use super::{
        AlertColumns, BillColumns, RuleColumns, alert_from_columns, bill_from_columns,
        payload_from_column, rule_from_columns,
    };

    #[test]
    fn bill_defaults_cover_missing_legacy_columns() {
        let bill = bill_from_columns(BillColumns {
            bill_id: "bill_1".to_string(),
            name: None,
            amount: None,
            currency: None,
            cadence: Some("every-so-often".to_string()),
            due_day: Some(45),
            interval_days: Some(0),
            anchor_at: None,
            category: Some("  ".to_string()),
            is_subscription: None,
        });

        assert_eq!(bill.name, "bill_1");
        assert_eq!(bill.amount, 0.0);
        assert_eq!(bill.currency, "USD");
        assert_eq!(bill.cadence, BillCadence::Monthly);
        assert_eq!(bill.due_day, 31);
        assert_eq!(bill.interval_days, None);
        assert_eq!(bill.category, None);
        assert!(!bill.is_subscription);
    }

    #[test]
    fn alert_rows_normalize_status_and_source() {
        let alert = alert_from_columns(AlertColumns {
            alert_id: "alr_1".to_string(),
            fingerprint: "bill-due:bill_1:31".to_string(),
            status: Some("SNOOZED".to_string()),
            source: Some("imported".to_string()),
            due_at: Some(1_000),
        });

        assert_eq!(alert.status, AlertStatus::Snoozed);
        assert_eq!(alert.source, AlertSource::Manual);
    }

    #[test]
    fn rule_rows_default_to_enabled_contains() {
        let rule = rule_from_columns(RuleColumns {
            rule_id: "rule_1".to_string(),
            name: None,
            match_mode: None,
            pattern: Some(" payroll ".to_string()),
            enabled: None,
        });

        assert_eq!(rule.match_mode, MatchMode::Contains);
        assert_eq!(rule.pattern, "payroll");
        assert!(rule.enabled);
    }

    #[test]
    fn malformed_payload_degrades_to_empty_object() {
        assert_eq!(payload_from_column(Some("{not json")), json!({}));
        assert_eq!(payload_from_column(Some("[1,2]")), json!({}));
        assert_eq!(payload_from_column(None), json!({}));
        assert_eq!(
            payload_from_column(Some("{\"a\":1}")),
            json!({"a": 1})
        );
    }
}
