use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct SweepData {
    pub mode: String,
    pub user_id: String,
    pub cycle_key: String,
    pub policy_version: String,
    pub alerts_created: i64,
    pub alerts_updated: i64,
    pub alerts_resolved: i64,
    pub suggestions_created: i64,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertRow {
    pub alert_id: String,
    pub fingerprint: String,
    pub title: String,
    pub detail: String,
    pub severity: String,
    pub entity_type: String,
    pub entity_id: String,
    pub due_at: Option<i64>,
    pub cycle_key: Option<String>,
    pub status: String,
    pub source: String,
    pub resolved_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsData {
    pub user_id: String,
    pub status: Option<String>,
    pub rows: Vec<AlertRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionRow {
    pub suggestion_id: String,
    pub fingerprint: String,
    pub kind: String,
    pub status: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsData {
    pub user_id: String,
    pub status: Option<String>,
    pub rows: Vec<SuggestionRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerLineRow {
    pub line_id: String,
    pub kind: String,
    pub direction: String,
    pub amount_minor: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_account_id: Option<String>,
    pub fx_rate: f64,
    pub fx_base_minor: i64,
    pub fx_base_currency: String,
    pub fx_source: String,
    pub fx_synthetic: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseData {
    pub purchase_id: String,
    pub entry_id: String,
    pub merchant: String,
    pub total_minor: i64,
    pub currency: String,
    pub base_currency: String,
    pub lines: Vec<LedgerLineRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoData {
    pub topic: String,
    pub seeded: bool,
    pub home: String,
    pub detail: Value,
}
