use serde_json::Value;

/// Stored enum strings are normalized through `parse_or_default` so
/// unrecognized values degrade to an explicit default instead of being
/// string-compared at call sites.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Open,
    Snoozed,
    Resolved,
}

impl AlertStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Snoozed => "snoozed",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "snoozed" => Self::Snoozed,
            "resolved" => Self::Resolved,
            _ => Self::Open,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSource {
    Automation,
    Manual,
}

impl AlertSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automation => "automation",
            Self::Manual => "manual",
        }
    }

    /// Unknown sources normalize to `manual`: records the sweep cannot
    /// attribute to itself must never be auto-resolved.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "automation" => Self::Automation,
            _ => Self::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionStatus {
    Open,
    Accepted,
    Dismissed,
    Snoozed,
}

impl SuggestionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::Dismissed => "dismissed",
            Self::Snoozed => "snoozed",
        }
    }

    /// Unknown statuses normalize to `open`, the conservative direction for
    /// duplicate suppression.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "accepted" => Self::Accepted,
            "dismissed" => Self::Dismissed,
            "snoozed" => Self::Snoozed,
            _ => Self::Open,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    IncomeAllocation,
    SubscriptionPrice,
}

impl SuggestionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IncomeAllocation => "income_allocation",
            Self::SubscriptionPrice => "subscription_price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    Hourly,
    Monthly,
    Manual,
}

impl SweepMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Monthly => "monthly",
            Self::Manual => "manual",
        }
    }

    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "monthly" => Self::Monthly,
            _ => Self::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    Regex,
}

impl MatchMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Regex => "regex",
        }
    }

    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "equals" => Self::Equals,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "regex" => Self::Regex,
            _ => Self::Contains,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillCadence {
    Monthly,
    Interval,
}

impl BillCadence {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Interval => "interval",
        }
    }

    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "interval" => Self::Interval,
            _ => Self::Monthly,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: String,
    pub name: String,
    pub kind: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct IncomeSource {
    pub income_id: String,
    pub source: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Bill {
    pub bill_id: String,
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub cadence: BillCadence,
    pub due_day: u32,
    pub interval_days: Option<i64>,
    pub anchor_ms: Option<i64>,
    pub category: Option<String>,
    pub is_subscription: bool,
}

impl Bill {
    pub fn is_subscription_like(&self) -> bool {
        if self.is_subscription {
            return true;
        }
        self.category
            .as_deref()
            .is_some_and(|category| category.to_ascii_lowercase().contains("subscription"))
    }
}

#[derive(Debug, Clone)]
pub struct Loan {
    pub loan_id: String,
    pub name: String,
    pub payment_amount: f64,
    pub currency: String,
    pub payment_day: u32,
}

#[derive(Debug, Clone)]
pub struct AllocationRule {
    pub rule_id: String,
    pub name: String,
    pub match_mode: MatchMode,
    pub pattern: String,
    pub enabled: bool,
}

/// An alert row as persisted, used as the "current" side of reconciliation.
#[derive(Debug, Clone)]
pub struct StoredAlert {
    pub alert_id: String,
    pub fingerprint: String,
    pub status: AlertStatus,
    pub source: AlertSource,
    pub due_at_ms: Option<i64>,
}

/// An alert as the sweep wants it to exist, used as the "desired" side.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredAlert {
    pub fingerprint: String,
    pub title: String,
    pub detail: String,
    pub severity: Severity,
    pub entity_type: String,
    pub entity_id: String,
    pub due_at_ms: i64,
    pub cycle_key: String,
}

#[derive(Debug, Clone)]
pub struct DesiredSuggestion {
    pub fingerprint: String,
    pub kind: SuggestionKind,
    pub payload: Value,
    pub price_observation: Option<PriceObservation>,
}

/// Observation to record alongside a subscription suggestion so the next
/// sweep compares against the latest surfaced amount.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub bill_id: String,
    pub amount: f64,
    pub previous_amount: Option<f64>,
}
