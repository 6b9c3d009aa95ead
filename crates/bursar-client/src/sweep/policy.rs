use crate::sweep::types::Severity;

/// Deterministic sweep policy identifier, emitted with sweep results so
/// threshold changes remain auditable across versions.
pub const SWEEP_POLICY_VERSION: &str = "sweep/v1";

/// v1 automation sweep policy.
///
/// Notes:
/// - `due_reminder_days` is the hard default; the stored preference chain
///   can override it per user.
/// - Expired-snooze boundary: a snoozed alert re-enters matching strictly
///   when its due instant is before the sweep instant; an alert snoozed
///   until exactly now stays snoozed.
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    pub due_reminder_days: i64,
    pub due_hour: u32,
    pub due_minute: u32,
    pub high_severity_days: i64,
    pub essentials_floor: f64,
    pub essentials_ceiling: f64,
    pub buffer_floor: f64,
    pub buffer_ratio: f64,
    pub price_change_tolerance: f64,
}

impl SweepPolicy {
    pub fn severity_for_days_until(self, days_until_due: i64) -> Severity {
        if days_until_due <= self.high_severity_days {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    pub fn snooze_expired(self, due_at_ms: Option<i64>, now_ms: i64) -> bool {
        due_at_ms.is_some_and(|due| due < now_ms)
    }

    pub fn price_changed(self, previous_amount: f64, current_amount: f64) -> bool {
        (current_amount - previous_amount).abs() >= self.price_change_tolerance
    }
}

pub const SWEEP_POLICY_V1: SweepPolicy = SweepPolicy {
    due_reminder_days: 3,
    due_hour: 9,
    due_minute: 0,
    high_severity_days: 1,
    essentials_floor: 20.0,
    essentials_ceiling: 70.0,
    buffer_floor: 10.0,
    buffer_ratio: 0.4,
    price_change_tolerance: 0.005,
};
