use std::collections::BTreeMap;

use crate::sweep::policy::SweepPolicy;
use crate::sweep::types::{AlertSource, AlertStatus, DesiredAlert, StoredAlert};

#[derive(Debug, Clone)]
pub struct AlertUpdate {
    pub alert_id: String,
    pub desired: DesiredAlert,
}

/// Three-way diff of one sweep pass. Applying it is what makes sweeps
/// idempotent: an unchanged desired set maps every record to `updates`
/// (field refresh, no state flip) and produces no creates or resolves.
#[derive(Debug, Clone, Default)]
pub struct SweepDiff {
    pub creates: Vec<DesiredAlert>,
    pub updates: Vec<AlertUpdate>,
    pub resolves: Vec<String>,
}

/// Set reconciliation by fingerprint, not a queue: one atomic pass over the
/// full desired and current sets.
///
/// - desired only            -> create (status open)
/// - desired and current     -> update in place, status forced open
/// - current only, automated -> resolve; manually created records are never
///   auto-resolved
///
/// "Current" means open records, plus snoozed records whose snooze has
/// expired (due instant already passed); snoozed-in-the-future, accepted,
/// dismissed, and resolved records are invisible to matching.
pub fn reconcile_alerts(
    desired: &[DesiredAlert],
    current: &[StoredAlert],
    now_ms: i64,
    policy: SweepPolicy,
) -> SweepDiff {
    // A previously-snoozed fingerprint can coexist with a fresh open record
    // for the same condition; the oldest matchable record is the match
    // target and automated surplus duplicates are resolved so repeated
    // sweeps converge to one record per fingerprint.
    let mut current_open: BTreeMap<&str, &StoredAlert> = BTreeMap::new();
    let mut duplicates: Vec<&StoredAlert> = Vec::new();
    for stored in current {
        if !matchable(stored, now_ms, policy) {
            continue;
        }
        match current_open.entry(stored.fingerprint.as_str()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(stored);
            }
            std::collections::btree_map::Entry::Occupied(_) => duplicates.push(stored),
        }
    }

    let mut desired_by_fingerprint: BTreeMap<&str, &DesiredAlert> = BTreeMap::new();
    for record in desired {
        desired_by_fingerprint
            .entry(record.fingerprint.as_str())
            .or_insert(record);
    }

    let mut diff = SweepDiff::default();

    for (fingerprint, record) in &desired_by_fingerprint {
        match current_open.get(fingerprint) {
            Some(stored) => diff.updates.push(AlertUpdate {
                alert_id: stored.alert_id.clone(),
                desired: (*record).clone(),
            }),
            None => diff.creates.push((*record).clone()),
        }
    }

    for (fingerprint, stored) in &current_open {
        if desired_by_fingerprint.contains_key(fingerprint) {
            continue;
        }
        if stored.source == AlertSource::Automation {
            diff.resolves.push(stored.alert_id.clone());
        }
    }

    for stored in duplicates {
        if stored.source == AlertSource::Automation {
            diff.resolves.push(stored.alert_id.clone());
        }
    }

    diff
}

fn matchable(stored: &StoredAlert, now_ms: i64, policy: SweepPolicy) -> bool {
    match stored.status {
        AlertStatus::Open => true,
        AlertStatus::Snoozed => policy.snooze_expired(stored.due_at_ms, now_ms),
        AlertStatus::Resolved => false,
    }
}
