use crate::clock::{MILLIS_PER_DAY, RecurrenceRule, TimeZoneClock};
use crate::sweep::policy::SweepPolicy;
use crate::sweep::types::{Bill, BillCadence, DesiredAlert, Loan};

pub struct AlertContext<'a> {
    pub clock: &'a TimeZoneClock,
    pub zone_name: &'a str,
    pub now_ms: i64,
    pub reminder_days: i64,
    pub reminders_enabled: bool,
    pub policy: SweepPolicy,
}

/// Computes the desired alert set from current bill/loan state. Every
/// condition inside the reminder window yields one record keyed by a
/// fingerprint that is stable until the condition's defining parameters
/// change.
pub fn desired_alerts(bills: &[Bill], loans: &[Loan], context: &AlertContext<'_>) -> Vec<DesiredAlert> {
    if !context.reminders_enabled {
        return Vec::new();
    }

    let mut desired: Vec<DesiredAlert> = Vec::new();

    for bill in bills {
        if bill.amount <= 0.0 {
            continue;
        }
        let due_ms = context.clock.next_occurrence(
            context.now_ms,
            bill_recurrence(bill, context.policy),
            context.zone_name,
        );
        let Some(days_until) = days_within_window(due_ms, context) else {
            continue;
        };

        desired.push(DesiredAlert {
            fingerprint: bill_fingerprint(bill),
            title: format!("{} due {}", bill.name, due_phrase(days_until)),
            detail: format!(
                "{} {:.2} is due on {}.",
                bill.currency,
                bill.amount,
                due_date_label(due_ms, context)
            ),
            severity: context.policy.severity_for_days_until(days_until),
            entity_type: "bill".to_string(),
            entity_id: bill.bill_id.clone(),
            due_at_ms: due_ms,
            cycle_key: context.clock.cycle_key(due_ms, context.zone_name),
        });
    }

    for loan in loans {
        if loan.payment_amount <= 0.0 {
            continue;
        }
        let rule = RecurrenceRule::MonthlyByDay {
            day: loan.payment_day,
            hour: context.policy.due_hour,
            minute: context.policy.due_minute,
        };
        let due_ms = context
            .clock
            .next_occurrence(context.now_ms, rule, context.zone_name);
        let Some(days_until) = days_within_window(due_ms, context) else {
            continue;
        };

        desired.push(DesiredAlert {
            fingerprint: format!("loan-due:{}:{}", loan.loan_id, loan.payment_day),
            title: format!("{} payment due {}", loan.name, due_phrase(days_until)),
            detail: format!(
                "{} {:.2} payment is due on {}.",
                loan.currency,
                loan.payment_amount,
                due_date_label(due_ms, context)
            ),
            severity: context.policy.severity_for_days_until(days_until),
            entity_type: "loan".to_string(),
            entity_id: loan.loan_id.clone(),
            due_at_ms: due_ms,
            cycle_key: context.clock.cycle_key(due_ms, context.zone_name),
        });
    }

    desired.sort_by(|left, right| left.fingerprint.cmp(&right.fingerprint));
    desired
}

fn bill_recurrence(bill: &Bill, policy: SweepPolicy) -> RecurrenceRule {
    match bill.cadence {
        BillCadence::Interval => {
            if let (Some(interval_days), Some(anchor_ms)) = (bill.interval_days, bill.anchor_ms) {
                return RecurrenceRule::IntervalDays {
                    interval_days,
                    anchor_ms,
                };
            }
            monthly_rule(bill.due_day, policy)
        }
        BillCadence::Monthly => monthly_rule(bill.due_day, policy),
    }
}

fn monthly_rule(due_day: u32, policy: SweepPolicy) -> RecurrenceRule {
    RecurrenceRule::MonthlyByDay {
        day: due_day,
        hour: policy.due_hour,
        minute: policy.due_minute,
    }
}

fn bill_fingerprint(bill: &Bill) -> String {
    match (bill.cadence, bill.interval_days) {
        (BillCadence::Interval, Some(interval_days)) => {
            format!("bill-due:{}:i{}", bill.bill_id, interval_days)
        }
        _ => format!("bill-due:{}:{}", bill.bill_id, bill.due_day),
    }
}

fn days_within_window(due_ms: i64, context: &AlertContext<'_>) -> Option<i64> {
    let days_until = (due_ms - context.now_ms).div_euclid(MILLIS_PER_DAY);
    if days_until < 0 || days_until > context.reminder_days {
        return None;
    }
    Some(days_until)
}

fn due_phrase(days_until: i64) -> String {
    match days_until {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        days => format!("in {days} days"),
    }
}

fn due_date_label(due_ms: i64, context: &AlertContext<'_>) -> String {
    let parts = context.clock.resolve_calendar(due_ms, context.zone_name);
    format!("{:04}-{:02}-{:02}", parts.year, parts.month, parts.day)
}
