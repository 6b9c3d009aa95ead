use std::collections::{BTreeMap, BTreeSet};

use regex::RegexBuilder;
use serde_json::{Value, json};

use crate::money::MoneyConverter;
use crate::sweep::policy::SweepPolicy;
use crate::sweep::types::{
    AllocationRule, Bill, DesiredSuggestion, IncomeSource, MatchMode, PriceObservation,
    SuggestionKind,
};

pub struct SuggestionInput<'a> {
    pub incomes: &'a [IncomeSource],
    pub rules: &'a [AllocationRule],
    pub bills: &'a [Bill],
    /// Latest recorded subscription amount per bill id, from prior sweeps.
    pub latest_price_by_bill: &'a BTreeMap<String, f64>,
    /// Fingerprints of suggestions currently open, used to suppress
    /// duplicates until the user reviews them.
    pub open_fingerprints: &'a BTreeSet<String>,
    pub money: &'a MoneyConverter,
    pub policy: SweepPolicy,
}

/// Emits the desired suggestion set: income sources no allocation rule
/// covers, and subscription bills whose amount moved since the last recorded
/// observation. Deterministic over identical input state.
pub fn desired_suggestions(input: &SuggestionInput<'_>) -> Vec<DesiredSuggestion> {
    let mut desired: Vec<DesiredSuggestion> = Vec::new();
    desired.extend(income_coverage_suggestions(input));
    desired.extend(subscription_price_suggestions(input));
    desired
}

fn income_coverage_suggestions(input: &SuggestionInput<'_>) -> Vec<DesiredSuggestion> {
    let enabled_rules: Vec<&AllocationRule> =
        input.rules.iter().filter(|rule| rule.enabled).collect();

    let mut suggestions: Vec<DesiredSuggestion> = Vec::new();
    for income in input.incomes {
        if income.amount <= 0.0 {
            continue;
        }
        if enabled_rules
            .iter()
            .any(|rule| rule_matches(rule, &income.source))
        {
            continue;
        }

        let fingerprint = format!("income-allocation:{}", income.income_id);
        if input.open_fingerprints.contains(&fingerprint) {
            continue;
        }

        let bills_total = monthly_bills_total(input, &income.currency);
        let buckets = allocation_buckets(bills_total, income.amount, input.policy);

        suggestions.push(DesiredSuggestion {
            fingerprint,
            kind: SuggestionKind::IncomeAllocation,
            payload: json!({
                "income_id": income.income_id,
                "income_source": income.source,
                "income_amount": income.amount,
                "currency": income.currency,
                "monthly_bills_total": bills_total,
                "buckets": buckets,
            }),
            price_observation: None,
        });
    }

    suggestions
}

fn subscription_price_suggestions(input: &SuggestionInput<'_>) -> Vec<DesiredSuggestion> {
    let mut suggestions: Vec<DesiredSuggestion> = Vec::new();

    for bill in input.bills {
        if !bill.is_subscription_like() {
            continue;
        }

        let amount_key = input.money.to_minor_units(bill.amount, &bill.currency);
        match input.latest_price_by_bill.get(&bill.bill_id) {
            None => {
                let fingerprint =
                    format!("subscription:{}:baseline:{}", bill.bill_id, amount_key);
                if input.open_fingerprints.contains(&fingerprint) {
                    continue;
                }
                suggestions.push(DesiredSuggestion {
                    fingerprint,
                    kind: SuggestionKind::SubscriptionPrice,
                    payload: json!({
                        "bill_id": bill.bill_id,
                        "bill_name": bill.name,
                        "observation": "baseline",
                        "amount": bill.amount,
                        "currency": bill.currency,
                    }),
                    price_observation: Some(PriceObservation {
                        bill_id: bill.bill_id.clone(),
                        amount: bill.amount,
                        previous_amount: None,
                    }),
                });
            }
            Some(previous_amount) => {
                if !input.policy.price_changed(*previous_amount, bill.amount) {
                    continue;
                }
                let fingerprint =
                    format!("subscription:{}:change:{}", bill.bill_id, amount_key);
                if input.open_fingerprints.contains(&fingerprint) {
                    continue;
                }

                let delta = bill.amount - previous_amount;
                let delta_pct = if *previous_amount == 0.0 {
                    Value::Null
                } else {
                    json!(delta / previous_amount * 100.0)
                };
                suggestions.push(DesiredSuggestion {
                    fingerprint,
                    kind: SuggestionKind::SubscriptionPrice,
                    payload: json!({
                        "bill_id": bill.bill_id,
                        "bill_name": bill.name,
                        "observation": "change",
                        "amount": bill.amount,
                        "previous_amount": previous_amount,
                        "delta_amount": delta,
                        "delta_pct": delta_pct,
                        "currency": bill.currency,
                    }),
                    price_observation: Some(PriceObservation {
                        bill_id: bill.bill_id.clone(),
                        amount: bill.amount,
                        previous_amount: Some(*previous_amount),
                    }),
                });
            }
        }
    }

    suggestions
}

/// Case-insensitive pattern match. A malformed regex is a data-quality
/// problem, not a sweep-stopper: it matches nothing.
fn rule_matches(rule: &AllocationRule, income_source: &str) -> bool {
    if rule.pattern.is_empty() {
        return false;
    }

    let source = income_source.to_lowercase();
    let pattern = rule.pattern.to_lowercase();
    match rule.match_mode {
        MatchMode::Contains => source.contains(&pattern),
        MatchMode::Equals => source == pattern,
        MatchMode::StartsWith => source.starts_with(&pattern),
        MatchMode::EndsWith => source.ends_with(&pattern),
        MatchMode::Regex => RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .build()
            .map(|compiled| compiled.is_match(income_source))
            .unwrap_or(false),
    }
}

/// Default three-bucket allocation: the essentials share follows the
/// bills-to-income ratio clamped to [20, 70], buffer takes at least 10
/// points, flexible takes the remainder. Shares that round to zero or below
/// are dropped.
fn allocation_buckets(bills_total: f64, income_amount: f64, policy: SweepPolicy) -> Vec<Value> {
    let ratio = if income_amount > 0.0 {
        bills_total / income_amount
    } else {
        0.0
    };
    let essentials = (ratio * 100.0)
        .round()
        .clamp(policy.essentials_floor, policy.essentials_ceiling);
    let buffer = ((100.0 - essentials) * policy.buffer_ratio)
        .round()
        .max(policy.buffer_floor);
    let flexible = 100.0 - essentials - buffer;

    [
        ("essentials", essentials),
        ("buffer", buffer),
        ("flexible", flexible),
    ]
    .into_iter()
    .filter_map(|(name, share)| {
        let percent = share.round() as i64;
        if percent <= 0 {
            return None;
        }
        Some(json!({ "name": name, "percent": percent }))
    })
    .collect()
}

fn monthly_bills_total(input: &SuggestionInput<'_>, target_currency: &str) -> f64 {
    input
        .bills
        .iter()
        .filter(|bill| bill.amount > 0.0)
        .map(|bill| {
            input
                .money
                .convert(bill.amount, &bill.currency, target_currency)
                .amount
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use crate::money::MoneyConverter;
    use crate::sweep::policy::SWEEP_POLICY_V1;
    use crate::sweep::types::{
        AllocationRule, Bill, BillCadence, IncomeSource, MatchMode, SuggestionKind,
    };

    use super::{SuggestionInput, desired_suggestions};

    fn income(income_id: &str, source: &str, amount: f64) -> IncomeSource {
        IncomeSource {
            income_id: income_id.to_string(),
            source: source.to_string(),
            amount,
            currency: "USD".to_string(),
        }
    }

    fn rule(mode: MatchMode, pattern: &str) -> AllocationRule {
        AllocationRule {
            rule_id: "rule_1".to_string(),
            name: "Payroll".to_string(),
            match_mode: mode,
            pattern: pattern.to_string(),
            enabled: true,
        }
    }

    fn subscription(bill_id: &str, amount: f64) -> Bill {
        Bill {
            bill_id: bill_id.to_string(),
            name: "StreamBox".to_string(),
            amount,
            currency: "USD".to_string(),
            cadence: BillCadence::Monthly,
            due_day: 5,
            interval_days: None,
            anchor_ms: None,
            category: None,
            is_subscription: true,
        }
    }

    struct Fixture {
        incomes: Vec<IncomeSource>,
        rules: Vec<AllocationRule>,
        bills: Vec<Bill>,
        latest: BTreeMap<String, f64>,
        open: BTreeSet<String>,
        money: MoneyConverter,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                incomes: Vec::new(),
                rules: Vec::new(),
                bills: Vec::new(),
                latest: BTreeMap::new(),
                open: BTreeSet::new(),
                money: MoneyConverter::default(),
            }
        }

        fn run(&self) -> Vec<super::DesiredSuggestion> {
            desired_suggestions(&SuggestionInput {
                incomes: &self.incomes,
                rules: &self.rules,
                bills: &self.bills,
                latest_price_by_bill: &self.latest,
                open_fingerprints: &self.open,
                money: &self.money,
                policy: SWEEP_POLICY_V1,
            })
        }
    }

    #[test]
    fn uncovered_income_emits_three_bucket_allocation() {
        let mut fixture = Fixture::new();
        fixture.incomes.push(income("inc_1", "ACME PAYROLL", 4_000.0));
        fixture.bills.push(Bill {
            is_subscription: false,
            ..subscription("bill_rent", 1_600.0)
        });

        let suggestions = fixture.run();
        assert_eq!(suggestions.len(), 1);
        let record = &suggestions[0];
        assert_eq!(record.fingerprint, "income-allocation:inc_1");
        assert_eq!(record.kind, SuggestionKind::IncomeAllocation);

        // 1600/4000 -> essentials 40, buffer (100-40)*0.4 = 24, flexible 36.
        let buckets = record.payload["buckets"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0]["percent"], 40);
        assert_eq!(buckets[1]["percent"], 24);
        assert_eq!(buckets[2]["percent"], 36);
        let total: i64 = buckets
            .iter()
            .map(|bucket| bucket["percent"].as_i64().unwrap_or(0))
            .sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn essentials_share_clamps_to_bounds() {
        let mut fixture = Fixture::new();
        fixture.incomes.push(income("inc_1", "SIDE GIG", 500.0));
        fixture.bills.push(Bill {
            is_subscription: false,
            ..subscription("bill_rent", 2_000.0)
        });

        let suggestions = fixture.run();
        let buckets = suggestions[0].payload["buckets"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        // 2000/500 would be 400%; the essentials share clamps to 70.
        assert_eq!(buckets[0]["percent"], 70);
        assert_eq!(buckets[1]["percent"], 12);
        assert_eq!(buckets[2]["percent"], 18);
    }

    #[test]
    fn covered_income_and_open_fingerprints_are_suppressed() {
        let mut fixture = Fixture::new();
        fixture.incomes.push(income("inc_1", "ACME PAYROLL", 4_000.0));
        fixture.rules.push(rule(MatchMode::Contains, "acme"));
        assert!(fixture.run().is_empty());

        fixture.rules.clear();
        fixture
            .open
            .insert("income-allocation:inc_1".to_string());
        assert!(fixture.run().is_empty());
    }

    #[test]
    fn match_modes_cover_all_five_shapes() {
        let mut fixture = Fixture::new();
        fixture.incomes.push(income("inc_1", "ACME PAYROLL", 4_000.0));

        for matching in [
            rule(MatchMode::Contains, "payroll"),
            rule(MatchMode::Equals, "acme payroll"),
            rule(MatchMode::StartsWith, "acme"),
            rule(MatchMode::EndsWith, "payroll"),
            rule(MatchMode::Regex, r"^acme\s+pay"),
        ] {
            fixture.rules = vec![matching];
            assert!(fixture.run().is_empty());
        }

        fixture.rules = vec![rule(MatchMode::Equals, "acme")];
        assert_eq!(fixture.run().len(), 1);
    }

    #[test]
    fn malformed_regex_counts_as_non_matching() {
        let mut fixture = Fixture::new();
        fixture.incomes.push(income("inc_1", "ACME PAYROLL", 4_000.0));
        fixture.rules.push(rule(MatchMode::Regex, "([unclosed"));

        let suggestions = fixture.run();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].fingerprint, "income-allocation:inc_1");
    }

    #[test]
    fn first_subscription_observation_is_a_baseline() {
        let mut fixture = Fixture::new();
        fixture.bills.push(subscription("bill_sub", 15.99));

        let suggestions = fixture.run();
        assert_eq!(suggestions.len(), 1);
        let record = &suggestions[0];
        assert_eq!(record.fingerprint, "subscription:bill_sub:baseline:1599");
        assert_eq!(record.payload["observation"], "baseline");
        let observation = record.price_observation.clone();
        assert!(observation.is_some());
        if let Some(observed) = observation {
            assert_eq!(observed.previous_amount, None);
        }
    }

    #[test]
    fn unchanged_subscription_amounts_are_noops() {
        let mut fixture = Fixture::new();
        fixture.bills.push(subscription("bill_sub", 15.99));
        fixture.latest.insert("bill_sub".to_string(), 15.99);
        assert!(fixture.run().is_empty());

        // Sub-half-cent drift is treated as unchanged.
        fixture.bills[0].amount = 15.994;
        assert!(fixture.run().is_empty());
    }

    #[test]
    fn one_cent_change_mints_a_new_fingerprint() {
        let mut fixture = Fixture::new();
        fixture.bills.push(subscription("bill_sub", 16.00));
        fixture.latest.insert("bill_sub".to_string(), 15.99);

        let suggestions = fixture.run();
        assert_eq!(suggestions.len(), 1);
        let record = &suggestions[0];
        assert_eq!(record.fingerprint, "subscription:bill_sub:change:1600");
        assert_eq!(record.payload["observation"], "change");
        assert_eq!(record.payload["previous_amount"], 15.99);
        assert!(record.payload["delta_pct"].is_f64());
    }

    #[test]
    fn delta_pct_is_null_when_previous_amount_was_zero() {
        let mut fixture = Fixture::new();
        fixture.bills.push(subscription("bill_sub", 9.99));
        fixture.latest.insert("bill_sub".to_string(), 0.0);

        let suggestions = fixture.run();
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].payload["delta_pct"].is_null());
    }

    #[test]
    fn identical_runs_produce_identical_fingerprint_sets() {
        let mut fixture = Fixture::new();
        fixture.incomes.push(income("inc_1", "ACME PAYROLL", 4_000.0));
        fixture.bills.push(subscription("bill_sub", 15.99));

        let first: Vec<String> = fixture
            .run()
            .into_iter()
            .map(|record| record.fingerprint)
            .collect();
        let second: Vec<String> = fixture
            .run()
            .into_iter()
            .map(|record| record.fingerprint)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
