use std::collections::BTreeMap;

/// All cross-currency rates derive from per-currency USD quotes.
pub const PIVOT_CURRENCY: &str = "USD";

const DEFAULT_FRACTION_DIGITS: u32 = 2;
const MAX_FRACTION_DIGITS: u32 = 8;

/// Quote-currency units per 1 USD. `synthetic` marks a quote the system
/// fabricated because no real one exists; it is carried through so downstream
/// records never silently treat fabricated rates as authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct FxQuote {
    pub rate: f64,
    pub as_of_ms: i64,
    pub source: String,
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FxConversion {
    pub amount: f64,
    pub currency: String,
    pub rate: f64,
    pub as_of_ms: i64,
    pub source: String,
    pub synthetic: bool,
}

/// Currency arithmetic over caller-supplied precision and FX tables. Exact
/// work (splits, totals) happens in integer minor units; conversion never
/// fails on missing data, it degrades to a flagged identity rate instead.
#[derive(Debug, Clone, Default)]
pub struct MoneyConverter {
    fraction_digits: BTreeMap<String, u32>,
    usd_quotes: BTreeMap<String, FxQuote>,
}

impl MoneyConverter {
    pub fn new(
        fraction_digits: BTreeMap<String, u32>,
        usd_quotes: BTreeMap<String, FxQuote>,
    ) -> Self {
        let fraction_digits = fraction_digits
            .into_iter()
            .map(|(code, digits)| (normalize_currency_code(&code), digits))
            .collect();
        let usd_quotes = usd_quotes
            .into_iter()
            .map(|(code, quote)| (normalize_currency_code(&code), quote))
            .collect();
        Self {
            fraction_digits,
            usd_quotes,
        }
    }

    pub fn fraction_digits(&self, currency: &str) -> u32 {
        self.fraction_digits
            .get(&normalize_currency_code(currency))
            .copied()
            .unwrap_or(DEFAULT_FRACTION_DIGITS)
            .min(MAX_FRACTION_DIGITS)
    }

    pub fn to_minor_units(&self, major_amount: f64, currency: &str) -> i64 {
        let factor = self.minor_factor(currency);
        round_half_away_from_zero(major_amount * factor)
    }

    pub fn from_minor_units(&self, minor_amount: i64, currency: &str) -> f64 {
        let factor = self.minor_factor(currency);
        (minor_amount as f64) / factor
    }

    pub fn convert(&self, amount: f64, from_currency: &str, to_currency: &str) -> FxConversion {
        let from = normalize_currency_code(from_currency);
        let to = normalize_currency_code(to_currency);

        if from == to {
            return FxConversion {
                amount,
                currency: to,
                rate: 1.0,
                as_of_ms: 0,
                source: "identity".to_string(),
                synthetic: false,
            };
        }

        if from == PIVOT_CURRENCY {
            return match self.usable_quote(&to) {
                Some(quote) => conversion(amount, to, quote.rate, quote),
                None => degraded_conversion(amount, to),
            };
        }

        if to == PIVOT_CURRENCY {
            return match self.usable_quote(&from) {
                Some(quote) => conversion(amount, to, 1.0 / quote.rate, quote),
                None => degraded_conversion(amount, to),
            };
        }

        match (self.usable_quote(&from), self.usable_quote(&to)) {
            (Some(from_quote), Some(to_quote)) => {
                let rate = to_quote.rate / from_quote.rate;
                FxConversion {
                    amount: amount * rate,
                    currency: to,
                    rate,
                    as_of_ms: from_quote.as_of_ms.min(to_quote.as_of_ms),
                    source: join_sources(&from_quote.source, &to_quote.source),
                    synthetic: from_quote.synthetic || to_quote.synthetic,
                }
            }
            _ => degraded_conversion(amount, to),
        }
    }

    /// Splits `total_minor` proportionally to `weights_minor`, rounding each
    /// share to the minor-unit grid and assigning the residual entirely to
    /// the last share so the parts always reconcile to the total exactly.
    pub fn split_allocate(&self, total_minor: i64, weights_minor: &[i64]) -> Vec<i64> {
        if weights_minor.is_empty() {
            return vec![total_minor];
        }

        let weight_sum: i64 = weights_minor.iter().sum();
        let mut shares: Vec<i64> = if weight_sum == 0 {
            let even = (total_minor as f64) / (weights_minor.len() as f64);
            weights_minor
                .iter()
                .map(|_| round_half_away_from_zero(even))
                .collect()
        } else {
            let scale = (total_minor as f64) / (weight_sum as f64);
            weights_minor
                .iter()
                .map(|weight| round_half_away_from_zero((*weight as f64) * scale))
                .collect()
        };

        let allocated: i64 = shares.iter().sum();
        let residual = total_minor - allocated;
        if let Some(last) = shares.last_mut() {
            *last += residual;
        }
        shares
    }

    fn minor_factor(&self, currency: &str) -> f64 {
        10_f64.powi(self.fraction_digits(currency) as i32)
    }

    fn usable_quote(&self, currency: &str) -> Option<&FxQuote> {
        self.usd_quotes
            .get(currency)
            .filter(|quote| quote.rate > 0.0 && quote.rate.is_finite())
    }
}

pub fn normalize_currency_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn conversion(amount: f64, to: String, rate: f64, quote: &FxQuote) -> FxConversion {
    FxConversion {
        amount: amount * rate,
        currency: to,
        rate,
        as_of_ms: quote.as_of_ms,
        source: quote.source.clone(),
        synthetic: quote.synthetic,
    }
}

fn degraded_conversion(amount: f64, to: String) -> FxConversion {
    FxConversion {
        amount,
        currency: to,
        rate: 1.0,
        as_of_ms: 0,
        source: "synthetic".to_string(),
        synthetic: true,
    }
}

fn join_sources(from_source: &str, to_source: &str) -> String {
    if from_source == to_source {
        from_source.to_string()
    } else {
        format!("{from_source}|{to_source}")
    }
}

fn round_half_away_from_zero(value: f64) -> i64 {
    value.round() as i64
}
