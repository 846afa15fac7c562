//! Shipping threshold normalization.
//!
//! The single boundary that turns noisy extracted shipping data into a
//! comparable numeric threshold. Everything downstream — display and
//! aggregation alike — depends on the decision order applied here, so the
//! tie-break rules live in one place and nowhere else.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::types::StructuredData;

/// Extracted amounts above this are discarded as implausible.
pub const THRESHOLD_CEILING: i64 = 500;

lazy_static! {
    /// A whole dollar amount, optionally with `$` and cents: "$75", "75", "75.00".
    static ref AMOUNT: Regex = Regex::new(r"^\$?(\d+)(?:\.(\d{2}))?$").unwrap();

    /// A dollar amount appearing anywhere in free text.
    static ref TEXT_AMOUNT: Regex = Regex::new(r"\$\s*\d|\b\d+\s*dollars\b").unwrap();

    /// Phrases implying a qualifying minimum ("free shipping over $50").
    static ref QUALIFIER: Regex = Regex::new(r"\b(over|above|minimum|spend)\b").unwrap();
}

/// Outcome of threshold normalization.
///
/// `NotAThreshold` marks policies like "calculated at checkout" — known to
/// not be a threshold, as opposed to merely unparseable. Both collapse to
/// `None` for aggregation via [`ThresholdSignal::as_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSignal {
    /// Canonical dollar amount. `0` means free shipping with no minimum.
    Amount(i64),
    /// The site states shipping is computed elsewhere; no threshold exists.
    NotAThreshold,
    Unknown,
}

impl ThresholdSignal {
    pub fn as_amount(&self) -> Option<i64> {
        match self {
            ThresholdSignal::Amount(amount) => Some(*amount),
            ThresholdSignal::NotAThreshold | ThresholdSignal::Unknown => None,
        }
    }
}

/// Normalize extracted shipping data into a canonical threshold.
///
/// Decision order, first match wins:
/// 1. structured amount exactly `0` (number or `"0"`) → free, no minimum
/// 2. structured amount parsing to a dollar value in `(0, THRESHOLD_CEILING]`
/// 3. policy text offering free shipping with no amount and no minimum
/// 4. policy text deferring the cost to checkout → not a threshold
/// 5. unknown
pub fn extract_threshold(data: &StructuredData) -> ThresholdSignal {
    if let Some(raw) = &data.threshold_amount {
        if let Some(signal) = threshold_from_amount(raw) {
            return signal;
        }
    }

    match &data.shipping_policy {
        Some(policy) => threshold_from_policy(policy),
        None => ThresholdSignal::Unknown,
    }
}

/// Rules 1–2: the structured `threshold_amount` field. Returns `None` to
/// fall through to the policy-text rules.
fn threshold_from_amount(raw: &Value) -> Option<ThresholdSignal> {
    match raw {
        Value::Number(n) => {
            let amount = n.as_f64()?;
            if amount == 0.0 {
                return Some(ThresholdSignal::Amount(0));
            }
            let dollars = amount.trunc() as i64;
            if amount > 0.0 && dollars <= THRESHOLD_CEILING {
                Some(ThresholdSignal::Amount(dollars))
            } else {
                None
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed == "0" {
                return Some(ThresholdSignal::Amount(0));
            }
            let captures = AMOUNT.captures(trimmed)?;
            let dollars: i64 = captures.get(1)?.as_str().parse().ok()?;
            if dollars > 0 && dollars <= THRESHOLD_CEILING {
                Some(ThresholdSignal::Amount(dollars))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Rules 3–4: free-text policy language.
fn threshold_from_policy(policy: &str) -> ThresholdSignal {
    let lower = policy.to_lowercase();

    let mentions_shipping = lower.contains("shipping") || lower.contains("delivery");
    let has_amount = TEXT_AMOUNT.is_match(&lower);
    let has_qualifier = QUALIFIER.is_match(&lower);

    if lower.contains("free") && mentions_shipping && !has_amount && !has_qualifier {
        return ThresholdSignal::Amount(0);
    }

    if lower.contains("calculated at checkout") {
        return ThresholdSignal::NotAThreshold;
    }

    ThresholdSignal::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_amount(raw: Value) -> StructuredData {
        StructuredData {
            threshold_amount: Some(raw),
            ..Default::default()
        }
    }

    fn with_policy(policy: &str) -> StructuredData {
        StructuredData {
            shipping_policy: Some(policy.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn zero_string_is_free_shipping() {
        assert_eq!(
            extract_threshold(&with_amount(json!("0"))),
            ThresholdSignal::Amount(0)
        );
    }

    #[test]
    fn zero_number_is_free_shipping() {
        assert_eq!(
            extract_threshold(&with_amount(json!(0))),
            ThresholdSignal::Amount(0)
        );
    }

    #[test]
    fn dollar_string_parses_to_integer_dollars() {
        assert_eq!(
            extract_threshold(&with_amount(json!("$75"))),
            ThresholdSignal::Amount(75)
        );
        assert_eq!(
            extract_threshold(&with_amount(json!("75.00"))),
            ThresholdSignal::Amount(75)
        );
    }

    #[test]
    fn amount_above_ceiling_is_discarded() {
        assert_eq!(
            extract_threshold(&with_amount(json!("$999"))),
            ThresholdSignal::Unknown
        );
        assert_eq!(
            extract_threshold(&with_amount(json!(999))),
            ThresholdSignal::Unknown
        );
    }

    #[test]
    fn unconditional_free_shipping_policy_is_zero() {
        assert_eq!(
            extract_threshold(&with_policy("Free shipping on all orders")),
            ThresholdSignal::Amount(0)
        );
    }

    #[test]
    fn qualified_free_shipping_is_not_zero() {
        assert_eq!(
            extract_threshold(&with_policy("Free shipping on orders over 50")),
            ThresholdSignal::Unknown
        );
    }

    #[test]
    fn checkout_calculation_is_a_sentinel_not_unknown() {
        let signal = extract_threshold(&with_policy("Shipping & taxes calculated at checkout"));
        assert_eq!(signal, ThresholdSignal::NotAThreshold);
        assert_eq!(signal.as_amount(), None);
    }

    #[test]
    fn free_shipping_wins_over_checkout_mention() {
        // Rule 3 comes before rule 4.
        assert_eq!(
            extract_threshold(&with_policy(
                "Free shipping on every order. Taxes calculated at checkout."
            )),
            ThresholdSignal::Amount(0)
        );
    }

    #[test]
    fn invalid_amount_falls_through_to_policy_text() {
        let data = StructuredData {
            threshold_amount: Some(json!("$999")),
            shipping_policy: Some("Free delivery, always".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_threshold(&data), ThresholdSignal::Amount(0));
    }

    #[test]
    fn empty_payload_is_unknown() {
        assert_eq!(
            extract_threshold(&StructuredData::default()),
            ThresholdSignal::Unknown
        );
    }

    #[test]
    fn policy_with_amount_but_no_structured_field_is_unknown() {
        // The policy-text rule only handles the no-amount case; amounts in
        // prose belong to the structured field upstream.
        assert_eq!(
            extract_threshold(&with_policy("Free shipping on orders over $50")),
            ThresholdSignal::Unknown
        );
    }
}
