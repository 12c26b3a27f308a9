//! Field normalizer: raw named captures in, typed canonical fields out.
//!
//! Pure over its inputs. Each output field is either the trimmed capture
//! (amounts additionally stripped of currency tokens and parsed to a
//! two-digit Decimal) or the pattern's stored default; a per-field flag
//! records which source won. A capture that is present but empty counts as
//! absent — an optional group that matched nothing is not data.

use std::collections::HashMap;

use regex::Regex;
use rust_decimal::Decimal;

use crate::models::extraction::ExtractionResult;
use crate::models::pattern::{MessageSubtype, MessageType, PatternDefaults, TransactionType};

/// Capture group names recognized for each field. Patterns written against
/// the original group vocabulary keep working.
const MERCHANT_GROUPS: &[&str] = &["merchantName", "merchant"];
const TX_TYPE_GROUPS: &[&str] = &["txType", "type"];
const REFERENCE_GROUPS: &[&str] = &["referenceNumber", "refNo"];

/// Named captures from one regex evaluation, trimmed, with empty values
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct RawCaptures {
    values: HashMap<String, String>,
}

impl RawCaptures {
    /// Collect the named groups of a successful match.
    pub fn collect(re: &Regex, caps: &regex::Captures<'_>) -> Self {
        let mut values = HashMap::new();
        for name in re.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                let trimmed = m.as_str().trim();
                if !trimmed.is_empty() {
                    values.insert(name.to_string(), trimmed.to_string());
                }
            }
        }
        Self { values }
    }

    /// Build captures directly from pairs (test construction).
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.to_string(), v.trim().to_string()))
            .collect();
        Self { values }
    }

    /// First present value among the given group names.
    pub fn first(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.values.get(*name))
            .map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.first(&[name])
    }
}

/// Parse an amount string: strip currency tokens and grouping commas, then
/// parse to a Decimal rescaled to two fractional digits. Unparseable input
/// is None, never zero.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut cleaned = raw.trim().to_string();
    for token in ["₹", "INR", "Rs.", "RS.", "rs.", "Rs", "RS", "rs"] {
        cleaned = cleaned.replace(token, "");
    }
    cleaned.retain(|c| c != ',' && !c.is_whitespace());
    if cleaned.is_empty() {
        return None;
    }
    let mut amount: Decimal = cleaned.parse().ok()?;
    amount.rescale(2);
    Some(amount)
}

/// Turn raw captures plus pattern defaults into a matched extraction result.
///
/// Category inference from the merchant name is layered on by the engine,
/// which has the merchant table in hand; this function only applies the
/// pattern's own stored subtype default.
pub fn normalize(caps: &RawCaptures, defaults: &PatternDefaults) -> ExtractionResult {
    let mut result = ExtractionResult::matched();

    result.amount = caps.get("amount").and_then(parse_amount);
    result.account_number = caps.get("accountNumber").map(str::to_string);
    result.available_balance = caps.get("availableBalance").and_then(parse_amount);
    result.date = caps.get("date").map(str::to_string);
    result.reference_no = caps.first(REFERENCE_GROUPS).map(str::to_string);

    result.bank_name = caps.get("bankName").map(str::to_string);
    result.parsed_bank_name = result.bank_name.is_some();
    if result.bank_name.is_none() {
        result.bank_name = defaults.bank_name.clone();
    }

    result.merchant_name = caps.first(MERCHANT_GROUPS).map(str::to_string);
    result.parsed_merchant_name = result.merchant_name.is_some();
    if result.merchant_name.is_none() {
        result.merchant_name = defaults.merchant_name.clone();
    }

    result.tx_type = caps.first(TX_TYPE_GROUPS).and_then(TransactionType::parse);
    result.parsed_tx_type = result.tx_type.is_some();
    if result.tx_type.is_none() {
        result.tx_type = defaults.tx_type;
    }

    result.msg_type = caps.get("msgType").and_then(MessageType::parse);
    result.parsed_msg_type = result.msg_type.is_some();
    if result.msg_type.is_none() {
        result.msg_type = defaults.msg_type;
    }

    result.msg_subtype = caps.get("msgSubtype").and_then(MessageSubtype::parse);
    result.parsed_msg_subtype = result.msg_subtype.is_some();
    if result.msg_subtype.is_none() {
        result.msg_subtype = defaults.msg_subtype;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults_with_bank(bank: &str) -> PatternDefaults {
        PatternDefaults {
            bank_name: Some(bank.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn amount_strips_currency_and_commas() {
        assert_eq!(parse_amount("Rs.1,234.50"), Some(Decimal::new(123450, 2)));
        assert_eq!(parse_amount("INR 500"), Some(Decimal::new(50000, 2)));
        assert_eq!(parse_amount("₹99.9"), Some(Decimal::new(9990, 2)));
    }

    #[test]
    fn unparseable_amount_is_none_not_zero() {
        assert_eq!(parse_amount("five hundred"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("Rs."), None);
    }

    #[test]
    fn zero_amount_is_preserved() {
        assert_eq!(parse_amount("0"), Some(Decimal::new(0, 2)));
    }

    #[test]
    fn captured_bank_name_wins_over_default() {
        let caps = RawCaptures::from_pairs([("bankName", "HDFC")]);
        let result = normalize(&caps, &defaults_with_bank("SBI"));
        assert_eq!(result.bank_name.as_deref(), Some("HDFC"));
        assert!(result.parsed_bank_name);
    }

    #[test]
    fn default_fills_uncaptured_bank_with_provenance_false() {
        let caps = RawCaptures::from_pairs([("amount", "500")]);
        let result = normalize(&caps, &defaults_with_bank("SBI"));
        assert_eq!(result.bank_name.as_deref(), Some("SBI"));
        assert!(!result.parsed_bank_name);
        assert_eq!(result.amount, Some(Decimal::new(50000, 2)));
    }

    #[test]
    fn empty_capture_is_treated_as_absent() {
        let caps = RawCaptures::from_pairs([("bankName", "   ")]);
        let result = normalize(&caps, &defaults_with_bank("SBI"));
        assert_eq!(result.bank_name.as_deref(), Some("SBI"));
        assert!(!result.parsed_bank_name);
    }

    #[test]
    fn merchant_and_reference_group_aliases() {
        let caps = RawCaptures::from_pairs([("merchant", "ZOMATO"), ("refNo", "REF123")]);
        let result = normalize(&caps, &PatternDefaults::default());
        assert_eq!(result.merchant_name.as_deref(), Some("ZOMATO"));
        assert!(result.parsed_merchant_name);
        assert_eq!(result.reference_no.as_deref(), Some("REF123"));
    }

    #[test]
    fn typed_enums_parsed_from_captures() {
        let caps = RawCaptures::from_pairs([("type", "upi"), ("msgType", "debited")]);
        let result = normalize(&caps, &PatternDefaults::default());
        assert_eq!(result.tx_type, Some(TransactionType::Upi));
        assert_eq!(result.msg_type, Some(MessageType::Debited));
        assert!(result.parsed_tx_type);
        assert!(result.parsed_msg_type);
    }

    #[test]
    fn unrecognized_enum_capture_falls_back_to_default() {
        let caps = RawCaptures::from_pairs([("txType", "WIRE")]);
        let defaults = PatternDefaults {
            tx_type: Some(TransactionType::Other),
            ..Default::default()
        };
        let result = normalize(&caps, &defaults);
        assert_eq!(result.tx_type, Some(TransactionType::Other));
        assert!(!result.parsed_tx_type);
    }

    #[test]
    fn collect_drops_empty_groups() {
        let re = Regex::new(r"(?<amount>\d+)(?:\s+(?<bankName>[A-Z]+))?").unwrap();
        let caps = re.captures("500").unwrap();
        let raw = RawCaptures::collect(&re, &caps);
        assert_eq!(raw.get("amount"), Some("500"));
        assert_eq!(raw.get("bankName"), None);
    }
}
