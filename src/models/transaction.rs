//! Persisted transaction ledger entries, owned by the saving User.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::pattern::{MessageSubtype, MessageType, TransactionType};

/// A saved ledger entry. Append-only: no update or delete operations exist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub raw_message: String,
    pub bank_name: Option<String>,
    pub merchant_name: Option<String>,
    pub amount: Option<Decimal>,
    pub account_number: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub msg_type: Option<MessageType>,
    pub msg_subtype: Option<MessageSubtype>,
    pub date: Option<NaiveDate>,
    pub reference_no: Option<String>,
    pub available_balance: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Request to save a matched extraction as a transaction.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveTransaction {
    /// Must be true; saving an unmatched result is a validation error.
    pub matched: bool,
    #[validate(length(min = 1, message = "raw_message is required"))]
    pub raw_message: String,
    pub bank_name: Option<String>,
    pub merchant_name: Option<String>,
    pub amount: Option<Decimal>,
    pub account_number: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub msg_type: Option<MessageType>,
    pub msg_subtype: Option<MessageSubtype>,
    /// Raw date text as it appeared in the SMS; parsed on save.
    pub date: Option<String>,
    pub reference_no: Option<String>,
    pub available_balance: Option<Decimal>,
}

/// Date formats seen in Indian bank SMS text, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%d-%b-%y",  // 10-Jan-26
    "%d-%b-%Y",  // 10-Jan-2026
    "%d%b%y",    // 14Jan26
    "%d%b%Y",    // 14Jan2026
    "%Y-%m-%d",  // 2026-01-10
    "%d/%m/%Y",  // 10/01/2026
    "%d/%m/%y",  // 10/01/26
];

/// Parse an SMS date string against the known formats; None if none fit.
pub fn parse_sms_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_sms_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        assert_eq!(parse_sms_date("10-Jan-26"), Some(expected));
        assert_eq!(parse_sms_date("10-Jan-2026"), Some(expected));
        assert_eq!(parse_sms_date("2026-01-10"), Some(expected));
        assert_eq!(parse_sms_date("10/01/2026"), Some(expected));
        assert_eq!(parse_sms_date("10/01/26"), Some(expected));
    }

    #[test]
    fn parses_compact_format() {
        assert_eq!(
            parse_sms_date("14Jan26"),
            NaiveDate::from_ymd_opt(2026, 1, 14)
        );
    }

    #[test]
    fn unknown_format_yields_none() {
        assert_eq!(parse_sms_date("Jan tenth"), None);
        assert_eq!(parse_sms_date(""), None);
    }
}
