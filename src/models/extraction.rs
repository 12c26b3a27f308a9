//! Extraction DTOs: the per-SMS result and the bulk report envelope.
//!
//! These are ephemeral — nothing here is persisted. A `Transaction` row is
//! only created when a User explicitly saves a matched result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::pattern::{MessageSubtype, MessageType, TransactionType};

/// The typed output of applying one pattern to one SMS.
///
/// When `matched` is false only `message` is populated. The `parsed_*` flags
/// record provenance: true when the value came out of the SMS text, false
/// when it was filled from the pattern's stored default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub matched: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_type: Option<MessageType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_subtype: Option<MessageSubtype>,
    /// Raw date text as captured; parsed only when saving a transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_balance: Option<Decimal>,

    pub parsed_bank_name: bool,
    pub parsed_merchant_name: bool,
    pub parsed_tx_type: bool,
    pub parsed_msg_type: bool,
    pub parsed_msg_subtype: bool,
}

impl ExtractionResult {
    /// A failed result carrying only an explanatory message.
    pub fn not_matched(message: impl Into<String>) -> Self {
        Self {
            matched: false,
            message: message.into(),
            ..Default::default()
        }
    }

    /// A fresh matched result; field values are filled in by the normalizer.
    pub fn matched() -> Self {
        Self {
            matched: true,
            message: "Pattern matched successfully".to_string(),
            ..Default::default()
        }
    }
}

/// One input item of a bulk extraction request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SmsItem {
    #[serde(default)]
    pub sms_title: String,
    #[serde(default)]
    pub sms: String,
}

/// Per-item outcome in a bulk report, keyed back to the input by `index`.
#[derive(Debug, Clone, Serialize)]
pub struct SmsResult {
    pub index: usize,
    pub sms_title: String,
    pub sms: String,
    #[serde(flatten)]
    pub outcome: ExtractionResult,
}

/// Aggregate of a bulk extraction run. `total_count` always equals
/// `success_count + failed_count` and the length of `results`, which are
/// ordered by input index.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total_count: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<SmsResult>,
}

impl BatchReport {
    /// Assemble a report from per-item results: restore input order and
    /// compute the counts once.
    pub fn assemble(mut results: Vec<SmsResult>) -> Self {
        results.sort_by_key(|r| r.index);
        let success_count = results.iter().filter(|r| r.outcome.matched).count();
        let failed_count = results.len() - success_count;
        Self {
            total_count: results.len(),
            success_count,
            failed_count,
            results,
        }
    }
}
