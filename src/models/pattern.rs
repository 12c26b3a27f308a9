//! Pattern model: the regex extraction rule with its lifecycle status and
//! stored default field values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "pattern_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PatternStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    /// Recorded automatically when a runtime SMS matched no approved pattern.
    /// Editable by a Maker like Rejected; never entered by a reviewer action.
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "transaction_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Upi,
    Neft,
    Rtgs,
    Imps,
    Cash,
    Card,
    Atm,
    Other,
}

impl TransactionType {
    /// Parse a raw SMS capture, case-insensitively. Unknown values are None.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "UPI" => Some(Self::Upi),
            "NEFT" => Some(Self::Neft),
            "RTGS" => Some(Self::Rtgs),
            "IMPS" => Some(Self::Imps),
            "CASH" => Some(Self::Cash),
            "CARD" => Some(Self::Card),
            "ATM" => Some(Self::Atm),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "message_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Debited,
    Credited,
}

impl MessageType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "DEBITED" | "DEBIT" => Some(Self::Debited),
            "CREDITED" | "CREDIT" => Some(Self::Credited),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(type_name = "message_subtype", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageSubtype {
    Food,
    Health,
    Shopping,
    Travel,
    Entertainment,
    Bills,
    Salary,
    Transfer,
    Other,
}

impl MessageSubtype {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "FOOD" => Some(Self::Food),
            "HEALTH" => Some(Self::Health),
            "SHOPPING" => Some(Self::Shopping),
            "TRAVEL" => Some(Self::Travel),
            "ENTERTAINMENT" => Some(Self::Entertainment),
            "BILLS" => Some(Self::Bills),
            "SALARY" => Some(Self::Salary),
            "TRANSFER" => Some(Self::Transfer),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Pattern row. Once `status` reaches Approved the row is immutable; edits
/// create a new row with `supersedes` pointing back at this one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pattern {
    pub id: Uuid,
    pub bank_id: Option<Uuid>,
    pub expression: String,
    pub sample_text: Option<String>,
    pub sender_title: Option<String>,
    pub bank_name: Option<String>,
    pub merchant_name: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub msg_type: Option<MessageType>,
    pub msg_subtype: Option<MessageSubtype>,
    pub status: PatternStatus,
    pub owner_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
    pub supersedes: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    /// Default field values used by the normalizer for groups the regex did
    /// not capture.
    pub fn defaults(&self) -> PatternDefaults {
        PatternDefaults {
            bank_name: self.bank_name.clone(),
            merchant_name: self.merchant_name.clone(),
            tx_type: self.tx_type,
            msg_type: self.msg_type,
            msg_subtype: self.msg_subtype,
        }
    }
}

/// Stored default values a pattern supplies for uncaptured fields.
#[derive(Debug, Clone, Default)]
pub struct PatternDefaults {
    pub bank_name: Option<String>,
    pub merchant_name: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub msg_type: Option<MessageType>,
    pub msg_subtype: Option<MessageSubtype>,
}

/// Request body for creating or editing a pattern.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SavePattern {
    #[validate(length(min = 1, message = "expression is required"))]
    pub expression: String,
    pub sample_text: Option<String>,
    pub sender_title: Option<String>,
    pub bank_name: Option<String>,
    pub merchant_name: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub msg_type: Option<MessageType>,
    pub msg_subtype: Option<MessageSubtype>,
}

/// Creation request: a Maker may create straight into Draft or Pending.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePattern {
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: SavePattern,
    pub status: CreationStatus,
}

/// The two valid creation states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CreationStatus {
    Draft,
    Pending,
}

impl From<CreationStatus> for PatternStatus {
    fn from(s: CreationStatus) -> Self {
        match s {
            CreationStatus::Draft => PatternStatus::Draft,
            CreationStatus::Pending => PatternStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialization() {
        assert_eq!(
            serde_json::to_string(&PatternStatus::Approved).unwrap(),
            "\"APPROVED\""
        );
        let s: PatternStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(s, PatternStatus::Failed);
    }

    #[test]
    fn tx_type_parse_is_case_insensitive() {
        assert_eq!(TransactionType::parse("upi"), Some(TransactionType::Upi));
        assert_eq!(TransactionType::parse(" NEFT "), Some(TransactionType::Neft));
        assert_eq!(TransactionType::parse("wire"), None);
    }

    #[test]
    fn msg_type_parse_accepts_verb_forms() {
        assert_eq!(MessageType::parse("debited"), Some(MessageType::Debited));
        assert_eq!(MessageType::parse("CREDIT"), Some(MessageType::Credited));
        assert_eq!(MessageType::parse("reversed"), None);
    }

    #[test]
    fn creation_status_maps_into_pattern_status() {
        assert_eq!(
            PatternStatus::from(CreationStatus::Draft),
            PatternStatus::Draft
        );
        assert_eq!(
            PatternStatus::from(CreationStatus::Pending),
            PatternStatus::Pending
        );
    }
}
