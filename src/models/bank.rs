//! Bank registry used to resolve an SMS sender title to candidate patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Bank row. Names are stored uppercase; sender-title resolution is a
/// case-insensitive substring match against them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bank {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Bank {
    /// Whether this bank's name appears in the given sender title.
    pub fn matches_title(&self, sender_title: &str) -> bool {
        sender_title.to_uppercase().contains(&self.name.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(name: &str) -> Bank {
        Bank {
            id: Uuid::nil(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn title_match_is_case_insensitive_substring() {
        let hdfc = bank("HDFCBK");
        assert!(hdfc.matches_title("AD-HDFCBK-S"));
        assert!(hdfc.matches_title("ad-hdfcbk"));
        assert!(!hdfc.matches_title("AD-SBIBNK-S"));
    }
}
