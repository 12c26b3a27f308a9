//! Merchant-to-category mapping rows backing spend-category inference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::pattern::MessageSubtype;

/// A known merchant and its spend category. Merchant names are stored
/// uppercase and matched as substrings in either direction, so "ZOMATO FOODS"
/// resolves via a "ZOMATO" row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MerchantCategory {
    pub id: Uuid,
    pub merchant_name: String,
    pub category: MessageSubtype,
    pub created_at: DateTime<Utc>,
}

impl MerchantCategory {
    /// Whether this row applies to the given (already uppercased) merchant.
    pub fn applies_to(&self, merchant_upper: &str) -> bool {
        let own = self.merchant_name.to_uppercase();
        merchant_upper.contains(&own) || own.contains(merchant_upper)
    }
}
