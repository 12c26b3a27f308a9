//! Merchant spend-category inference.
//!
//! Resolution order: exact/substring match against the merchant_categories
//! table, then a fixed keyword table. Callers default unresolved merchants
//! to `OTHER`.

use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::category::MerchantCategory;
use crate::models::pattern::MessageSubtype;

/// Fixed keyword-to-category mapping for merchants not present in the table.
const KEYWORD_CATEGORIES: &[(&str, MessageSubtype)] = &[
    ("ZOMATO", MessageSubtype::Food),
    ("SWIGGY", MessageSubtype::Food),
    ("DOMINOS", MessageSubtype::Food),
    ("MCDONALD", MessageSubtype::Food),
    ("RESTAURANT", MessageSubtype::Food),
    ("PHARMACY", MessageSubtype::Health),
    ("APOLLO", MessageSubtype::Health),
    ("HOSPITAL", MessageSubtype::Health),
    ("CLINIC", MessageSubtype::Health),
    ("AMAZON", MessageSubtype::Shopping),
    ("FLIPKART", MessageSubtype::Shopping),
    ("MYNTRA", MessageSubtype::Shopping),
    ("IRCTC", MessageSubtype::Travel),
    ("UBER", MessageSubtype::Travel),
    ("OLA", MessageSubtype::Travel),
    ("MAKEMYTRIP", MessageSubtype::Travel),
    ("INDIGO", MessageSubtype::Travel),
    ("NETFLIX", MessageSubtype::Entertainment),
    ("SPOTIFY", MessageSubtype::Entertainment),
    ("BOOKMYSHOW", MessageSubtype::Entertainment),
    ("PVR", MessageSubtype::Entertainment),
    ("AIRTEL", MessageSubtype::Bills),
    ("JIO", MessageSubtype::Bills),
    ("VODAFONE", MessageSubtype::Bills),
    ("ELECTRICITY", MessageSubtype::Bills),
    ("BROADBAND", MessageSubtype::Bills),
    ("SALARY", MessageSubtype::Salary),
    ("PAYROLL", MessageSubtype::Salary),
];

/// Look up a category in the fixed keyword table.
pub fn infer_from_keywords(merchant_name: &str) -> Option<MessageSubtype> {
    let upper = merchant_name.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }
    KEYWORD_CATEGORIES
        .iter()
        .find(|(kw, _)| upper.contains(kw))
        .map(|(_, category)| *category)
}

/// Resolve a category from prefetched table rows, falling back to keywords.
pub fn infer_from_rows(rows: &[MerchantCategory], merchant_name: &str) -> Option<MessageSubtype> {
    let upper = merchant_name.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }
    rows.iter()
        .find(|row| row.applies_to(&upper))
        .map(|row| row.category)
        .or_else(|| infer_from_keywords(merchant_name))
}

/// Load all merchant-category rows. The table is small and read per
/// extraction run, not per item.
pub async fn load_all(pool: &PgPool) -> Result<Vec<MerchantCategory>, AppError> {
    let rows = sqlx::query_as::<_, MerchantCategory>(
        "SELECT * FROM merchant_categories ORDER BY merchant_name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn row(name: &str, category: MessageSubtype) -> MerchantCategory {
        MerchantCategory {
            id: Uuid::new_v4(),
            merchant_name: name.to_string(),
            category,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn keyword_inference_is_case_insensitive() {
        assert_eq!(infer_from_keywords("Zomato Foods"), Some(MessageSubtype::Food));
        assert_eq!(infer_from_keywords("uber india"), Some(MessageSubtype::Travel));
        assert_eq!(infer_from_keywords("corner store"), None);
    }

    #[test]
    fn table_rows_take_precedence_over_keywords() {
        // A curated row can reclassify a merchant the keyword table would
        // otherwise catch.
        let rows = vec![row("AMAZON PRIME VIDEO", MessageSubtype::Entertainment)];
        assert_eq!(
            infer_from_rows(&rows, "AMAZON PRIME VIDEO"),
            Some(MessageSubtype::Entertainment)
        );
        assert_eq!(
            infer_from_rows(&rows, "AMAZON"),
            Some(MessageSubtype::Entertainment)
        );
    }

    #[test]
    fn falls_back_to_keywords_when_no_row_applies() {
        let rows = vec![row("LOCAL KIRANA", MessageSubtype::Shopping)];
        assert_eq!(infer_from_rows(&rows, "SWIGGY"), Some(MessageSubtype::Food));
        assert_eq!(infer_from_rows(&rows, "UNKNOWN LLC"), None);
    }

    #[test]
    fn empty_merchant_resolves_to_nothing() {
        assert_eq!(infer_from_rows(&[], "  "), None);
        assert_eq!(infer_from_keywords(""), None);
    }
}
