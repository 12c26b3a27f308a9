//! Transaction service: append-only ledger writes and per-user reads.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::pattern::{MessageSubtype, MessageType};
use crate::models::transaction::{parse_sms_date, SaveTransaction, Transaction};

/// Save a matched extraction as a transaction owned by the caller.
/// Requires `matched: true`; an unmatched result has no fields worth saving.
pub async fn save(
    pool: &PgPool,
    user_id: Uuid,
    request: &SaveTransaction,
) -> Result<Transaction, AppError> {
    if !request.matched {
        return Err(AppError::Validation(
            "Only matched extraction results can be saved".to_string(),
        ));
    }

    let date = request.date.as_deref().and_then(parse_sms_date);

    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions
            (user_id, raw_message, bank_name, merchant_name, amount, account_number,
             tx_type, msg_type, msg_subtype, date, reference_no, available_balance)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&request.raw_message)
    .bind(&request.bank_name)
    .bind(&request.merchant_name)
    .bind(request.amount)
    .bind(&request.account_number)
    .bind(request.tx_type)
    .bind(request.msg_type)
    .bind(request.msg_subtype)
    .bind(date)
    .bind(&request.reference_no)
    .bind(request.available_balance)
    .fetch_one(pool)
    .await?;

    Ok(tx)
}

/// The caller's transactions, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
    let rows = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Aggregate view over a user's ledger. Rows without an amount contribute to
/// counts but not totals; missing is not zero.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransactionSummary {
    pub count: usize,
    pub total_debited: Decimal,
    pub total_credited: Decimal,
    pub by_category: BTreeMap<MessageSubtype, Decimal>,
}

/// Pure aggregation over a transaction collection.
pub fn summarize(rows: &[Transaction]) -> TransactionSummary {
    let mut total_debited = Decimal::ZERO;
    let mut total_credited = Decimal::ZERO;
    let mut by_category: BTreeMap<MessageSubtype, Decimal> = BTreeMap::new();

    for row in rows {
        let Some(amount) = row.amount else { continue };
        match row.msg_type {
            Some(MessageType::Debited) => total_debited += amount,
            Some(MessageType::Credited) => total_credited += amount,
            None => {}
        }
        let category = row.msg_subtype.unwrap_or(MessageSubtype::Other);
        *by_category.entry(category).or_insert(Decimal::ZERO) += amount;
    }

    TransactionSummary {
        count: rows.len(),
        total_debited,
        total_credited,
        by_category,
    }
}
