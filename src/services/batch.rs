//! Batch coordinator: fans bulk SMS items through the extraction engine
//! with bounded concurrency and per-item failure isolation.
//!
//! Nothing a single item does can abort the batch; a malformed item or an
//! unusable pattern becomes that item's `matched: false` result. The report
//! is always restored to input order, whatever order items complete in.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

use crate::errors::AppError;
use crate::models::bank::Bank;
use crate::models::category::MerchantCategory;
use crate::models::extraction::{BatchReport, ExtractionResult, SmsItem, SmsResult};
use crate::models::pattern::Pattern;
use crate::services::category;
use crate::services::extraction;

/// Validate one item before extraction. Violations are per-item failures,
/// not batch errors.
fn precheck(item: &SmsItem) -> Result<(), String> {
    if item.sms_title.trim().is_empty() {
        return Err("sms_title is required".to_string());
    }
    if item.sms.trim().is_empty() {
        return Err("sms is required".to_string());
    }
    Ok(())
}

/// Run a batch over prefetched store data. `patterns` must be APPROVED rows
/// ordered most-recently-updated first.
pub async fn extract_batch_with(
    items: Vec<SmsItem>,
    banks: Arc<Vec<Bank>>,
    patterns: Arc<Vec<Pattern>>,
    categories: Arc<Vec<MerchantCategory>>,
    concurrency: usize,
    budget: Duration,
) -> BatchReport {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks: JoinSet<SmsResult> = JoinSet::new();
    let mut inputs: HashMap<Id, (usize, String, String)> = HashMap::new();

    for (index, item) in items.into_iter().enumerate() {
        let banks = Arc::clone(&banks);
        let patterns = Arc::clone(&patterns);
        let categories = Arc::clone(&categories);
        let semaphore = Arc::clone(&semaphore);
        let echo = (index, item.sms_title.clone(), item.sms.clone());

        let handle = tasks.spawn(async move {
            // Closed only if the JoinSet is dropped, which cancels us anyway.
            let _permit = semaphore.acquire_owned().await;

            let outcome = match precheck(&item) {
                Err(message) => ExtractionResult::not_matched(message),
                Ok(()) => {
                    extraction::resolve(
                        &banks,
                        &patterns,
                        &categories,
                        &item.sms_title,
                        &item.sms,
                        budget,
                    )
                    .await
                    .result
                }
            };

            SmsResult {
                index,
                sms_title: item.sms_title,
                sms: item.sms,
                outcome,
            }
        });
        inputs.insert(handle.id(), echo);
    }

    BatchReport::assemble(drain(tasks, inputs).await)
}

/// Collect all item results. A panicked task must not cost the batch its
/// slot: the item's index and input echo are restored with a failed outcome
/// so the report still covers every input exactly once.
async fn drain(
    mut tasks: JoinSet<SmsResult>,
    mut inputs: HashMap<Id, (usize, String, String)>,
) -> Vec<SmsResult> {
    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, result)) => results.push(result),
            Err(e) => {
                tracing::error!(error = %e, "Bulk extraction task failed");
                if let Some((index, sms_title, sms)) = inputs.remove(&e.id()) {
                    results.push(SmsResult {
                        index,
                        sms_title,
                        sms,
                        outcome: ExtractionResult::not_matched(
                            "internal error during extraction",
                        ),
                    });
                }
            }
        }
    }
    results
}

/// Resolution-mode batch against the store. Unlike the single-SMS user
/// path, bulk never records FAILED pattern rows.
pub async fn extract_batch(
    pool: &PgPool,
    items: Vec<SmsItem>,
    concurrency: usize,
    budget: Duration,
) -> Result<BatchReport, AppError> {
    let banks = sqlx::query_as::<_, Bank>("SELECT * FROM banks ORDER BY name")
        .fetch_all(pool)
        .await?;
    let patterns = sqlx::query_as::<_, Pattern>(
        "SELECT * FROM patterns WHERE status = 'APPROVED' ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await?;
    let categories = category::load_all(pool).await?;

    Ok(extract_batch_with(
        items,
        Arc::new(banks),
        Arc::new(patterns),
        Arc::new(categories),
        concurrency,
        budget,
    )
    .await)
}
