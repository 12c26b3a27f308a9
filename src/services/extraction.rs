//! Extraction engine: compiles pattern expressions, resolves candidates for
//! an incoming SMS, and produces normalized extraction results.
//!
//! The engine never mutates store state. Recording a FAILED pattern row for
//! an unmatched runtime SMS is the route layer's call (see
//! `services::pattern::record_failed_sms`), so bulk runs and maker
//! pre-checks stay side-effect free.

use std::sync::Arc;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::bank::Bank;
use crate::models::category::MerchantCategory;
use crate::models::extraction::ExtractionResult;
use crate::models::pattern::{MessageSubtype, Pattern, PatternDefaults, PatternStatus};
use crate::services::category;
use crate::services::normalize::{self, RawCaptures};

/// Upper bound on compiled expression size. Oversized expressions are
/// rejected at compile time rather than allowed to eat memory.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Compile a pattern expression the way every evaluation site does:
/// case-insensitive, size-limited.
pub fn compile(expression: &str) -> Result<Regex, AppError> {
    if expression.trim().is_empty() {
        return Err(AppError::Validation("expression is required".to_string()));
    }
    RegexBuilder::new(expression)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| AppError::Validation(format!("Invalid regex pattern: {e}")))
}

/// Evaluate a compiled expression against an SMS under a wall-clock budget.
///
/// The regex crate's engine does not backtrack, but very large inputs or
/// automata can still exceed the budget; those surface as MatcherTimeout so
/// a Maker sees a performance problem rather than a silent no-match.
pub async fn evaluate(
    re: Arc<Regex>,
    sms: String,
    budget: Duration,
) -> Result<Option<RawCaptures>, AppError> {
    let handle = tokio::task::spawn_blocking(move || {
        re.captures(&sms).map(|caps| RawCaptures::collect(&re, &caps))
    });
    match tokio::time::timeout(budget, handle).await {
        Ok(Ok(captures)) => Ok(captures),
        Ok(Err(e)) => Err(AppError::Internal(format!("Matcher task failed: {e}"))),
        Err(_) => Err(AppError::MatcherTimeout(format!(
            "expression exceeded the {}ms evaluation budget",
            budget.as_millis()
        ))),
    }
}

/// Apply a stored pattern to one SMS: match, normalize with the pattern's
/// defaults, infer the category, annotate pattern identity.
pub async fn extract_with_pattern(
    pattern: &Pattern,
    sms: &str,
    categories: &[MerchantCategory],
    budget: Duration,
) -> Result<Option<ExtractionResult>, AppError> {
    let re = Arc::new(compile(&pattern.expression)?);
    let Some(caps) = evaluate(re, sms.to_string(), budget).await? else {
        return Ok(None);
    };

    let mut result = normalize::normalize(&caps, &pattern.defaults());
    apply_category_inference(&mut result, categories);
    result.pattern_id = Some(pattern.id);
    result.expression = Some(pattern.expression.clone());
    Ok(Some(result))
}

/// Fill in the spend category when the regex did not capture one explicitly:
/// merchant lookup first, then the pattern default already placed by the
/// normalizer, then OTHER.
fn apply_category_inference(result: &mut ExtractionResult, categories: &[MerchantCategory]) {
    if result.parsed_msg_subtype {
        return;
    }
    if let Some(merchant) = result.merchant_name.as_deref() {
        if let Some(inferred) = category::infer_from_rows(categories, merchant) {
            result.msg_subtype = Some(inferred);
            result.parsed_msg_subtype = true;
            return;
        }
    }
    if result.msg_subtype.is_none() {
        result.msg_subtype = Some(MessageSubtype::Other);
    }
}

/// Test mode: run a bare expression against a sample with no stored
/// defaults. Compile errors and evaluation timeouts propagate so a Maker or
/// Checker sees why the pattern failed, not just that it did.
pub async fn test_pattern(
    expression: &str,
    sample: &str,
    budget: Duration,
) -> Result<ExtractionResult, AppError> {
    let re = Arc::new(compile(expression)?);
    match evaluate(re, sample.to_string(), budget).await? {
        Some(caps) => {
            let mut result = normalize::normalize(&caps, &PatternDefaults::default());
            apply_category_inference(&mut result, &[]);
            result.expression = Some(expression.to_string());
            Ok(result)
        }
        None => Ok(ExtractionResult::not_matched(
            "Pattern did not match the SMS",
        )),
    }
}

/// Outcome of candidate resolution for one SMS.
#[derive(Debug)]
pub struct Resolution {
    pub result: ExtractionResult,
    /// The bank resolved from the sender title, if any. Needed by the
    /// failed-SMS recording path even when no pattern matched.
    pub bank_id: Option<Uuid>,
}

/// Resolve candidates from prefetched data and return the first match.
///
/// `patterns` must already be restricted to APPROVED and ordered
/// most-recently-updated first; the order is the deterministic tie-break
/// between overlapping patterns. Patterns whose expressions fail to compile
/// are skipped, as is one that exceeds the evaluation budget.
pub async fn resolve(
    banks: &[Bank],
    patterns: &[Pattern],
    categories: &[MerchantCategory],
    sms_title: &str,
    sms: &str,
    budget: Duration,
) -> Resolution {
    let Some(bank) = banks.iter().find(|b| b.matches_title(sms_title)) else {
        return Resolution {
            result: ExtractionResult::not_matched(format!(
                "No bank found in SMS title: {sms_title}"
            )),
            bank_id: None,
        };
    };

    let candidates: Vec<&Pattern> = patterns
        .iter()
        .filter(|p| p.status == PatternStatus::Approved && p.bank_id == Some(bank.id))
        .collect();

    if candidates.is_empty() {
        return Resolution {
            result: ExtractionResult::not_matched(format!(
                "No approved patterns found for bank: {}",
                bank.name
            )),
            bank_id: Some(bank.id),
        };
    }

    for pattern in candidates {
        match extract_with_pattern(pattern, sms, categories, budget).await {
            Ok(Some(result)) => {
                return Resolution {
                    result,
                    bank_id: Some(bank.id),
                }
            }
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(pattern_id = %pattern.id, error = %e, "Skipping unusable pattern");
                continue;
            }
        }
    }

    Resolution {
        result: ExtractionResult::not_matched("no matching pattern found for this SMS"),
        bank_id: Some(bank.id),
    }
}

/// Resolution mode against the store: load banks, approved patterns, and
/// merchant categories, then delegate to the pure resolver.
pub async fn find_pattern(
    pool: &PgPool,
    sms_title: &str,
    sms: &str,
    budget: Duration,
) -> Result<Resolution, AppError> {
    let banks = sqlx::query_as::<_, Bank>("SELECT * FROM banks ORDER BY name")
        .fetch_all(pool)
        .await?;
    let patterns = sqlx::query_as::<_, Pattern>(
        "SELECT * FROM patterns WHERE status = 'APPROVED' ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await?;
    let categories = category::load_all(pool).await?;

    Ok(resolve(&banks, &patterns, &categories, sms_title, sms, budget).await)
}
