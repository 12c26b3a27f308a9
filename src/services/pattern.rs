//! Pattern store: lifecycle state machine, ownership guards, and
//! compare-and-swap review transitions.
//!
//! Status changes are the only contended writes in the system. A review is
//! applied with `UPDATE ... WHERE id = $1 AND status = 'PENDING'`; of two
//! concurrent reviewers, exactly one sees a row updated and the loser gets a
//! retryable Conflict.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::bank::Bank;
use crate::models::pattern::{CreatePattern, Pattern, PatternStatus, SavePattern};

/// Valid edges of the lifecycle graph. Draft→Draft is the in-place update a
/// Maker performs while authoring; Approved has no outgoing maker edge —
/// editing an approved pattern creates a superseding row instead.
pub fn is_valid_transition(from: PatternStatus, to: PatternStatus) -> bool {
    use PatternStatus::*;
    matches!(
        (from, to),
        (Draft, Draft)
            | (Draft, Pending)
            | (Pending, Approved)
            | (Pending, Rejected)
            | (Rejected, Draft)
            | (Rejected, Pending)
            | (Failed, Draft)
            | (Failed, Pending)
    )
}

/// A checker's decision on a pending pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approve,
    Reject,
}

impl ReviewVerdict {
    pub fn target(self) -> PatternStatus {
        match self {
            Self::Approve => PatternStatus::Approved,
            Self::Reject => PatternStatus::Rejected,
        }
    }
}

/// Maker-side ownership guard. Automatically recorded FAILED rows have no
/// owner and may be adopted by any maker.
pub fn ensure_owner(pattern: &Pattern, maker_id: Uuid) -> Result<(), AppError> {
    match pattern.owner_id {
        Some(owner) if owner != maker_id => Err(AppError::Forbidden(
            "Only the owning maker may edit this pattern".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Self-review guard: a checker may not review a pattern they authored.
pub fn ensure_not_self_review(pattern: &Pattern, checker_id: Uuid) -> Result<(), AppError> {
    if pattern.owner_id == Some(checker_id) {
        return Err(AppError::Forbidden(
            "Checkers may not review their own patterns".to_string(),
        ));
    }
    Ok(())
}

/// List patterns in a given status, optionally scoped to an owning maker.
pub async fn list_by_status(
    pool: &PgPool,
    status: PatternStatus,
    owner_id: Option<Uuid>,
) -> Result<Vec<Pattern>, AppError> {
    let patterns = sqlx::query_as::<_, Pattern>(
        r#"
        SELECT * FROM patterns
        WHERE status = $1
          AND ($2::uuid IS NULL OR owner_id = $2 OR owner_id IS NULL)
        ORDER BY updated_at DESC
        "#,
    )
    .bind(status)
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(patterns)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Pattern, AppError> {
    sqlx::query_as::<_, Pattern>("SELECT * FROM patterns WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pattern not found: {id}")))
}

/// Resolve the bank for a pattern save: sender title first, then the given
/// bank name (creating the bank if it is new). Mirrors the runtime
/// title-resolution rules so saved patterns are findable later.
async fn find_or_create_bank(
    pool: &PgPool,
    sender_title: Option<&str>,
    bank_name: Option<&str>,
) -> Result<Option<Bank>, AppError> {
    let banks = sqlx::query_as::<_, Bank>("SELECT * FROM banks ORDER BY name")
        .fetch_all(pool)
        .await?;

    if let Some(title) = sender_title.filter(|t| !t.trim().is_empty()) {
        if let Some(bank) = banks.iter().find(|b| b.matches_title(title)) {
            return Ok(Some(bank.clone()));
        }
    }

    let Some(name) = bank_name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    let upper = name.to_uppercase();

    if let Some(bank) = banks
        .iter()
        .find(|b| b.name.to_uppercase().contains(&upper) || upper.contains(&b.name.to_uppercase()))
    {
        return Ok(Some(bank.clone()));
    }

    let bank = sqlx::query_as::<_, Bank>(
        "INSERT INTO banks (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING *",
    )
    .bind(&upper)
    .fetch_one(pool)
    .await?;
    Ok(Some(bank))
}

/// Create a pattern as DRAFT or PENDING, owned by the calling maker.
pub async fn create(
    pool: &PgPool,
    maker_id: Uuid,
    request: &CreatePattern,
) -> Result<Pattern, AppError> {
    let bank = find_or_create_bank(
        pool,
        request.fields.sender_title.as_deref(),
        request.fields.bank_name.as_deref(),
    )
    .await?;

    if bank.is_none() {
        return Err(AppError::Validation(
            "Bank not found in SMS title and bank_name not provided".to_string(),
        ));
    }

    let status: PatternStatus = request.status.into();
    insert_pattern(pool, &request.fields, status, bank.map(|b| b.id), Some(maker_id), None).await
}

async fn insert_pattern(
    pool: &PgPool,
    fields: &SavePattern,
    status: PatternStatus,
    bank_id: Option<Uuid>,
    owner_id: Option<Uuid>,
    supersedes: Option<Uuid>,
) -> Result<Pattern, AppError> {
    let pattern = sqlx::query_as::<_, Pattern>(
        r#"
        INSERT INTO patterns
            (bank_id, expression, sample_text, sender_title, bank_name,
             merchant_name, tx_type, msg_type, msg_subtype, status, owner_id, supersedes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(bank_id)
    .bind(&fields.expression)
    .bind(&fields.sample_text)
    .bind(&fields.sender_title)
    .bind(&fields.bank_name)
    .bind(&fields.merchant_name)
    .bind(fields.tx_type)
    .bind(fields.msg_type)
    .bind(fields.msg_subtype)
    .bind(status)
    .bind(owner_id)
    .bind(supersedes)
    .fetch_one(pool)
    .await?;
    Ok(pattern)
}

/// Maker edit: rewrite an editable pattern's fields and move it to `target`
/// (DRAFT for a plain save, PENDING for submit).
///
/// An APPROVED source row is immutable; editing it inserts a new row with
/// `supersedes` lineage instead of touching the original.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    maker_id: Uuid,
    fields: &SavePattern,
    target: PatternStatus,
) -> Result<Pattern, AppError> {
    debug_assert!(matches!(
        target,
        PatternStatus::Draft | PatternStatus::Pending
    ));

    let current = find_by_id(pool, id).await?;
    ensure_owner(&current, maker_id)?;

    let bank = find_or_create_bank(
        pool,
        fields.sender_title.as_deref(),
        fields.bank_name.as_deref(),
    )
    .await?;
    let bank_id = bank.map(|b| b.id).or(current.bank_id);

    if current.status == PatternStatus::Approved {
        return insert_pattern(pool, fields, target, bank_id, Some(maker_id), Some(current.id))
            .await;
    }

    if !is_valid_transition(current.status, target) {
        return Err(AppError::InvalidTransition(format!(
            "Cannot move pattern from {:?} to {target:?}",
            current.status
        )));
    }

    // Compare-and-swap on the observed status so a concurrent reviewer or
    // editor cannot be silently overwritten. Resubmission clears any prior
    // reviewer verdict.
    let updated = sqlx::query_as::<_, Pattern>(
        r#"
        UPDATE patterns SET
            bank_id = $3, expression = $4, sample_text = $5, sender_title = $6,
            bank_name = $7, merchant_name = $8, tx_type = $9, msg_type = $10,
            msg_subtype = $11, status = $12, owner_id = $13, reviewer_id = NULL,
            updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(current.status)
    .bind(bank_id)
    .bind(&fields.expression)
    .bind(&fields.sample_text)
    .bind(&fields.sender_title)
    .bind(&fields.bank_name)
    .bind(&fields.merchant_name)
    .bind(fields.tx_type)
    .bind(fields.msg_type)
    .bind(fields.msg_subtype)
    .bind(target)
    .bind(maker_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::Conflict("Pattern was modified concurrently; reload and retry".to_string())
    })?;

    Ok(updated)
}

/// Checker review: approve or reject a PENDING pattern. At most one of two
/// racing reviewers wins; the loser receives a Conflict.
pub async fn review(
    pool: &PgPool,
    id: Uuid,
    checker_id: Uuid,
    verdict: ReviewVerdict,
) -> Result<Pattern, AppError> {
    let current = find_by_id(pool, id).await?;
    ensure_not_self_review(&current, checker_id)?;

    if current.status != PatternStatus::Pending {
        return Err(AppError::InvalidTransition(format!(
            "Only PENDING patterns can be reviewed; this one is {:?}",
            current.status
        )));
    }

    let reviewed = sqlx::query_as::<_, Pattern>(
        r#"
        UPDATE patterns
        SET status = $2, reviewer_id = $3, updated_at = NOW()
        WHERE id = $1 AND status = 'PENDING'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(verdict.target())
    .bind(checker_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::Conflict("Pattern was already reviewed by another checker".to_string())
    })?;

    tracing::info!(
        pattern_id = %id,
        reviewer = %checker_id,
        status = ?reviewed.status,
        "Pattern reviewed"
    );
    Ok(reviewed)
}

/// Record a runtime SMS that matched no approved pattern as a FAILED row for
/// maker attention. Only the single-SMS user path calls this; bulk and
/// maker pre-checks stay side-effect free.
pub async fn record_failed_sms(
    pool: &PgPool,
    sms_title: &str,
    sms: &str,
    bank_id: Option<Uuid>,
) -> Result<(), AppError> {
    let bank_name: Option<String> = match bank_id {
        Some(id) => {
            sqlx::query_scalar::<_, String>("SELECT name FROM banks WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        // Keep the title as the bank hint so the maker can see the sender.
        None => Some(sms_title.to_string()),
    };

    sqlx::query(
        r#"
        INSERT INTO patterns (bank_id, expression, sample_text, sender_title, bank_name, status)
        VALUES ($1, '', $2, $3, $4, 'FAILED')
        "#,
    )
    .bind(bank_id)
    .bind(sms)
    .bind(sms_title)
    .bind(bank_name)
    .execute(pool)
    .await?;

    tracing::info!(sms_title, "Recorded unmatched SMS as FAILED pattern");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pattern_with(status: PatternStatus, owner: Option<Uuid>) -> Pattern {
        Pattern {
            id: Uuid::new_v4(),
            bank_id: None,
            expression: r"(?<amount>\d+)".to_string(),
            sample_text: None,
            sender_title: None,
            bank_name: None,
            merchant_name: None,
            tx_type: None,
            msg_type: None,
            msg_subtype: None,
            status,
            owner_id: owner,
            reviewer_id: None,
            supersedes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn transition_graph_allows_maker_edges() {
        use PatternStatus::*;
        assert!(is_valid_transition(Draft, Draft));
        assert!(is_valid_transition(Draft, Pending));
        assert!(is_valid_transition(Rejected, Pending));
        assert!(is_valid_transition(Rejected, Draft));
        assert!(is_valid_transition(Failed, Pending));
        assert!(is_valid_transition(Failed, Draft));
    }

    #[test]
    fn transition_graph_allows_checker_edges() {
        use PatternStatus::*;
        assert!(is_valid_transition(Pending, Approved));
        assert!(is_valid_transition(Pending, Rejected));
    }

    #[test]
    fn transition_graph_forbids_everything_else() {
        use PatternStatus::*;
        // No actor edge enters Failed, and Approved has no outgoing edge.
        for from in [Draft, Pending, Approved, Rejected, Failed] {
            assert!(!is_valid_transition(from, Failed));
            assert!(!is_valid_transition(Approved, from));
        }
        assert!(!is_valid_transition(Draft, Approved));
        assert!(!is_valid_transition(Draft, Rejected));
        assert!(!is_valid_transition(Rejected, Approved));
    }

    #[test]
    fn verdict_targets() {
        assert_eq!(ReviewVerdict::Approve.target(), PatternStatus::Approved);
        assert_eq!(ReviewVerdict::Reject.target(), PatternStatus::Rejected);
    }

    #[test]
    fn owner_guard_rejects_other_makers() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let p = pattern_with(PatternStatus::Draft, Some(owner));
        assert!(ensure_owner(&p, owner).is_ok());
        assert!(matches!(
            ensure_owner(&p, other),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn unowned_failed_rows_are_adoptable() {
        let p = pattern_with(PatternStatus::Failed, None);
        assert!(ensure_owner(&p, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn self_review_is_forbidden() {
        let author = Uuid::new_v4();
        let p = pattern_with(PatternStatus::Pending, Some(author));
        assert!(matches!(
            ensure_not_self_review(&p, author),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_not_self_review(&p, Uuid::new_v4()).is_ok());
    }
}
