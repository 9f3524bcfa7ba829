use crate::domain::models::{FormStatus, FormSubmission, FormType};
use serde::Deserialize;
use sqlx::PgExecutor;
use uuid::Uuid;

const COLUMNS: &str = "id, user_id, form_type, status, form_data, submitted_at, \
                       reviewed_by, reviewed_at, created_at, updated_at";

/// Locks the owner's row for the form type (if any) until the transaction ends.
pub async fn find_for_owner_for_update<'e, E>(
    exec: E,
    user_id: Uuid,
    form_type: FormType,
) -> Result<Option<FormSubmission>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        "SELECT {COLUMNS} FROM form_submissions WHERE user_id = $1 AND form_type = $2 FOR UPDATE"
    ))
    .bind(user_id)
    .bind(form_type)
    .fetch_optional(exec)
    .await
}

pub async fn find_for_owner<'e, E>(
    exec: E,
    user_id: Uuid,
    form_type: FormType,
) -> Result<Option<FormSubmission>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        "SELECT {COLUMNS} FROM form_submissions WHERE user_id = $1 AND form_type = $2"
    ))
    .bind(user_id)
    .bind(form_type)
    .fetch_optional(exec)
    .await
}

pub async fn find_by_id<'e, E>(exec: E, id: Uuid) -> Result<Option<FormSubmission>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        "SELECT {COLUMNS} FROM form_submissions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await
}

pub async fn find_by_id_for_update<'e, E>(
    exec: E,
    id: Uuid,
) -> Result<Option<FormSubmission>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        "SELECT {COLUMNS} FROM form_submissions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await
}

pub async fn list_for_owner<'e, E>(exec: E, user_id: Uuid) -> Result<Vec<FormSubmission>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        "SELECT {COLUMNS} FROM form_submissions WHERE user_id = $1 ORDER BY form_type"
    ))
    .bind(user_id)
    .fetch_all(exec)
    .await
}

pub async fn insert<'e, E>(
    exec: E,
    user_id: Uuid,
    form_type: FormType,
    status: FormStatus,
    form_data: &serde_json::Value,
) -> Result<FormSubmission, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        r#"
        INSERT INTO form_submissions (id, user_id, form_type, status, form_data, submitted_at)
        VALUES ($1, $2, $3, $4, $5, CASE WHEN $4 = 'SUBMITTED'::form_status THEN NOW() END)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(form_type)
    .bind(status)
    .bind(form_data)
    .fetch_one(exec)
    .await
}

/// Replaces the answers; `submitted_at` is stamped whenever the row enters SUBMITTED.
pub async fn update_answers<'e, E>(
    exec: E,
    id: Uuid,
    status: FormStatus,
    form_data: &serde_json::Value,
) -> Result<FormSubmission, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        r#"
        UPDATE form_submissions
        SET form_data = $3,
            status = $2,
            submitted_at = CASE WHEN $2 = 'SUBMITTED'::form_status THEN NOW() ELSE submitted_at END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(form_data)
    .fetch_one(exec)
    .await
}

pub async fn set_review_status<'e, E>(
    exec: E,
    id: Uuid,
    status: FormStatus,
    reviewer: Uuid,
) -> Result<FormSubmission, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        r#"
        UPDATE form_submissions
        SET status = $2, reviewed_by = $3, reviewed_at = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(reviewer)
    .fetch_one(exec)
    .await
}

pub async fn delete<'e, E>(exec: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM form_submissions WHERE id = $1")
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFilter {
    pub status: Option<FormStatus>,
    pub form_type: Option<FormType>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SubmissionFilter {
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

pub async fn list<'e, E>(exec: E, filter: &SubmissionFilter) -> Result<Vec<FormSubmission>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FormSubmission>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM form_submissions
        WHERE ($1::form_status IS NULL OR status = $1)
          AND ($2::form_type IS NULL OR form_type = $2)
          AND ($3::uuid IS NULL OR user_id = $3)
        ORDER BY updated_at DESC
        LIMIT $4 OFFSET $5
        "#
    ))
    .bind(filter.status)
    .bind(filter.form_type)
    .bind(filter.user_id)
    .bind(filter.limit())
    .bind(filter.offset())
    .fetch_all(exec)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_paging_is_clamped() {
        let filter = SubmissionFilter::default();
        assert_eq!(filter.limit(), 50);
        assert_eq!(filter.offset(), 0);

        let filter: SubmissionFilter = serde_json::from_value(serde_json::json!({
            "status": "UNDER_REVIEW",
            "formType": "WORK_HISTORY",
            "limit": 10000,
            "offset": -4
        }))
        .unwrap();
        assert_eq!(filter.status, Some(FormStatus::UnderReview));
        assert_eq!(filter.form_type, Some(FormType::WorkHistory));
        assert_eq!(filter.limit(), SubmissionFilter::MAX_LIMIT);
        assert_eq!(filter.offset(), 0);
    }
}
