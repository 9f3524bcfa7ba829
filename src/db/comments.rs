use crate::domain::models::{CommentType, EditRequestStatus, FieldComment};
use sqlx::PgExecutor;
use uuid::Uuid;

const COLUMNS: &str = "id, submission_id, author_id, parent_comment_id, field_path, field_label, \
                       content, comment_type, is_pinned, is_resolved, edit_request_status, \
                       decision_reason, decided_by, decided_at, created_at, updated_at";

pub struct NewComment<'a> {
    pub submission_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub field_path: Option<&'a str>,
    pub field_label: Option<&'a str>,
    pub content: &'a str,
    pub comment_type: CommentType,
}

pub async fn insert<'e, E>(exec: E, comment: NewComment<'_>) -> Result<FieldComment, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let edit_request_status =
        (comment.comment_type == CommentType::EditRequest).then_some(EditRequestStatus::Pending);

    sqlx::query_as::<_, FieldComment>(&format!(
        r#"
        INSERT INTO field_comments
            (id, submission_id, author_id, parent_comment_id, field_path, field_label,
             content, comment_type, edit_request_status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(comment.submission_id)
    .bind(comment.author_id)
    .bind(comment.parent_comment_id)
    .bind(comment.field_path)
    .bind(comment.field_label)
    .bind(comment.content)
    .bind(comment.comment_type)
    .bind(edit_request_status)
    .fetch_one(exec)
    .await
}

pub async fn find_by_id<'e, E>(exec: E, id: Uuid) -> Result<Option<FieldComment>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!("SELECT {COLUMNS} FROM field_comments WHERE id = $1"))
        .bind(id)
        .fetch_optional(exec)
        .await
}

pub async fn find_by_id_for_update<'e, E>(exec: E, id: Uuid) -> Result<Option<FieldComment>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!(
        "SELECT {COLUMNS} FROM field_comments WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await
}

pub async fn list_for_submission<'e, E>(
    exec: E,
    submission_id: Uuid,
) -> Result<Vec<FieldComment>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!(
        "SELECT {COLUMNS} FROM field_comments WHERE submission_id = $1 ORDER BY created_at DESC"
    ))
    .bind(submission_id)
    .fetch_all(exec)
    .await
}

pub async fn list_edit_requests<'e, E>(
    exec: E,
    submission_id: Uuid,
) -> Result<Vec<FieldComment>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM field_comments
        WHERE submission_id = $1 AND comment_type = 'EDIT_REQUEST'
        ORDER BY created_at DESC
        "#
    ))
    .bind(submission_id)
    .fetch_all(exec)
    .await
}

pub async fn count_replies<'e, E>(exec: E, id: Uuid) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM field_comments WHERE parent_comment_id = $1")
        .bind(id)
        .fetch_one(exec)
        .await
}

pub async fn update_content<'e, E>(exec: E, id: Uuid, content: &str) -> Result<FieldComment, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!(
        "UPDATE field_comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(content)
    .fetch_one(exec)
    .await
}

pub async fn set_pinned<'e, E>(exec: E, id: Uuid, pinned: bool) -> Result<FieldComment, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!(
        "UPDATE field_comments SET is_pinned = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(pinned)
    .fetch_one(exec)
    .await
}

pub async fn set_resolved<'e, E>(exec: E, id: Uuid, resolved: bool) -> Result<FieldComment, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!(
        "UPDATE field_comments SET is_resolved = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(resolved)
    .fetch_one(exec)
    .await
}

pub async fn record_decision<'e, E>(
    exec: E,
    id: Uuid,
    status: EditRequestStatus,
    reason: Option<&str>,
    decided_by: Uuid,
) -> Result<FieldComment, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, FieldComment>(&format!(
        r#"
        UPDATE field_comments
        SET edit_request_status = $2,
            decision_reason = $3,
            decided_by = $4,
            decided_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(reason)
    .bind(decided_by)
    .fetch_one(exec)
    .await
}

pub async fn delete<'e, E>(exec: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM field_comments WHERE id = $1")
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}
