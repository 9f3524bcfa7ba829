//! Field comments and edit requests on a submission.

use crate::db;
use crate::db::comments::{self as comment_db, NewComment};
use crate::db::submissions as submission_db;
use crate::domain::comments::{
    build_threads, check_can_delete, check_can_edit, check_can_pin, check_can_resolve,
    check_content, check_new_comment, decide_edit_request, has_edit_grant,
    has_pending_edit_request, summarize, CommentError, CommentFilter, CommentSummary,
    CommentTarget, CommentThread, EditDecision,
};
use crate::domain::field_path::FieldPath;
use crate::domain::models::{Actor, CommentType, EditRequestStatus, FieldComment, FormSubmission};
use crate::domain::registry::{breadcrumb, resolve_path};
use crate::domain::status::is_form_locked;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub content: String,
    #[serde(default = "general")]
    pub comment_type: CommentType,
    #[serde(default)]
    pub field_path: Option<String>,
    #[serde(default)]
    pub parent_comment_id: Option<Uuid>,
}

fn general() -> CommentType {
    CommentType::General
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecideEditRequest {
    pub decision: EditDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentsView {
    pub threads: Vec<CommentThread>,
    pub summary: CommentSummary,
}

/// Loads the submission (locked when `for_update`) and the facts comment rules need.
async fn load_target(
    conn: &mut PgConnection,
    actor: &Actor,
    submission_id: Uuid,
    for_update: bool,
) -> AppResult<(FormSubmission, CommentTarget)> {
    let submission = if for_update {
        submission_db::find_by_id_for_update(&mut *conn, submission_id).await?
    } else {
        submission_db::find_by_id(&mut *conn, submission_id).await?
    }
    .ok_or(AppError::NotFound("Submission"))?;

    if !actor.can_access(submission.user_id) {
        return Err(AppError::NotFound("Submission"));
    }

    let edit_requests = comment_db::list_edit_requests(&mut *conn, submission.id).await?;
    let target = CommentTarget {
        submission_id: submission.id,
        owner_id: submission.user_id,
        locked: is_form_locked(submission.status, has_edit_grant(&edit_requests)),
        has_pending_edit_request: has_pending_edit_request(&edit_requests),
    };
    Ok((submission, target))
}

/// Fetches a comment that must belong to `submission_id`.
async fn load_comment(
    conn: &mut PgConnection,
    submission_id: Uuid,
    comment_id: Uuid,
) -> AppResult<FieldComment> {
    comment_db::find_by_id_for_update(conn, comment_id)
        .await?
        .filter(|c| c.submission_id == submission_id)
        .ok_or(AppError::NotFound("Comment"))
}

pub async fn list(
    state: &AppState,
    actor: &Actor,
    submission_id: Uuid,
    filter: CommentFilter,
) -> AppResult<CommentsView> {
    let mut conn = state.db.pool().acquire().await?;
    load_target(&mut conn, actor, submission_id, false).await?;
    let comments = comment_db::list_for_submission(&mut *conn, submission_id).await?;
    Ok(CommentsView {
        summary: summarize(&comments),
        threads: build_threads(comments, filter),
    })
}

pub async fn create(
    state: &AppState,
    actor: &Actor,
    submission_id: Uuid,
    request: CreateComment,
) -> AppResult<FieldComment> {
    let mut tx = state.db.begin().await?;
    let (submission, target) = load_target(&mut tx, actor, submission_id, true).await?;

    let field_path = match request.field_path.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(resolve_path(submission.form_type, raw.parse::<FieldPath>()?)?),
    };
    let field_label = field_path
        .as_ref()
        .and_then(|path| breadcrumb(submission.form_type, path));

    let parent = match request.parent_comment_id {
        Some(parent_id) => Some(
            comment_db::find_by_id(&mut *tx, parent_id)
                .await?
                .ok_or(CommentError::InvalidParent)?,
        ),
        None => None,
    };

    check_new_comment(actor, &target, request.comment_type, &request.content, parent.as_ref())?;
    let content = check_content(&request.content)?;
    let path_text = field_path.as_ref().map(ToString::to_string);

    let comment = comment_db::insert(
        &mut *tx,
        NewComment {
            submission_id,
            author_id: actor.user_id,
            parent_comment_id: parent.as_ref().map(|p| p.id),
            field_path: path_text.as_deref(),
            field_label: field_label.as_deref(),
            content,
            comment_type: request.comment_type,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        comment_id = %comment.id,
        %submission_id,
        author_id = %actor.user_id,
        comment_type = ?comment.comment_type,
        "Comment added"
    );

    if comment.comment_type == CommentType::EditRequest {
        match db::list_admin_ids(state.db.pool()).await {
            Ok(admin_ids) => {
                state
                    .notifier
                    .edit_request_created(&admin_ids, &submission, &comment)
                    .await
            }
            Err(e) => tracing::error!("Failed to load administrators for notification: {}", e),
        }
    }

    Ok(comment)
}

pub async fn edit(
    state: &AppState,
    actor: &Actor,
    submission_id: Uuid,
    comment_id: Uuid,
    content: &str,
) -> AppResult<FieldComment> {
    let mut tx = state.db.begin().await?;
    load_target(&mut tx, actor, submission_id, false).await?;
    let comment = load_comment(&mut tx, submission_id, comment_id).await?;
    check_can_edit(actor, &comment)?;
    let content = check_content(content)?;

    let updated = comment_db::update_content(&mut *tx, comment.id, content).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn delete(
    state: &AppState,
    actor: &Actor,
    submission_id: Uuid,
    comment_id: Uuid,
) -> AppResult<()> {
    let mut tx = state.db.begin().await?;
    load_target(&mut tx, actor, submission_id, false).await?;
    let comment = load_comment(&mut tx, submission_id, comment_id).await?;
    let replies = comment_db::count_replies(&mut *tx, comment.id).await?;
    check_can_delete(actor, &comment, usize::try_from(replies).unwrap_or(usize::MAX))?;

    comment_db::delete(&mut *tx, comment.id).await?;
    tx.commit().await?;

    tracing::info!(%comment_id, %submission_id, "Comment deleted");
    Ok(())
}

pub async fn set_pinned(
    state: &AppState,
    actor: &Actor,
    submission_id: Uuid,
    comment_id: Uuid,
    pinned: bool,
) -> AppResult<FieldComment> {
    check_can_pin(actor)?;
    let mut tx = state.db.begin().await?;
    load_target(&mut tx, actor, submission_id, false).await?;
    let comment = load_comment(&mut tx, submission_id, comment_id).await?;

    let updated = comment_db::set_pinned(&mut *tx, comment.id, pinned).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn set_resolved(
    state: &AppState,
    actor: &Actor,
    submission_id: Uuid,
    comment_id: Uuid,
    resolved: bool,
) -> AppResult<FieldComment> {
    let mut tx = state.db.begin().await?;
    let (_, target) = load_target(&mut tx, actor, submission_id, true).await?;
    let comment = load_comment(&mut tx, submission_id, comment_id).await?;
    check_can_resolve(actor, &target, &comment, resolved)?;

    let updated = comment_db::set_resolved(&mut *tx, comment.id, resolved).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Approving unlocks the submission for its owner; denying keeps it locked.
pub async fn decide(
    state: &AppState,
    actor: &Actor,
    submission_id: Uuid,
    comment_id: Uuid,
    request: DecideEditRequest,
) -> AppResult<FieldComment> {
    let mut tx = state.db.begin().await?;
    load_target(&mut tx, actor, submission_id, true).await?;
    let comment = load_comment(&mut tx, submission_id, comment_id).await?;

    let reason = request.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let status = decide_edit_request(actor, &comment, request.decision, reason)?;

    let decided = comment_db::record_decision(&mut *tx, comment.id, status, reason, actor.user_id).await?;
    let note = match status {
        EditRequestStatus::Approved => "Edit request approved. The form is unlocked for changes.".to_string(),
        _ => format!("Edit request denied: {}", reason.unwrap_or_default()),
    };
    comment_db::insert(
        &mut *tx,
        NewComment {
            submission_id,
            author_id: actor.user_id,
            parent_comment_id: None,
            field_path: None,
            field_label: None,
            content: &note,
            comment_type: CommentType::System,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        %comment_id,
        %submission_id,
        admin_id = %actor.user_id,
        decision = ?status,
        "Edit request decided"
    );
    Ok(decided)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_comment_defaults_to_general() {
        let request: CreateComment = serde_json::from_value(serde_json::json!({
            "content": "Is this the right employer?",
            "fieldPath": "workHistory.0.companyName"
        }))
        .unwrap();
        assert_eq!(request.comment_type, CommentType::General);
        assert!(request.parent_comment_id.is_none());

        let request: CreateComment = serde_json::from_value(serde_json::json!({
            "content": "Need to fix my address",
            "commentType": "EDIT_REQUEST"
        }))
        .unwrap();
        assert_eq!(request.comment_type, CommentType::EditRequest);
    }

    #[test]
    fn decision_payload() {
        let request: DecideEditRequest = serde_json::from_value(serde_json::json!({
            "decision": "deny",
            "reason": "Already reviewed"
        }))
        .unwrap();
        assert_eq!(request.decision, EditDecision::Deny);
        assert_eq!(request.reason.as_deref(), Some("Already reviewed"));
    }
}
