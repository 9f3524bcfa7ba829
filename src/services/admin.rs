use crate::crypto::{generate_token, hash_token};
use crate::db;
use crate::db::comments::{self as comment_db, NewComment};
use crate::db::submissions::{self as submission_db, SubmissionFilter};
use crate::domain::models::{AccountStatus, Actor, CommentType, FormStatus, FormSubmission};
use crate::domain::comments::active_edit_grant;
use crate::domain::status::{admin_transition, closes_review};
use crate::error::{AppError, AppResult};
use crate::services::accounts::Profile;
use crate::services::submissions::SubmissionView;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub async fn list_users(state: &AppState) -> AppResult<Vec<Profile>> {
    let users = db::list_users(state.db.pool()).await?;
    Ok(users.iter().map(|u| Profile::from_user(state, u)).collect())
}

pub async fn activate_user(state: &AppState, admin: &Actor, user_id: Uuid) -> AppResult<Profile> {
    if !db::set_user_status(state.db.pool(), user_id, AccountStatus::Active).await? {
        return Err(AppError::UserNotFound);
    }
    tracing::info!(%user_id, admin_id = %admin.user_id, "User activated by administrator");
    crate::services::accounts::profile(state, user_id).await
}

/// The plain code is returned exactly once; only its hash is stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInvitation {
    pub id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationSummary {
    pub id: Uuid,
    pub created_by: Option<Uuid>,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub async fn create_invitation(state: &AppState, admin: &Actor) -> AppResult<IssuedInvitation> {
    let code = generate_token();
    let expires_at = Utc::now() + state.config.invitation_ttl;
    let invitation =
        db::insert_invitation(state.db.pool(), &hash_token(&code), Some(admin.user_id), expires_at)
            .await?;

    tracing::info!(invitation_id = %invitation.id, admin_id = %admin.user_id, "Invitation issued");
    Ok(IssuedInvitation {
        id: invitation.id,
        code,
        expires_at: invitation.expires_at,
    })
}

pub async fn list_invitations(state: &AppState) -> AppResult<Vec<InvitationSummary>> {
    let invitations = db::list_invitations(state.db.pool()).await?;
    Ok(invitations
        .into_iter()
        .map(|i| InvitationSummary {
            id: i.id,
            created_by: i.created_by,
            used_by: i.used_by,
            used_at: i.used_at,
            expires_at: i.expires_at,
            created_at: i.created_at,
        })
        .collect())
}

pub async fn list_submissions(
    state: &AppState,
    filter: &SubmissionFilter,
) -> AppResult<Vec<FormSubmission>> {
    Ok(submission_db::list(state.db.pool(), filter).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: FormStatus,
    #[serde(default)]
    pub note: Option<String>,
}

pub fn transition_message(
    from: FormStatus,
    to: FormStatus,
    note: Option<&str>,
    revoked_grant: bool,
) -> String {
    let mut message = match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("Status changed from {} to {}: {}", from, to, note),
        None => format!("Status changed from {} to {}", from, to),
    };
    if revoked_grant {
        message.push_str(". Approved edit access revoked");
    }
    message
}

/// Moves a submission through review and records the change as a SYSTEM comment.
/// A final decision also revokes an unspent edit grant.
pub async fn transition(
    state: &AppState,
    admin: &Actor,
    submission_id: Uuid,
    request: TransitionRequest,
) -> AppResult<SubmissionView> {
    let mut tx = state.db.begin().await?;
    let current = submission_db::find_by_id_for_update(&mut *tx, submission_id)
        .await?
        .ok_or(AppError::NotFound("Submission"))?;

    let next = admin_transition(current.status, request.status)?;
    let updated = submission_db::set_review_status(&mut *tx, submission_id, next, admin.user_id).await?;

    let mut revoked_grant = None;
    if closes_review(next) {
        let edit_requests = comment_db::list_edit_requests(&mut *tx, submission_id).await?;
        if let Some(grant) = active_edit_grant(&edit_requests) {
            comment_db::set_resolved(&mut *tx, grant.id, true).await?;
            revoked_grant = Some(grant.id);
        }
    }

    let message = transition_message(
        current.status,
        next,
        request.note.as_deref(),
        revoked_grant.is_some(),
    );
    comment_db::insert(
        &mut *tx,
        NewComment {
            submission_id,
            author_id: admin.user_id,
            parent_comment_id: None,
            field_path: None,
            field_label: None,
            content: &message,
            comment_type: CommentType::System,
        },
    )
    .await?;
    let edit_requests = comment_db::list_edit_requests(&mut *tx, submission_id).await?;
    tx.commit().await?;

    tracing::info!(
        %submission_id,
        admin_id = %admin.user_id,
        from = %current.status,
        to = %next,
        revoked_grant = ?revoked_grant,
        "Submission status changed"
    );
    Ok(SubmissionView::new(updated, &edit_requests))
}
