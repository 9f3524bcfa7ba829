//! Owner-side submission actions. Every mutation runs in one transaction
//! with the submission row locked.

use crate::db::comments::{self as comment_db, NewComment};
use crate::db::submissions as submission_db;
use crate::domain::comments::{active_edit_grant, has_pending_edit_request};
use crate::domain::models::{Actor, CommentType, FieldComment, FormStatus, FormSubmission, FormType};
use crate::domain::registry::form_spec;
use crate::domain::status::{ensure_deletable, is_form_locked, plan_save, SaveAction, SaveIntent};
use crate::domain::validation::{validate_form, ValidationMode};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    pub submission_id: Option<Uuid>,
    pub form_data: Value,
}

/// A submission plus the lock facts clients need to render it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: FormSubmission,
    pub is_locked: bool,
    pub has_edit_grant: bool,
    pub has_pending_edit_request: bool,
}

impl SubmissionView {
    pub fn new(submission: FormSubmission, edit_requests: &[FieldComment]) -> Self {
        let has_edit_grant = active_edit_grant(edit_requests).is_some();
        Self {
            is_locked: is_form_locked(submission.status, has_edit_grant),
            has_pending_edit_request: has_pending_edit_request(edit_requests),
            has_edit_grant,
            submission,
        }
    }
}

pub struct SaveOutcome {
    pub view: SubmissionView,
    pub created: bool,
}

fn validation_mode(intent: SaveIntent) -> ValidationMode {
    match intent {
        SaveIntent::Draft => ValidationMode::Draft,
        SaveIntent::Submit => ValidationMode::Submit,
    }
}

/// Draft-save or submit the owner's answers for `form_type`.
pub async fn save(
    state: &AppState,
    actor: &Actor,
    form_type: FormType,
    intent: SaveIntent,
    request: SaveRequest,
) -> AppResult<SaveOutcome> {
    validate_form(
        form_type,
        &request.form_data,
        validation_mode(intent),
        Utc::now().date_naive(),
    )?;

    let mut tx = state.db.begin().await?;
    let existing =
        submission_db::find_for_owner_for_update(&mut *tx, actor.user_id, form_type).await?;
    let edit_requests = match &existing {
        Some(current) => comment_db::list_edit_requests(&mut *tx, current.id).await?,
        None => Vec::new(),
    };
    let grant = active_edit_grant(&edit_requests);

    let plan = plan_save(existing.as_ref(), request.submission_id, intent, grant.is_some())?;

    let submission = match plan.action {
        SaveAction::Insert => {
            submission_db::insert(&mut *tx, actor.user_id, form_type, plan.status, &request.form_data)
                .await?
        }
        SaveAction::Update(id) => {
            submission_db::update_answers(&mut *tx, id, plan.status, &request.form_data).await?
        }
    };

    if plan.consumes_edit_grant {
        if let Some(grant) = grant {
            comment_db::set_resolved(&mut *tx, grant.id, true).await?;
            comment_db::insert(
                &mut *tx,
                NewComment {
                    submission_id: submission.id,
                    author_id: actor.user_id,
                    parent_comment_id: None,
                    field_path: None,
                    field_label: None,
                    content: "Resubmitted after an approved edit request",
                    comment_type: CommentType::System,
                },
            )
            .await?;
        }
    }

    let edit_requests = comment_db::list_edit_requests(&mut *tx, submission.id).await?;
    tx.commit().await?;

    tracing::info!(
        submission_id = %submission.id,
        user_id = %actor.user_id,
        form_type = %form_type,
        status = %submission.status,
        grant_consumed = plan.consumes_edit_grant,
        "Submission saved"
    );

    Ok(SaveOutcome {
        created: plan.action == SaveAction::Insert,
        view: SubmissionView::new(submission, &edit_requests),
    })
}

async fn load_visible(state: &AppState, actor: &Actor, id: Uuid) -> AppResult<FormSubmission> {
    let submission = submission_db::find_by_id(state.db.pool(), id)
        .await?
        .ok_or(AppError::NotFound("Submission"))?;
    if !actor.can_access(submission.user_id) {
        return Err(AppError::NotFound("Submission"));
    }
    Ok(submission)
}

pub async fn get(state: &AppState, actor: &Actor, id: Uuid) -> AppResult<SubmissionView> {
    let submission = load_visible(state, actor, id).await?;
    let edit_requests = comment_db::list_edit_requests(state.db.pool(), submission.id).await?;
    Ok(SubmissionView::new(submission, &edit_requests))
}

pub async fn get_for_form(
    state: &AppState,
    actor: &Actor,
    form_type: FormType,
) -> AppResult<Option<SubmissionView>> {
    let Some(submission) =
        submission_db::find_for_owner(state.db.pool(), actor.user_id, form_type).await?
    else {
        return Ok(None);
    };
    let edit_requests = comment_db::list_edit_requests(state.db.pool(), submission.id).await?;
    Ok(Some(SubmissionView::new(submission, &edit_requests)))
}

/// One row per form type, whether or not the owner has started it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOverview {
    pub form_type: FormType,
    pub title: &'static str,
    pub submission_id: Option<Uuid>,
    pub status: Option<FormStatus>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn overview(submissions: &[FormSubmission]) -> Vec<FormOverview> {
    FormType::ALL
        .into_iter()
        .map(|form_type| {
            let found = submissions.iter().find(|s| s.form_type == form_type);
            FormOverview {
                form_type,
                title: form_spec(form_type).title,
                submission_id: found.map(|s| s.id),
                status: found.map(|s| s.status),
                updated_at: found.map(|s| s.updated_at),
            }
        })
        .collect()
}

pub async fn list_mine(state: &AppState, actor: &Actor) -> AppResult<Vec<FormOverview>> {
    let submissions = submission_db::list_for_owner(state.db.pool(), actor.user_id).await?;
    Ok(overview(&submissions))
}

/// Owners may delete their own drafts only.
pub async fn delete(state: &AppState, actor: &Actor, id: Uuid) -> AppResult<()> {
    let mut tx = state.db.begin().await?;
    let submission = submission_db::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or(AppError::NotFound("Submission"))?;
    if submission.user_id != actor.user_id {
        return Err(AppError::NotFound("Submission"));
    }
    ensure_deletable(submission.status)?;

    submission_db::delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(submission_id = %id, user_id = %actor.user_id, "Draft deleted");
    Ok(())
}
