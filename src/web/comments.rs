use crate::domain::comments::CommentFilter;
use crate::domain::models::FieldComment;
use crate::error::{ApiResponse, ApiResult, AppError};
use crate::services::comments::{self, CommentsView, CreateComment, DecideEditRequest};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::ApiJson;
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: CommentFilter,
}

#[derive(Deserialize)]
pub struct EditBody {
    pub content: String,
}

#[derive(Deserialize)]
pub struct PinBody {
    pub pinned: bool,
}

#[derive(Deserialize)]
pub struct ResolveBody {
    pub resolved: bool,
}

/// Mounted under `/submissions/:submission_id/comments`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route("/:comment_id", patch(edit_comment).delete(delete_comment))
        .route("/:comment_id/pin", post(pin_comment))
        .route("/:comment_id/resolve", post(resolve_comment))
        .route("/:comment_id/decision", post(decide_edit_request))
        .with_state(state)
}

async fn list_comments(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path(submission_id): Path<Uuid>,
    query: Result<Query<ListQuery>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<CommentsView> {
    let Query(query) = query.map_err(AppError::from)?;
    let view = comments::list(&state, &actor, submission_id, query.filter).await?;
    Ok(ApiResponse::ok("OK", view))
}

async fn create_comment(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path(submission_id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateComment>,
) -> ApiResult<FieldComment> {
    let comment = comments::create(&state, &actor, submission_id, request).await?;
    Ok(ApiResponse::created("Comment added", comment))
}

async fn edit_comment(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path((submission_id, comment_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<EditBody>,
) -> ApiResult<FieldComment> {
    let comment = comments::edit(&state, &actor, submission_id, comment_id, &body.content).await?;
    Ok(ApiResponse::ok("Comment updated", comment))
}

async fn delete_comment(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path((submission_id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    comments::delete(&state, &actor, submission_id, comment_id).await?;
    Ok(ApiResponse::done("Comment deleted"))
}

async fn pin_comment(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path((submission_id, comment_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<PinBody>,
) -> ApiResult<FieldComment> {
    let comment =
        comments::set_pinned(&state, &actor, submission_id, comment_id, body.pinned).await?;
    Ok(ApiResponse::ok(
        if body.pinned { "Comment pinned" } else { "Comment unpinned" },
        comment,
    ))
}

async fn resolve_comment(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path((submission_id, comment_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<ResolveBody>,
) -> ApiResult<FieldComment> {
    let comment =
        comments::set_resolved(&state, &actor, submission_id, comment_id, body.resolved).await?;
    Ok(ApiResponse::ok(
        if body.resolved { "Comment resolved" } else { "Comment reopened" },
        comment,
    ))
}

async fn decide_edit_request(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path((submission_id, comment_id)): Path<(Uuid, Uuid)>,
    ApiJson(request): ApiJson<DecideEditRequest>,
) -> ApiResult<FieldComment> {
    let comment = comments::decide(&state, &actor, submission_id, comment_id, request).await?;
    Ok(ApiResponse::ok("Edit request decided", comment))
}
