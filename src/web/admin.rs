use crate::db::submissions::SubmissionFilter;
use crate::domain::models::FormSubmission;
use crate::error::{ApiResponse, ApiResult, AppError};
use crate::services::accounts::Profile;
use crate::services::admin::{self, InvitationSummary, IssuedInvitation, TransitionRequest};
use crate::services::submissions::{self, SubmissionView};
use crate::state::SharedState;
use crate::web::session::AdminSession;
use crate::web::ApiJson;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Router,
};
use uuid::Uuid;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/activate", post(activate_user))
        .route("/invitations", get(list_invitations).post(create_invitation))
        .route("/submissions", get(list_submissions))
        .route("/submissions/:id", get(get_submission))
        .route("/submissions/:id/status", post(transition))
        .with_state(state)
}

async fn list_users(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
) -> ApiResult<Vec<Profile>> {
    let users = admin::list_users(&state).await?;
    Ok(ApiResponse::ok("OK", users))
}

async fn activate_user(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Profile> {
    let user = admin::activate_user(&state, &admin, user_id).await?;
    Ok(ApiResponse::ok("User activated", user))
}

async fn create_invitation(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
) -> ApiResult<IssuedInvitation> {
    let invitation = admin::create_invitation(&state, &admin).await?;
    Ok(ApiResponse::created("Invitation created", invitation))
}

async fn list_invitations(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
) -> ApiResult<Vec<InvitationSummary>> {
    let invitations = admin::list_invitations(&state).await?;
    Ok(ApiResponse::ok("OK", invitations))
}

async fn list_submissions(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    filter: Result<Query<SubmissionFilter>, QueryRejection>,
) -> ApiResult<Vec<FormSubmission>> {
    let Query(filter) = filter.map_err(AppError::from)?;
    let rows = admin::list_submissions(&state, &filter).await?;
    Ok(ApiResponse::ok("OK", rows))
}

async fn get_submission(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<SubmissionView> {
    let view = submissions::get(&state, &admin, id).await?;
    Ok(ApiResponse::ok("OK", view))
}

async fn transition(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<TransitionRequest>,
) -> ApiResult<SubmissionView> {
    let view = admin::transition(&state, &admin, id, request).await?;
    Ok(ApiResponse::ok("Status updated", view))
}
