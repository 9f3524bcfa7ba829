use crate::domain::account_forms::BasicApplicantForm;
use crate::error::{ApiResponse, ApiResult};
use crate::services::applicant::{self, BasicApplicantData};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::ApiJson;
use axum::{extract::State, routing::get, Router};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(get_applicant).put(save_applicant))
        .with_state(state)
}

async fn get_applicant(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
) -> ApiResult<Option<BasicApplicantData>> {
    let data = applicant::get(&state, actor.user_id).await?;
    Ok(ApiResponse::ok("OK", data))
}

async fn save_applicant(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    ApiJson(form): ApiJson<BasicApplicantForm>,
) -> ApiResult<BasicApplicantData> {
    let data = applicant::save(&state, actor.user_id, form).await?;
    Ok(ApiResponse::ok("Applicant details saved", data))
}
