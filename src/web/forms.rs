use crate::domain::models::FormType;
use crate::domain::registry::{default_entry, form_spec, generate_default_values, FormSpec};
use crate::domain::status::SaveIntent;
use crate::error::{ApiResponse, ApiResult, AppError, AppResult};
use crate::services::submissions::{self, FormOverview, SaveOutcome, SaveRequest, SubmissionView};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::ApiJson;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};
use serde_json::{Map, Value};
use uuid::Uuid;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_forms))
        .route("/:form_type", get(get_form))
        .route("/:form_type/schema", get(schema))
        .route("/:form_type/defaults", get(defaults))
        .route("/:form_type/sections/:section/defaults", get(entry_defaults))
        .route("/:form_type/draft", put(save_draft))
        .route("/:form_type/submit", post(submit))
        .with_state(state)
}

pub fn submissions_router(state: SharedState) -> Router {
    Router::new()
        .route("/:submission_id", get(get_submission).delete(delete_submission))
        .with_state(state)
}

fn parse_form_type(raw: &str) -> AppResult<FormType> {
    raw.parse().map_err(|_| AppError::NotFound("Form type"))
}

async fn list_forms(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
) -> ApiResult<Vec<FormOverview>> {
    let forms = submissions::list_mine(&state, &actor).await?;
    Ok(ApiResponse::ok("OK", forms))
}

async fn schema(Path(form_type): Path<String>) -> ApiResult<&'static FormSpec> {
    Ok(ApiResponse::ok("OK", form_spec(parse_form_type(&form_type)?)))
}

async fn defaults(Path(form_type): Path<String>) -> ApiResult<Map<String, Value>> {
    Ok(ApiResponse::ok(
        "OK",
        generate_default_values(parse_form_type(&form_type)?),
    ))
}

async fn entry_defaults(
    Path((form_type, section)): Path<(String, String)>,
) -> ApiResult<Map<String, Value>> {
    let section = form_spec(parse_form_type(&form_type)?)
        .section(&section)
        .ok_or(AppError::NotFound("Section"))?;
    Ok(ApiResponse::ok("OK", default_entry(section)))
}

async fn get_form(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path(form_type): Path<String>,
) -> ApiResult<Option<SubmissionView>> {
    let view = submissions::get_for_form(&state, &actor, parse_form_type(&form_type)?).await?;
    Ok(ApiResponse::ok("OK", view))
}

fn saved(outcome: SaveOutcome, message: &str) -> ApiResponse<SubmissionView> {
    if outcome.created {
        ApiResponse::created(message, outcome.view)
    } else {
        ApiResponse::ok(message, outcome.view)
    }
}

async fn save_draft(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path(form_type): Path<String>,
    ApiJson(request): ApiJson<SaveRequest>,
) -> ApiResult<SubmissionView> {
    let form_type = parse_form_type(&form_type)?;
    let outcome = submissions::save(&state, &actor, form_type, SaveIntent::Draft, request).await?;
    Ok(saved(outcome, "Draft saved"))
}

async fn submit(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path(form_type): Path<String>,
    ApiJson(request): ApiJson<SaveRequest>,
) -> ApiResult<SubmissionView> {
    let form_type = parse_form_type(&form_type)?;
    let outcome = submissions::save(&state, &actor, form_type, SaveIntent::Submit, request).await?;
    Ok(saved(outcome, "Form submitted"))
}

async fn get_submission(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path(id): Path<Uuid>,
) -> ApiResult<SubmissionView> {
    let view = submissions::get(&state, &actor, id).await?;
    Ok(ApiResponse::ok("OK", view))
}

async fn delete_submission(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    submissions::delete(&state, &actor, id).await?;
    Ok(ApiResponse::done("Draft deleted"))
}
