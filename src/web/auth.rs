use crate::domain::account_forms::{
    AdminSignUpForm, ForgotPasswordForm, ResetPasswordForm, SignInForm, SignUpForm,
};
use crate::error::{ApiResponse, ApiResult, AppError};
use crate::middleware::rate_limit_middleware;
use crate::services::accounts::{self, Profile};
use crate::state::SharedState;
use crate::web::session::{self, UserSession};
use crate::web::ApiJson;
use axum::{
    extract::State,
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: Profile,
    pub token: String,
}

pub fn router(state: SharedState) -> Router {
    let anonymous = Router::new()
        .route("/sign-up", post(sign_up))
        .route("/admin/sign-up", post(admin_sign_up))
        .route("/verify-email", post(verify_email))
        .route("/sign-in", post(sign_in))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(anonymous)
        .route("/sign-out", post(sign_out))
        .route("/me", get(me))
        .with_state(state)
}

async fn sign_up(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<SignUpForm>,
) -> ApiResult<Profile> {
    let profile = accounts::sign_up(&state, form).await?;
    Ok(ApiResponse::created(
        "Account created. Check your email to verify your address.",
        profile,
    ))
}

async fn admin_sign_up(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<AdminSignUpForm>,
) -> ApiResult<Profile> {
    let profile = accounts::sign_up_admin(&state, form).await?;
    Ok(ApiResponse::created("Administrator account created", profile))
}

async fn verify_email(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<VerifyEmailRequest>,
) -> ApiResult<Profile> {
    let profile = accounts::verify_email(&state, &payload.token).await?;
    Ok(ApiResponse::ok("Email verified. You can now sign in.", profile))
}

async fn sign_in(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<SignInForm>,
) -> Result<impl IntoResponse, AppError> {
    let signed_in = accounts::sign_in(&state, form).await?;
    let cookie = session::session_cookie(
        &signed_in.token,
        state.config.session_ttl,
        state.config.secure_cookies,
    )?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(
            "Signed in",
            SessionResponse {
                user: signed_in.profile,
                token: signed_in.token,
            },
        ),
    ))
}

async fn sign_out(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            session::clear_session_cookie(state.config.secure_cookies),
        )],
        ApiResponse::done("Signed out"),
    )
}

async fn forgot_password(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<ForgotPasswordForm>,
) -> ApiResult<()> {
    accounts::forgot_password(&state, form).await?;
    Ok(ApiResponse::done(
        "If an account exists for this address, a reset link has been sent.",
    ))
}

async fn reset_password(
    State(state): State<SharedState>,
    ApiJson(form): ApiJson<ResetPasswordForm>,
) -> ApiResult<()> {
    accounts::reset_password(&state, form).await?;
    Ok(ApiResponse::done("Password updated. You can now sign in."))
}

async fn me(
    State(state): State<SharedState>,
    UserSession(actor): UserSession,
) -> ApiResult<Profile> {
    let profile = accounts::profile(&state, actor.user_id).await?;
    Ok(ApiResponse::ok("OK", profile))
}
