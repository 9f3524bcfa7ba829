//! Account lifecycle: sign-up, e-mail verification, sign-in, password reset
//! and invitation-gated administrator sign-up.

use crate::crypto::{generate_token, hash_token};
use crate::db::{self, DbUser, NewUser};
use crate::domain::account_forms::{
    normalize_email, AdminSignUpForm, ForgotPasswordForm, ResetPasswordForm, SignInForm, SignUpForm,
};
use crate::domain::models::{AccountStatus, UserRole};
use crate::domain::validation::Validate;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::web::session;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand_core::OsRng;
use serde::Serialize;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Verified against when the e-mail is unknown so both paths pay for argon2.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("visa-portal-unknown-account").ok());

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn verify_credentials(password: &str, user: Option<&DbUser>) -> bool {
    match user {
        Some(user) => verify_password(password, &user.hash),
        None => {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                verify_password(password, hash);
            }
            false
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn from_user(state: &AppState, user: &DbUser) -> Self {
        let name = state.crypto.decrypt_str(&user.enc_name).unwrap_or_else(|e| {
            tracing::warn!(user_id = %user.id, "Failed to decrypt name: {}", e);
            "User".to_string()
        });
        Self {
            id: user.id,
            email: user.email.clone(),
            name,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

fn hash_or_internal(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

pub async fn sign_up(state: &AppState, form: SignUpForm) -> AppResult<Profile> {
    form.validate()?;
    let email = normalize_email(&form.email);
    let hash = hash_or_internal(&form.password)?;
    let enc_name = state.crypto.encrypt_str(form.name.trim())?;

    let mut tx = state.db.begin().await?;
    if db::find_user_by_email(&mut *tx, &email).await?.is_some() {
        return Err(AppError::EmailExists);
    }
    let user = db::insert_user(
        &mut *tx,
        NewUser {
            email: &email,
            hash: &hash,
            role: UserRole::User,
            status: AccountStatus::PendingVerification,
            enc_name: &enc_name,
        },
    )
    .await?;

    let token = generate_token();
    let expires_at = Utc::now() + state.config.verification_token_ttl;
    db::insert_verification_token(&mut *tx, &hash_token(&token), user.id, expires_at).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, "User signed up");
    state.notifier.verification_token(&user.email, &token).await;
    Ok(Profile::from_user(state, &user))
}

/// Creates an active administrator. The invitation is claimed in the same
/// transaction, so a spent or expired code leaves no account behind.
pub async fn sign_up_admin(state: &AppState, form: AdminSignUpForm) -> AppResult<Profile> {
    form.validate()?;
    let email = normalize_email(&form.account.email);
    let hash = hash_or_internal(&form.account.password)?;
    let enc_name = state.crypto.encrypt_str(form.account.name.trim())?;

    let mut tx = state.db.begin().await?;
    if db::find_user_by_email(&mut *tx, &email).await?.is_some() {
        return Err(AppError::EmailExists);
    }
    let user = db::insert_user(
        &mut *tx,
        NewUser {
            email: &email,
            hash: &hash,
            role: UserRole::Admin,
            status: AccountStatus::Active,
            enc_name: &enc_name,
        },
    )
    .await?;

    let claimed = db::claim_invitation(&mut *tx, &hash_token(&form.invitation_code), user.id).await?;
    let Some(invitation) = claimed else {
        tracing::warn!("Admin sign-up with an invalid invitation code for {}", email);
        return Err(AppError::InvalidInvitation);
    };
    tx.commit().await?;

    tracing::info!(user_id = %user.id, invitation_id = %invitation.id, "Administrator signed up");
    Ok(Profile::from_user(state, &user))
}

pub async fn verify_email(state: &AppState, token: &str) -> AppResult<Profile> {
    let mut tx = state.db.begin().await?;
    let record = db::take_verification_token(&mut *tx, &hash_token(token))
        .await?
        .ok_or(AppError::InvalidToken("Invalid or expired verification link"))?;
    if record.is_expired(Utc::now()) {
        // The consumed row is dropped either way.
        tx.commit().await?;
        return Err(AppError::InvalidToken("Invalid or expired verification link"));
    }

    db::set_user_status(&mut *tx, record.user_id, AccountStatus::Active).await?;
    let user = db::find_user_by_id(&mut *tx, record.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, "Email verified");
    Ok(Profile::from_user(state, &user))
}

pub struct SignedIn {
    pub profile: Profile,
    pub token: String,
}

pub async fn sign_in(state: &AppState, form: SignInForm) -> AppResult<SignedIn> {
    form.validate()?;
    let email = normalize_email(&form.email);

    let user = db::find_user_by_email(state.db.pool(), &email).await?;
    let verified = verify_credentials(&form.password, user.as_ref());
    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            tracing::warn!(user_id = %user.id, "Failed sign-in attempt");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
        }
        None => return Err(AppError::Unauthorized(INVALID_CREDENTIALS)),
    };
    if !user.is_active() {
        return Err(AppError::Forbidden("Please verify your email address first"));
    }

    let token = session::sign_session(user.id, user.role, &state.session_key, state.config.session_ttl)
        .map_err(AppError::internal)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User signed in");
    Ok(SignedIn {
        profile: Profile::from_user(state, &user),
        token,
    })
}

/// Always succeeds for well-formed input so the endpoint does not reveal
/// which addresses have accounts.
pub async fn forgot_password(state: &AppState, form: ForgotPasswordForm) -> AppResult<()> {
    form.validate()?;
    let email = normalize_email(&form.email);

    let Some(user) = db::find_user_by_email(state.db.pool(), &email).await? else {
        tracing::info!("Password reset requested for unknown address");
        return Ok(());
    };

    let token = generate_token();
    let expires_at = Utc::now() + state.config.reset_token_ttl;
    db::upsert_reset_token(state.db.pool(), user.id, &hash_token(&token), expires_at).await?;

    state.notifier.password_reset_token(&user.email, &token).await;
    Ok(())
}

pub async fn reset_password(state: &AppState, form: ResetPasswordForm) -> AppResult<()> {
    form.validate()?;
    let hash = hash_or_internal(&form.password)?;

    let mut tx = state.db.begin().await?;
    let record = db::take_reset_token(&mut *tx, &hash_token(&form.token))
        .await?
        .ok_or(AppError::InvalidToken("Invalid or expired reset link"))?;
    if record.is_expired(Utc::now()) {
        tx.commit().await?;
        return Err(AppError::InvalidToken("Invalid or expired reset link"));
    }

    db::update_password(&mut *tx, record.user_id, &hash).await?;
    tx.commit().await?;

    tracing::info!(user_id = %record.user_id, "Password reset");
    Ok(())
}

pub async fn profile(state: &AppState, user_id: Uuid) -> AppResult<Profile> {
    let user = db::find_user_by_id(state.db.pool(), user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Profile::from_user(state, &user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("Abcdefg1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Abcdefg1", &hash));
        assert!(!verify_password("Abcdefg2", &hash));
        assert!(!verify_password("Abcdefg1", "not-a-hash"));
    }

    #[test]
    fn unknown_account_still_runs_argon2() {
        assert!(DUMMY_HASH.as_deref().is_some_and(|h| h.starts_with("$argon2")));
        assert!(!verify_credentials("visa-portal-unknown-account", None));
        assert!(!verify_credentials("Abcdefg1", None));
    }
}
