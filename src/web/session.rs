use crate::db;
use crate::domain::models::{Actor, UserRole};
use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, HeaderValue},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
    #[error("bad role")]
    Role,
}

/// `base64(user_id|role|exp).base64(hmac)`
pub fn sign_session(
    user_id: Uuid,
    role: UserRole,
    key: &[u8],
    ttl: Duration,
) -> Result<String, SessionError> {
    let exp = Utc::now() + ttl;
    let payload = format!("{}|{}|{}", user_id, role.as_str(), exp.timestamp());
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    ))
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let (payload_b64, sig_b64) = token.split_once('.').ok_or(SessionError::Invalid)?;
    let payload_bytes = general_purpose::STANDARD
        .decode(payload_b64)
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(sig_b64)
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SessionError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| SessionError::Invalid)?;
    let pieces: Vec<&str> = payload.split('|').collect();
    let [user_id, role, exp] = pieces.as_slice() else {
        return Err(SessionError::Invalid);
    };
    let user_id = Uuid::parse_str(user_id).map_err(|_| SessionError::Invalid)?;
    let role = parse_role(role)?;
    let exp: i64 = exp.parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims { user_id, role })
}

fn parse_role(raw: &str) -> Result<UserRole, SessionError> {
    match raw {
        "ADMIN" => Ok(UserRole::Admin),
        "USER" => Ok(UserRole::User),
        _ => Err(SessionError::Role),
    }
}

/// Bearer header first, then the `session` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(bearer) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(bearer.trim().to_string());
    }
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| pair.trim().strip_prefix("session=").map(str::to_string))
}

pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> Result<HeaderValue, AppError> {
    let secure_flag = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{secure_flag}",
        ttl.num_seconds()
    ))
    .map_err(AppError::internal)
}

pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    let secure_flag = if secure { "; Secure" } else { "" };
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{secure_flag}");
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("session=; Max-Age=0"))
}

// ============================================
// Extractors
// ============================================

/// Signed-in caller with an ACTIVE account. The role comes from the user row,
/// not the token, so demotions take effect immediately.
pub struct UserSession(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
    crate::state::SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = crate::state::SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(AppError::Unauthorized("Please sign in"))?;
        let claims = verify_session(&token, &shared_state.session_key)?;

        let user = db::find_user_by_id(shared_state.db.pool(), claims.user_id)
            .await?
            .ok_or(AppError::Unauthorized("Please sign in again"))?;

        if !user.is_active() {
            return Err(AppError::Forbidden("Please verify your email address first"));
        }

        Ok(UserSession(Actor {
            user_id: user.id,
            role: user.role,
        }))
    }
}

/// [`UserSession`] restricted to administrators.
pub struct AdminSession(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    crate::state::SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let UserSession(actor) = UserSession::from_request_parts(parts, state).await?;
        if !actor.is_admin() {
            tracing::warn!(user_id = %actor.user_id, "Non-admin attempted an admin action");
            return Err(AppError::Forbidden("Administrator access required"));
        }
        Ok(AdminSession(actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    const KEY: &[u8] = b"test-session-key-test-session-key";

    #[test]
    fn sign_then_verify() {
        let user_id = Uuid::new_v4();
        let token = sign_session(user_id, UserRole::Admin, KEY, Duration::hours(1)).unwrap();
        let claims = verify_session(&token, KEY).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn rejects_tampering_and_expiry() {
        let token = sign_session(Uuid::new_v4(), UserRole::User, KEY, Duration::hours(1)).unwrap();
        assert!(matches!(
            verify_session(&token, b"another-key"),
            Err(SessionError::Signature)
        ));

        let (_, sig) = token.split_once('.').unwrap();
        let forged_payload = general_purpose::STANDARD.encode(format!(
            "{}|ADMIN|{}",
            Uuid::new_v4(),
            Utc::now().timestamp() + 3600
        ));
        assert!(matches!(
            verify_session(&format!("{forged_payload}.{sig}"), KEY),
            Err(SessionError::Signature)
        ));

        let expired = sign_session(Uuid::new_v4(), UserRole::User, KEY, Duration::hours(-1)).unwrap();
        assert!(matches!(verify_session(&expired, KEY), Err(SessionError::Expired)));
        assert!(matches!(verify_session("garbage", KEY), Err(SessionError::Invalid)));
    }

    #[test]
    fn token_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=abc.def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz.123"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz.123"));

        assert!(extract_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn cookie_flags() {
        let cookie = session_cookie("t", Duration::hours(24), true).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("session=t; HttpOnly; SameSite=Lax; Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.ends_with("; Secure"));
        assert!(!clear_session_cookie(false).to_str().unwrap().contains("Secure"));
    }
}
