use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    access::Session,
    config::{AppConfig, Env},
    repository::RepositoryState,
};

/// Claims
///
/// Payload expected inside a JSON Web Token issued by the external auth
/// service. Signed with the service-managed secret and validated on every
/// authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID, the key into the `profiles` table.
    pub sub: Uuid,
    /// Expiration timestamp. Always validated.
    pub exp: usize,
    /// Issued-at timestamp.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated API request: the profile's UUID
/// and its role string ('student' or 'admin'). Produced by the extractor
/// below and consumed by handlers for ownership and role checks.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
}

/// Pulls a bearer credential out of the request headers. Checks the
/// Authorization header first, then falls back to the `session` cookie the
/// web frontend sets after login.
fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("session="))
        .map(str::to_string)
}

/// Decodes and validates a JWT against the configured secret. Expiration
/// validation is always on.
fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// resolve_session
///
/// The access router's session lookup: inspects the request credentials and
/// yields the session, or `None` for the anonymous case. Purely local — no
/// database roundtrip, and never an error: a missing or invalid credential
/// is a normal anonymous request, not a failure.
///
/// In `Env::Local` a well-formed `x-user-id` header counts as a session,
/// mirroring the API-side development bypass.
pub fn resolve_session(headers: &HeaderMap, config: &AppConfig) -> Option<Session> {
    if config.env == Env::Local {
        if let Some(user_id) = headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok())
        {
            return Some(Session { user_id });
        }
    }

    let token = credential_from_headers(headers)?;
    let claims = decode_token(&token, &config.jwt_secret)?;
    Some(Session {
        user_id: claims.sub,
    })
}

/// AuthUser Extractor
///
/// Implements `FromRequestParts` so any authenticated handler can take
/// `AuthUser` as an argument, keeping authentication out of the business
/// logic. The flow:
/// 1. Local bypass: in `Env::Local`, an `x-user-id` header naming an existing
///    profile authenticates directly.
/// 2. Credential extraction: Bearer header or session cookie.
/// 3. JWT validation against the configured secret.
/// 4. Profile lookup, so a deleted user cannot ride a still-valid token.
///
/// Rejection is always 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Development bypass, guarded by the Env check. The profile must
        // exist so roles load correctly.
        if config.env == Env::Local {
            if let Some(user_id) = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| Uuid::parse_str(raw).ok())
            {
                if let Some(user) = repo.get_user(user_id).await {
                    return Ok(AuthUser {
                        id: user.id,
                        role: user.role,
                    });
                }
            }
        }
        // In Production, or if the bypass did not resolve, fall through to
        // standard JWT validation.

        let token = credential_from_headers(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;
        let claims = decode_token(&token, &config.jwt_secret).ok_or(StatusCode::UNAUTHORIZED)?;

        // Final verification against the database: the token may be valid
        // while the profile is gone.
        let user = repo
            .get_user(claims.sub)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}
