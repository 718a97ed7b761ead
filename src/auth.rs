use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::domain::DomainError;
use crate::models::account;
use crate::services::account_service;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub username: String,
    /// Must equal the account's `session_epoch`; logout bumps it
    pub epoch: i32,
    /// Per-session anti-forgery token echoed back by every form
    pub csrf: String,
    pub exp: usize,
}

/// The account behind the request's session, loaded fresh from storage.
///
/// Handlers that require a login take this as an extractor; public pages take
/// `Option<CurrentAccount>`.
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub account: account::Model,
    pub csrf_token: String,
}

impl CurrentAccount {
    pub fn id(&self) -> i32 {
        self.account.id
    }

    pub fn username(&self) -> &str {
        &self.account.username
    }

    /// Reject a state-changing request whose token does not belong to this session.
    pub fn check_csrf(&self, submitted: &str) -> Result<(), DomainError> {
        if self.csrf_token.is_empty() || submitted != self.csrf_token {
            tracing::warn!("Rejected request with a bad CSRF token for {}", self.username());
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = DomainError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(DomainError::Unauthorized)?;

        let claims = decode_jwt(&state.config.session_secret, token).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            DomainError::Unauthorized
        })?;

        let account_id: i32 = claims.sub.parse().map_err(|_| DomainError::Unauthorized)?;

        let account = account_service::find_by_id(&state.db, account_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        if claims.epoch != account.session_epoch {
            tracing::debug!("Session for {} was ended by logout", account.username);
            return Err(DomainError::Unauthorized);
        }

        Ok(CurrentAccount {
            account,
            csrf_token: claims.csrf,
        })
    }
}

/// Hash a password with Argon2id using a fresh random salt.
///
/// `iterations` is the argon2 time cost; memory and parallelism stay at the
/// library defaults. The PHC string embeds all parameters, so verification
/// does not need to know them.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, String> {
    let params = Params::new(
        Params::DEFAULT_M_COST,
        iterations,
        Params::DEFAULT_P_COST,
        None,
    )
    .map_err(|e| e.to_string())?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn create_jwt(
    secret: &str,
    account_id: i32,
    username: &str,
    session_epoch: i32,
    ttl_hours: i64,
) -> Result<String, String> {
    let expiration = Duration::try_hours(ttl_hours)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| "session expiry out of range".to_string())?
        .timestamp();

    let claims = Claims {
        sub: account_id.to_string(),
        username: username.to_owned(),
        epoch: session_epoch,
        csrf: csrf_token(),
        exp: expiration.max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(secret: &str, token: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl_hours.saturating_mul(3600)
    )
}

/// `Set-Cookie` value that expires the session cookie.
pub fn cleared_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}
