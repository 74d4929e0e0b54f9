use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::{
    config::{AdminSeed, AppConfig, Env},
    models::{CreateUserRequest, Role, User},
    repository::{RepoError, Repository, RepositoryState},
};

/// Cookie carrying an administrator's session token.
pub const ADMIN_COOKIE: &str = "admin_token";
/// Cookie carrying a regular user's session token.
pub const USER_COOKIE: &str = "token";

/// Claims
///
/// Payload of the HS256 session token issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
}

/// AuthError
///
/// The fixed rejection taxonomy of the auth gate. The `Display` text is what clients see.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication token missing")]
    MissingToken,
    #[error("Invalid authentication token")]
    InvalidToken,
    #[error("Authentication token expired")]
    ExpiredToken,
    #[error("Account is inactive or no longer exists")]
    InactiveAccount,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Admin privileges required")]
    Forbidden,
    #[error("authentication backend failure: {0}")]
    Internal(String),
}

// --- Tokens ---

/// Signs a session token for `user`, valid for `ttl_hours`.
pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(e.to_string()))
}

/// Verifies signature and expiry, mapping failures onto the rejection taxonomy.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
}

/// Pulls the session token from the `admin_token` cookie, the `token` cookie or an
/// `Authorization: Bearer` header, in that order.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let cookies: Vec<(&str, &str)> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .collect();

    for wanted in [ADMIN_COOKIE, USER_COOKIE] {
        if let Some((_, value)) = cookies
            .iter()
            .find(|(name, value)| *name == wanted && !value.is_empty())
        {
            return Some(value.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

// --- Cookies ---

/// The session cookie name for a role.
pub fn cookie_name_for(role: &str) -> &'static str {
    if role == Role::Admin.as_str() {
        ADMIN_COOKIE
    } else {
        USER_COOKIE
    }
}

pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// A cookie that makes the browser drop `name` immediately.
pub fn expired_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

// --- Passwords ---

/// Hashes a password with Argon2id and a random salt (PHC string format).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
}

/// Constant-time verification. A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

/// Hash of a random secret, checked when a login names an unknown email so that case
/// costs the same Argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password(&Uuid::new_v4().to_string()).ok());

/// Runs a full verification against `DUMMY_HASH`. Always `false`.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        verify_password(password, hash);
    }
    false
}

// --- Extractors ---

/// AuthUser
///
/// The resolved identity of an authenticated request. The role is re-read from the user
/// store on every request so demotions and deactivations apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Reuse an identity already attached by the admin gate middleware.
/// 2. Local bypass: in `Env::Local`, an `x-user-id` header naming an existing user.
/// 3. Token from cookie or bearer header, verified and decoded.
/// 4. User lookup: the account must still exist and be active.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());

            if let Some(user_id) = bypass_id {
                if let Some(user) = load_active_user(&repo, user_id).await? {
                    let auth_user = AuthUser::from(&user);
                    parts.extensions.insert(auth_user.clone());
                    return Ok(auth_user);
                }
            }
        }

        let token = extract_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let claims = decode_token(&token, &config.jwt_secret)?;

        let user = load_active_user(&repo, claims.sub)
            .await?
            .ok_or(AuthError::InactiveAccount)?;

        let auth_user = AuthUser::from(&user);
        parts.extensions.insert(auth_user.clone());
        Ok(auth_user)
    }
}

async fn load_active_user(repo: &RepositoryState, id: Uuid) -> Result<Option<User>, AuthError> {
    let user = repo
        .get_user(id)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(user.filter(|u| u.is_active))
}

/// AdminUser
///
/// An [`AuthUser`] whose role is `admin`. Rejects other roles with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

// --- Bootstrap ---

/// ensure_admin
///
/// Creates the configured administrator unless an account with that email already
/// exists. Returns whether a new account was written. An existing account is left
/// untouched, including its password.
pub async fn ensure_admin(repo: &dyn Repository, seed: &AdminSeed) -> Result<bool, AuthError> {
    let existing = repo
        .find_user_by_email(&seed.email)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    if existing.is_some() {
        return Ok(false);
    }

    let hash = hash_password(&seed.password)?;
    let request = CreateUserRequest {
        name: Some(seed.name.clone()),
        email: Some(seed.email.clone()),
        password: Some(seed.password.clone()),
        role: Some(Role::Admin),
        is_active: Some(true),
    };

    match repo.insert_user(&User::new(request, hash)).await {
        Ok(_) => Ok(true),
        // Another instance seeded it first.
        Err(RepoError::Conflict(_)) => Ok(false),
        Err(e) => Err(AuthError::Internal(e.to_string())),
    }
}
