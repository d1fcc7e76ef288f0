use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::json;
use sha2::Digest;
use thiserror::Error;

use crate::auth::{self, JwtError, Role, RoleResolution, TokenResponse};
use crate::core::{self, DbError};
use crate::db::{self, NewRefreshToken, NewUser, User};
use crate::middleware::role_guard::Identity;
use crate::services::audit::{self, AuditEvent};

#[derive(Deserialize)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    refresh_token: String,
}

#[derive(Deserialize)]
pub struct RevokeTokenRequest {
    refresh_token: String,
}

#[derive(Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("{0}")]
    InvalidInput(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordHashingError(#[from] argon2::password_hash::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbError),

    #[error("User not found")]
    UserNotFound,

    #[error("Token expired or invalid")]
    TokenInvalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(
            error_type = %std::any::type_name::<Self>(),
            error_subtype = %std::any::type_name_of_val(&self),
            error_message = %self);

        #[allow(clippy::match_same_arms)]
        let (status, error_message) = match self {
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::EmailTaken => (StatusCode::CONFLICT, self.to_string()),
            Self::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::JwtError(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::PasswordHashingError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong, please try again".to_string()),
            Self::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong, please try again".to_string()),
            Self::UserNotFound => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::TokenInvalid => (StatusCode::UNAUTHORIZED, self.to_string()),
        };

        let body = Json(json!({
            "result": "error",
            "message": error_message
        }));

        (status, body).into_response()
    }
}

/// Sign-up route: creates the account with its role, then signs it in
pub async fn signup(
    State(context): State<core::ArcContext>,
    headers: HeaderMap,
    Json(signup): Json<Signup>,
) -> Result<impl IntoResponse, AuthError> {
    let email = signup.email.trim().to_lowercase();
    tracing::info!("Signing up user: {}", email);

    if !is_plausible_email(&email) {
        return Err(AuthError::InvalidInput("Please enter a valid email address".to_string()));
    }
    if signup.full_name.trim().is_empty() {
        return Err(AuthError::InvalidInput("Full name is required".to_string()));
    }
    if !signup.role.is_self_service() {
        return Err(AuthError::InvalidInput("Choose either the owner or the tenant role".to_string()));
    }
    auth::validate_new_password(&signup.password, context.settings.auth.min_password_length)
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

    let new_user = NewUser {
        email,
        password_hash: auth::hash_password(&signup.password)?,
        full_name: signup.full_name,
        phone: signup.phone,
    };
    let user = db::create_user_with_role(&context.db, &new_user, signup.role)
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation(_) => AuthError::EmailTaken,
            other => AuthError::DatabaseError(other),
        })?;

    audit::log_event(&AuditEvent::SignedUp {
        user_id: user.id,
        email: user.email.clone(),
        role: signup.role,
        client_ip: audit::extract_client_ip(&headers),
    });

    let tokens = issue_tokens(&context, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "result": "ok",
            "tokens": tokens,
            "user": user,
            "role": signup.role,
            "home": signup.role.home_route(),
        })),
    ))
}

/// Login route
pub async fn login(
    State(context): State<core::ArcContext>,
    headers: HeaderMap,
    Json(login): Json<Login>,
) -> Result<impl IntoResponse, AuthError> {
    let email = login.email.trim().to_lowercase();
    tracing::info!("Logging in user: {}", email);

    let failed = |reason: &str| {
        audit::log_event(&AuditEvent::SignInFailed {
            email: email.clone(),
            client_ip: audit::extract_client_ip(&headers),
            reason: reason.to_string(),
        });
        AuthError::InvalidCredentials
    };

    let Ok(user) = db::get_user_by_email(&context.db, &email).await else {
        return Err(failed("unknown email"));
    };
    if !auth::verify_password(&login.password, &user.password_hash)? {
        return Err(failed("wrong password"));
    }

    let tokens = issue_tokens(&context, &user).await?;
    let resolution = db::resolve_role(&context.db, user.id).await?;
    Ok(Json(json!({
        "result": "ok",
        "tokens": tokens,
        "user": user,
        "role": resolution.role(),
        "home": resolution.role().map(Role::home_route),
    })))
}

/// Logout route
pub async fn logout(State(context): State<core::ArcContext>, req: Request) -> Result<impl IntoResponse, AuthError> {
    let claims = auth::decode_access_token_from_req(&context.jwt, &req)?;
    let user_id = claims.user_id()?;
    tracing::info!(user_id, email = claims.email, "Logout");

    // revoke all the associated refresh tokens
    let revoked = db::revoke_all_refresh_tokens_for_user(&context.db, user_id).await?;
    tracing::debug!(user_id, revoked, "Refresh tokens revoked");

    Ok(Json(json!({"result": "ok"})))
}

/// Route to refresh access token using refresh token
pub async fn refresh_access_token(
    State(context): State<core::ArcContext>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    tracing::info!("Refreshing access token");

    // Decode and validate refresh token
    let refresh_claims =
        auth::decode_refresh_token(&context.jwt, &request.refresh_token).map_err(|_| AuthError::TokenInvalid)?;

    // Check if refresh token exists in database and is not revoked
    let stored_token = db::get_refresh_token_by_jti(&context.db, &refresh_claims.jti)
        .await
        .map_err(|_| AuthError::TokenInvalid)?;
    if stored_token.token_hash != hash_token(&request.refresh_token) {
        return Err(AuthError::TokenInvalid);
    }

    let user = db::get_user_by_id(&context.db, stored_token.user_id)
        .await
        .map_err(|_| AuthError::UserNotFound)?;
    let new_access_token = auth::generate_access_token(&context.jwt, user.id, &user.email)?;

    Ok(Json(json!({
        "result": "ok",
        "access_token": new_access_token,
        "expires_in": context.jwt.access_token_expiry,
        "user": user,
    })))
}

/// Route to revoke a refresh token
pub async fn revoke_token(
    State(context): State<core::ArcContext>,
    Json(request): Json<RevokeTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    tracing::info!("Revoking refresh token");

    let refresh_claims =
        auth::decode_refresh_token(&context.jwt, &request.refresh_token).map_err(|_| AuthError::TokenInvalid)?;
    db::revoke_refresh_token(&context.db, &refresh_claims.jti).await?;
    Ok(Json(json!({"result": "ok"})))
}

/// Session route. Never fails on a missing or bad token: that is simply an
/// anonymous session.
pub async fn session(State(context): State<core::ArcContext>, headers: HeaderMap) -> Result<impl IntoResponse, AuthError> {
    let Some(user_id) = auth::decode_access_token_from_headers(&context.jwt, &headers)
        .ok()
        .and_then(|claims| claims.user_id().ok())
    else {
        return Ok(Json(json!({"result": "ok", "state": "anonymous"})));
    };

    let Ok(user) = db::get_user_by_id(&context.db, user_id).await else {
        return Ok(Json(json!({"result": "ok", "state": "anonymous"})));
    };

    let body = match db::resolve_role(&context.db, user.id).await? {
        RoleResolution::Resolved(role) => json!({
            "result": "ok",
            "state": "resolved",
            "user": user,
            "role": role,
            "home": role.home_route(),
        }),
        RoleResolution::Pending | RoleResolution::Anonymous => json!({
            "result": "ok",
            "state": "pending",
            "user": user,
        }),
    };
    Ok(Json(body))
}

/// Password update for the signed-in user
pub async fn change_password(
    State(context): State<core::ArcContext>,
    Extension(identity): Extension<Identity>,
    Json(change): Json<PasswordChange>,
) -> Result<impl IntoResponse, AuthError> {
    let user = db::get_user_by_id(&context.db, identity.user_id)
        .await
        .map_err(|_| AuthError::UserNotFound)?;
    if !auth::verify_password(&change.current_password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }
    auth::validate_new_password(&change.new_password, context.settings.auth.min_password_length)
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

    let password_hash = auth::hash_password(&change.new_password)?;
    db::update_password_hash(&context.db, user.id, &password_hash).await?;
    tracing::info!(user_id = user.id, "Password updated");

    Ok(Json(json!({"result": "ok", "message": "Password updated successfully"})))
}

/// Generates an access/refresh pair and stores the refresh token's hash.
async fn issue_tokens(context: &core::Context, user: &User) -> Result<TokenResponse, AuthError> {
    let access_token = auth::generate_access_token(&context.jwt, user.id, &user.email)?;
    let refresh_token = auth::generate_refresh_token(&context.jwt, user.id)?;

    let refresh_claims = auth::decode_refresh_token(&context.jwt, &refresh_token)?;
    let expires_at = DateTime::from_timestamp(refresh_claims.exp, 0).ok_or(AuthError::TokenInvalid)?;
    let new_refresh_token = NewRefreshToken {
        jti: refresh_claims.jti,
        user_id: user.id,
        token_hash: hash_token(&refresh_token),
        expires_at: expires_at.naive_utc(),
    };
    db::create_refresh_token(&context.db, new_refresh_token).await?;

    Ok(TokenResponse::new(&context.jwt, access_token, refresh_token))
}

fn hash_token(token: &str) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(token);
    format!("{:x}", hasher.finalize())
}

fn is_plausible_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_check_requires_local_part_and_dotted_domain() {
        assert!(is_plausible_email("owner@example.com"));
        assert!(!is_plausible_email("owner@localhost"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("owner.example.com"));
    }

    #[test]
    fn token_hash_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash, hash_token("abc"));
        assert_eq!(hash.len(), 64);
    }
}
