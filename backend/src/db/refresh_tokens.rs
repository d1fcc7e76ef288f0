use chrono::NaiveDateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{DbContext, DbError};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub jti: String,
    pub user_id: i64,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewRefreshToken {
    pub jti: String,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
}

pub async fn create_refresh_token(db: &DbContext, new_refresh_token: NewRefreshToken) -> Result<(), DbError> {
    sqlx::query(
        r"
        INSERT INTO refresh_tokens (jti, user_id, token_hash, issued_at, expires_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, ?)
        ",
    )
    .bind(new_refresh_token.jti)
    .bind(new_refresh_token.user_id)
    .bind(new_refresh_token.token_hash)
    .bind(new_refresh_token.expires_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn revoke_refresh_token(db: &DbContext, jti: &str) -> Result<(), DbError> {
    sqlx::query("UPDATE refresh_tokens SET revoked_at = CURRENT_TIMESTAMP WHERE jti = ? AND revoked_at IS NULL")
        .bind(jti)
        .execute(db)
        .await?;
    Ok(())
}

/// Only returns tokens that have not been revoked.
pub async fn get_refresh_token_by_jti(db: &DbContext, jti: &str) -> Result<RefreshToken, DbError> {
    let token = sqlx::query_as::<_, RefreshToken>(
        r"
        SELECT id, jti, user_id, token_hash, issued_at, expires_at, revoked_at
        FROM refresh_tokens
        WHERE jti = ? AND revoked_at IS NULL
        ",
    )
    .bind(jti)
    .fetch_one(db)
    .await?;
    Ok(token)
}

pub async fn revoke_all_refresh_tokens_for_user(db: &DbContext, user_id: i64) -> Result<u64, DbError> {
    let now = Utc::now().naive_utc();
    let result = sqlx::query("UPDATE refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL")
        .bind(now)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes refresh tokens that expired before now. Run on start-up.
pub async fn purge_expired_refresh_tokens(db: &DbContext) -> Result<u64, DbError> {
    let now = Utc::now().naive_utc();
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
        .bind(now)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
