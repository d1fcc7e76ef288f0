use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::auth::Role;
use crate::core::{DbContext, DbError};
use crate::db;

const USER_COLUMNS: &str = "id, email, password_hash, full_name, phone, created_at, updated_at";

#[derive(Clone, Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// A registered tenant as seen by an owner searching for someone to assign.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct TenantCandidate {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct UserOverview {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[sqlx(try_from = "String")]
    pub role: RoleColumn,
    pub created_at: NaiveDateTime,
}

/// Role column of a LEFT JOIN; empty when the user has no role row.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(transparent)]
pub struct RoleColumn(pub Option<Role>);

impl TryFrom<String> for RoleColumn {
    type Error = crate::auth::ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(Self(None));
        }
        value.parse().map(|role| Self(Some(role)))
    }
}

pub async fn insert_user(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<User, DbError> {
    let user = sqlx::query_as::<_, User>(&format!(
        r"
        INSERT INTO users (email, password_hash, full_name, phone, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING {USER_COLUMNS}
        "
    ))
    .bind(new_user.email.trim())
    .bind(&new_user.password_hash)
    .bind(new_user.full_name.trim())
    .bind(new_user.phone.trim())
    .fetch_one(conn)
    .await?;
    Ok(user)
}

/// Creates the account and its role row together, so a failed role insert
/// never leaves an account without a role.
pub async fn create_user_with_role(db: &DbContext, new_user: &NewUser, role: Role) -> Result<User, DbError> {
    let mut tx = db.begin().await?;
    let user = insert_user(&mut tx, new_user).await?;
    db::insert_user_role(&mut tx, user.id, role).await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn get_user_by_id(db: &DbContext, id: i64) -> Result<User, DbError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(user)
}

pub async fn get_user_by_email(db: &DbContext, email: &str) -> Result<User, DbError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email.trim())
        .fetch_one(db)
        .await?;
    Ok(user)
}

pub async fn update_profile(db: &DbContext, id: i64, update: &ProfileUpdate) -> Result<User, DbError> {
    let user = sqlx::query_as::<_, User>(&format!(
        r"
        UPDATE users
        SET full_name = COALESCE(?, full_name),
            phone = COALESCE(?, phone),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "
    ))
    .bind(update.full_name.as_deref().map(str::trim))
    .bind(update.phone.as_deref().map(str::trim))
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn update_password_hash(db: &DbContext, id: i64, password_hash: &str) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::RowNotFound(sqlx::Error::RowNotFound));
    }
    Ok(())
}

/// Registered tenants whose email or phone contains `query`.
pub async fn search_tenants(db: &DbContext, query: &str, limit: i64) -> Result<Vec<TenantCandidate>, DbError> {
    let pattern = format!("%{}%", escape_like(query.trim()));
    let tenants = sqlx::query_as::<_, TenantCandidate>(
        r"
        SELECT u.id, u.full_name, u.email, u.phone
        FROM users u
        JOIN user_roles r ON r.user_id = u.id AND r.role = 'tenant'
        WHERE u.email LIKE ? ESCAPE '\' OR u.phone LIKE ? ESCAPE '\'
        ORDER BY u.full_name, u.id
        LIMIT ?
        ",
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(tenants)
}

/// Makes `%` and `_` match literally under `ESCAPE '\'`.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn list_users_with_roles(db: &DbContext) -> Result<Vec<UserOverview>, DbError> {
    let users = sqlx::query_as::<_, UserOverview>(
        r"
        SELECT u.id, u.full_name, u.email, u.phone, COALESCE(MIN(r.role), '') AS role, u.created_at
        FROM users u
        LEFT JOIN user_roles r ON r.user_id = u.id
        GROUP BY u.id
        ORDER BY u.created_at DESC, u.id DESC
        ",
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}
