use sqlx::SqliteConnection;

use crate::auth::{Role, RoleResolution};
use crate::core::{DbContext, DbError};

pub async fn insert_user_role(conn: &mut SqliteConnection, user_id: i64, role: Role) -> Result<(), DbError> {
    sqlx::query("INSERT INTO user_roles (user_id, role, created_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
        .bind(user_id)
        .bind(role.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn get_user_roles(db: &DbContext, user_id: i64) -> Result<Vec<Role>, DbError> {
    let names: Vec<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(db)
        .await?;
    let mut roles = names
        .into_iter()
        .map(|name| Role::try_from(name).map_err(|e| DbError::InvalidStoredValue(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    roles.sort();
    Ok(roles)
}

/// Resolves the caller's effective role from `user_roles.user_id`, the only
/// place roles are read from. An account without a role row is `Pending`;
/// with several rows the highest-privilege one wins (admin, owner, tenant).
pub async fn resolve_role(db: &DbContext, user_id: i64) -> Result<RoleResolution, DbError> {
    let roles = get_user_roles(db, user_id).await?;
    Ok(roles
        .first()
        .copied()
        .map_or(RoleResolution::Pending, RoleResolution::Resolved))
}

pub async fn count_users_by_role(db: &DbContext) -> Result<Vec<(Role, i64)>, DbError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT role, COUNT(DISTINCT user_id) FROM user_roles GROUP BY role ORDER BY role")
            .fetch_all(db)
            .await?;
    rows.into_iter()
        .map(|(name, count)| {
            Role::try_from(name)
                .map(|role| (role, count))
                .map_err(|e| DbError::InvalidStoredValue(e.to_string()))
        })
        .collect()
}
