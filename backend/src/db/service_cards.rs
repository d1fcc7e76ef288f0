use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::{Role, RoleSet};
use crate::core::{DbContext, DbError};
use crate::db::banners::{default_active, default_page};

const SERVICE_COLUMNS: &str =
    "id, title, icon, description, page, target_roles, display_order, is_active, created_at, updated_at";

/// Promotional service card, stored in the `services` table.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct ServiceCard {
    pub id: i64,
    pub title: String,
    pub icon: String,
    pub description: String,
    pub page: String,
    #[sqlx(try_from = "String")]
    pub target_roles: RoleSet,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewServiceCard {
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_page")]
    pub page: String,
    pub target_roles: RoleSet,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ServiceCardUpdate {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub page: Option<String>,
    pub target_roles: Option<RoleSet>,
    pub display_order: Option<i64>,
    pub is_active: Option<bool>,
}

pub async fn create_service_card(db: &DbContext, new_card: &NewServiceCard) -> Result<ServiceCard, DbError> {
    let card = sqlx::query_as::<_, ServiceCard>(&format!(
        r"
        INSERT INTO services
            (title, icon, description, page, target_roles, display_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING {SERVICE_COLUMNS}
        "
    ))
    .bind(new_card.title.trim())
    .bind(new_card.icon.trim())
    .bind(new_card.description.trim())
    .bind(new_card.page.trim())
    .bind(new_card.target_roles.to_json())
    .bind(new_card.display_order)
    .bind(new_card.is_active)
    .fetch_one(db)
    .await?;
    Ok(card)
}

pub async fn get_service_card(db: &DbContext, id: i64) -> Result<ServiceCard, DbError> {
    let card = sqlx::query_as::<_, ServiceCard>(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?"))
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(card)
}

pub async fn list_service_cards(db: &DbContext) -> Result<Vec<ServiceCard>, DbError> {
    let cards = sqlx::query_as::<_, ServiceCard>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services ORDER BY display_order, id"
    ))
    .fetch_all(db)
    .await?;
    Ok(cards)
}

pub async fn list_active_service_cards_for_role(db: &DbContext, role: Role) -> Result<Vec<ServiceCard>, DbError> {
    let cards = sqlx::query_as::<_, ServiceCard>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = 1 ORDER BY display_order, id"
    ))
    .fetch_all(db)
    .await?;
    Ok(cards.into_iter().filter(|c| c.target_roles.contains(role)).collect())
}

pub async fn update_service_card(db: &DbContext, id: i64, update: &ServiceCardUpdate) -> Result<ServiceCard, DbError> {
    let card = sqlx::query_as::<_, ServiceCard>(&format!(
        r"
        UPDATE services
        SET title = COALESCE(?, title),
            icon = COALESCE(?, icon),
            description = COALESCE(?, description),
            page = COALESCE(?, page),
            target_roles = COALESCE(?, target_roles),
            display_order = COALESCE(?, display_order),
            is_active = COALESCE(?, is_active),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING {SERVICE_COLUMNS}
        "
    ))
    .bind(update.title.as_deref().map(str::trim))
    .bind(update.icon.as_deref().map(str::trim))
    .bind(update.description.as_deref().map(str::trim))
    .bind(update.page.as_deref().map(str::trim))
    .bind(update.target_roles.as_ref().map(RoleSet::to_json))
    .bind(update.display_order)
    .bind(update.is_active)
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(card)
}

pub async fn set_service_card_active(db: &DbContext, id: i64, is_active: bool) -> Result<ServiceCard, DbError> {
    let card = sqlx::query_as::<_, ServiceCard>(&format!(
        "UPDATE services SET is_active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? RETURNING {SERVICE_COLUMNS}"
    ))
    .bind(is_active)
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(card)
}

pub async fn delete_service_card(db: &DbContext, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM services WHERE id = ?").bind(id).execute(db).await?;
    if result.rows_affected() == 0 {
        return Err(DbError::RowNotFound(sqlx::Error::RowNotFound));
    }
    Ok(())
}
