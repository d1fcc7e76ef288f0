use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::{Role, RoleSet};
use crate::core::{DbContext, DbError};

const BANNER_COLUMNS: &str =
    "id, title, subtitle, image_url, page, target_roles, display_order, is_active, created_at, updated_at";

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub page: String,
    #[sqlx(try_from = "String")]
    pub target_roles: RoleSet,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewBanner {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_page")]
    pub page: String,
    pub target_roles: RoleSet,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BannerUpdate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub page: Option<String>,
    pub target_roles: Option<RoleSet>,
    pub display_order: Option<i64>,
    pub is_active: Option<bool>,
}

pub(crate) fn default_page() -> String {
    "Dashboard".to_string()
}

pub(crate) const fn default_active() -> bool {
    true
}

pub async fn create_banner(db: &DbContext, new_banner: &NewBanner) -> Result<Banner, DbError> {
    let banner = sqlx::query_as::<_, Banner>(&format!(
        r"
        INSERT INTO banners
            (title, subtitle, image_url, page, target_roles, display_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING {BANNER_COLUMNS}
        "
    ))
    .bind(new_banner.title.trim())
    .bind(new_banner.subtitle.trim())
    .bind(new_banner.image_url.trim())
    .bind(new_banner.page.trim())
    .bind(new_banner.target_roles.to_json())
    .bind(new_banner.display_order)
    .bind(new_banner.is_active)
    .fetch_one(db)
    .await?;
    Ok(banner)
}

pub async fn get_banner(db: &DbContext, id: i64) -> Result<Banner, DbError> {
    let banner = sqlx::query_as::<_, Banner>(&format!("SELECT {BANNER_COLUMNS} FROM banners WHERE id = ?"))
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(banner)
}

pub async fn list_banners(db: &DbContext) -> Result<Vec<Banner>, DbError> {
    let banners = sqlx::query_as::<_, Banner>(&format!(
        "SELECT {BANNER_COLUMNS} FROM banners ORDER BY display_order, id"
    ))
    .fetch_all(db)
    .await?;
    Ok(banners)
}

/// Active banners whose targeting includes `role`, in display order.
pub async fn list_active_banners_for_role(db: &DbContext, role: Role) -> Result<Vec<Banner>, DbError> {
    let banners = sqlx::query_as::<_, Banner>(&format!(
        "SELECT {BANNER_COLUMNS} FROM banners WHERE is_active = 1 ORDER BY display_order, id"
    ))
    .fetch_all(db)
    .await?;
    Ok(banners.into_iter().filter(|b| b.target_roles.contains(role)).collect())
}

pub async fn update_banner(db: &DbContext, id: i64, update: &BannerUpdate) -> Result<Banner, DbError> {
    let banner = sqlx::query_as::<_, Banner>(&format!(
        r"
        UPDATE banners
        SET title = COALESCE(?, title),
            subtitle = COALESCE(?, subtitle),
            image_url = COALESCE(?, image_url),
            page = COALESCE(?, page),
            target_roles = COALESCE(?, target_roles),
            display_order = COALESCE(?, display_order),
            is_active = COALESCE(?, is_active),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING {BANNER_COLUMNS}
        "
    ))
    .bind(update.title.as_deref().map(str::trim))
    .bind(update.subtitle.as_deref().map(str::trim))
    .bind(update.image_url.as_deref().map(str::trim))
    .bind(update.page.as_deref().map(str::trim))
    .bind(update.target_roles.as_ref().map(RoleSet::to_json))
    .bind(update.display_order)
    .bind(update.is_active)
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(banner)
}

pub async fn set_banner_active(db: &DbContext, id: i64, is_active: bool) -> Result<Banner, DbError> {
    let banner = sqlx::query_as::<_, Banner>(&format!(
        "UPDATE banners SET is_active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? RETURNING {BANNER_COLUMNS}"
    ))
    .bind(is_active)
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(banner)
}

pub async fn delete_banner(db: &DbContext, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM banners WHERE id = ?").bind(id).execute(db).await?;
    if result.rows_affected() == 0 {
        return Err(DbError::RowNotFound(sqlx::Error::RowNotFound));
    }
    Ok(())
}
