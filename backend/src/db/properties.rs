use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::auth::ParseEnumError;
use crate::core::{DbContext, DbError};

const PROPERTY_COLUMNS: &str = "id, owner_id, name, address, city, state, pincode, description, \
                                rent_amount, property_type, status, created_at, updated_at";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Vacant,
    Occupied,
    Listed,
}

impl PropertyStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vacant => "vacant",
            Self::Occupied => "occupied",
            Self::Listed => "listed",
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vacant" => Ok(Self::Vacant),
            "occupied" => Ok(Self::Occupied),
            "listed" => Ok(Self::Listed),
            _ => Err(ParseEnumError::new("property status", s)),
        }
    }
}

impl TryFrom<String> for PropertyStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub description: String,
    pub rent_amount: f64,
    pub property_type: String,
    #[sqlx(try_from = "String")]
    pub status: PropertyStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewProperty {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub description: String,
    pub rent_amount: f64,
    #[serde(default = "default_property_type")]
    pub property_type: String,
}

fn default_property_type() -> String {
    "apartment".to_string()
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropertyUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub description: Option<String>,
    pub rent_amount: Option<f64>,
    pub property_type: Option<String>,
}

/// Listed property as shown to tenants browsing, with the owner's contact.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct ListedProperty {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub description: String,
    pub rent_amount: f64,
    pub property_type: String,
    pub owner_name: String,
    pub owner_phone: String,
}

/// Platform-wide view for admins.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct PropertyOverview {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub rent_amount: f64,
    #[sqlx(try_from = "String")]
    pub status: PropertyStatus,
    pub owner_id: i64,
    pub owner_name: String,
    pub tenant_count: i64,
}

pub async fn create_property(db: &DbContext, owner_id: i64, new_property: &NewProperty) -> Result<Property, DbError> {
    let property = sqlx::query_as::<_, Property>(&format!(
        r"
        INSERT INTO properties
            (owner_id, name, address, city, state, pincode, description, rent_amount, property_type, status,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'vacant', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING {PROPERTY_COLUMNS}
        "
    ))
    .bind(owner_id)
    .bind(new_property.name.trim())
    .bind(new_property.address.trim())
    .bind(new_property.city.trim())
    .bind(new_property.state.trim())
    .bind(new_property.pincode.trim())
    .bind(new_property.description.trim())
    .bind(new_property.rent_amount)
    .bind(new_property.property_type.trim())
    .fetch_one(db)
    .await?;
    Ok(property)
}

/// Fetches a property only if it belongs to `owner_id`.
pub async fn get_owned_property(db: &DbContext, owner_id: i64, id: i64) -> Result<Property, DbError> {
    let property = sqlx::query_as::<_, Property>(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_one(db)
    .await?;
    Ok(property)
}

pub async fn get_property_by_id(db: &DbContext, id: i64) -> Result<Property, DbError> {
    let property = sqlx::query_as::<_, Property>(&format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?"))
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(property)
}

pub async fn list_properties_by_owner(db: &DbContext, owner_id: i64) -> Result<Vec<Property>, DbError> {
    let properties = sqlx::query_as::<_, Property>(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties WHERE owner_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(properties)
}

pub async fn list_listed_properties(db: &DbContext) -> Result<Vec<ListedProperty>, DbError> {
    let properties = sqlx::query_as::<_, ListedProperty>(
        r"
        SELECT p.id, p.name, p.address, p.city, p.state, p.description, p.rent_amount, p.property_type,
               u.full_name AS owner_name, u.phone AS owner_phone
        FROM properties p
        JOIN users u ON u.id = p.owner_id
        WHERE p.status = 'listed'
        ORDER BY p.updated_at DESC, p.id DESC
        ",
    )
    .fetch_all(db)
    .await?;
    Ok(properties)
}

pub async fn get_listed_property(db: &DbContext, id: i64) -> Result<ListedProperty, DbError> {
    let property = sqlx::query_as::<_, ListedProperty>(
        r"
        SELECT p.id, p.name, p.address, p.city, p.state, p.description, p.rent_amount, p.property_type,
               u.full_name AS owner_name, u.phone AS owner_phone
        FROM properties p
        JOIN users u ON u.id = p.owner_id
        WHERE p.status = 'listed' AND p.id = ?
        ",
    )
    .bind(id)
    .fetch_one(db)
    .await?;
    Ok(property)
}

pub async fn list_property_overview(db: &DbContext) -> Result<Vec<PropertyOverview>, DbError> {
    let properties = sqlx::query_as::<_, PropertyOverview>(
        r"
        SELECT p.id, p.name, p.city, p.rent_amount, p.status, p.owner_id, u.full_name AS owner_name,
               (SELECT COUNT(*) FROM tenant_assignments a WHERE a.property_id = p.id) AS tenant_count
        FROM properties p
        JOIN users u ON u.id = p.owner_id
        ORDER BY p.created_at DESC, p.id DESC
        ",
    )
    .fetch_all(db)
    .await?;
    Ok(properties)
}

pub async fn update_property(
    db: &DbContext,
    owner_id: i64,
    id: i64,
    update: &PropertyUpdate,
) -> Result<Property, DbError> {
    let property = sqlx::query_as::<_, Property>(&format!(
        r"
        UPDATE properties
        SET name = COALESCE(?, name),
            address = COALESCE(?, address),
            city = COALESCE(?, city),
            state = COALESCE(?, state),
            pincode = COALESCE(?, pincode),
            description = COALESCE(?, description),
            rent_amount = COALESCE(?, rent_amount),
            property_type = COALESCE(?, property_type),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND owner_id = ?
        RETURNING {PROPERTY_COLUMNS}
        "
    ))
    .bind(update.name.as_deref().map(str::trim))
    .bind(update.address.as_deref().map(str::trim))
    .bind(update.city.as_deref().map(str::trim))
    .bind(update.state.as_deref().map(str::trim))
    .bind(update.pincode.as_deref().map(str::trim))
    .bind(update.description.as_deref().map(str::trim))
    .bind(update.rent_amount)
    .bind(update.property_type.as_deref().map(str::trim))
    .bind(id)
    .bind(owner_id)
    .fetch_one(db)
    .await?;
    Ok(property)
}

pub async fn set_property_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: PropertyStatus,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE properties SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::RowNotFound(sqlx::Error::RowNotFound));
    }
    Ok(())
}

pub async fn delete_property(db: &DbContext, owner_id: i64, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM properties WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::RowNotFound(sqlx::Error::RowNotFound));
    }
    Ok(())
}
