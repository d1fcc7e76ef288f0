use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::core::{DbContext, DbError};

const DOCUMENT_COLUMNS: &str = "id, user_id, name, file_type, file_size, size_bytes, created_at";

/// Metadata of an uploaded document. The file content itself is not kept.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub file_type: String,
    pub file_size: String,
    pub size_bytes: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug)]
pub struct NewDocument {
    pub name: String,
    pub file_type: String,
    pub file_size: String,
    pub size_bytes: i64,
}

pub async fn create_document(db: &DbContext, user_id: i64, new_document: &NewDocument) -> Result<Document, DbError> {
    let document = sqlx::query_as::<_, Document>(&format!(
        r"
        INSERT INTO documents (user_id, name, file_type, file_size, size_bytes, created_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        RETURNING {DOCUMENT_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(&new_document.name)
    .bind(&new_document.file_type)
    .bind(&new_document.file_size)
    .bind(new_document.size_bytes)
    .fetch_one(db)
    .await?;
    Ok(document)
}

pub async fn list_documents_by_user(db: &DbContext, user_id: i64) -> Result<Vec<Document>, DbError> {
    let documents = sqlx::query_as::<_, Document>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(documents)
}

pub async fn delete_owned_document(db: &DbContext, user_id: i64, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::RowNotFound(sqlx::Error::RowNotFound));
    }
    Ok(())
}
