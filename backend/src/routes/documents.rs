use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use crate::core::{self, ApiError, CacheKey, scope};
use crate::db::{self, NewDocument};
use crate::middleware::role_guard::Caller;
use crate::services::documents;

/// Upload limit for a single document.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Stores metadata of the `file` part: name, display type and size. The
/// content is read to measure it and then dropped.
pub async fn upload(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut new_document = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("document")
            .to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let size = field.bytes().await?.len() as u64;

        new_document = Some(NewDocument {
            file_type: documents::display_type(&name, content_type.as_deref()),
            file_size: documents::format_file_size(size),
            size_bytes: i64::try_from(size).unwrap_or(i64::MAX),
            name,
        });
    }

    let new_document = new_document.ok_or_else(|| ApiError::invalid("Choose a file to upload"))?;
    let document = db::create_document(&context.db, caller.user_id, &new_document).await?;
    context.cache.invalidate(&CacheKey::new(scope::TENANT_DOCUMENTS, caller.user_id)).await;
    tracing::info!(user_id = caller.user_id, document_id = document.id, size = document.size_bytes, "Document uploaded");
    Ok((StatusCode::CREATED, Json(json!({"result": "ok", "document": document}))))
}

pub async fn list(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = context
        .cache
        .get_or_fetch(CacheKey::new(scope::TENANT_DOCUMENTS, caller.user_id), || {
            db::list_documents_by_user(&context.db, caller.user_id)
        })
        .await?;
    Ok(Json(json!({"result": "ok", "documents": documents})))
}

pub async fn delete(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    db::delete_owned_document(&context.db, caller.user_id, id)
        .await
        .map_err(ApiError::not_found_or("Document"))?;
    context.cache.invalidate(&CacheKey::new(scope::TENANT_DOCUMENTS, caller.user_id)).await;
    Ok(Json(json!({"result": "ok"})))
}
