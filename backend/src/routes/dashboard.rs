use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::json;

use crate::core::{self, ApiError, CacheKey, DbError, scope};
use crate::db::{self, Banner, ServiceCard};
use crate::middleware::role_guard::Caller;

#[derive(Clone, Debug, Serialize)]
pub struct Carousel {
    pub banners: Vec<Banner>,
    pub services: Vec<ServiceCard>,
}

/// Active banners and services targeted at the caller's role, in display order.
pub async fn carousel(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let carousel = context
        .cache
        .get_or_fetch(CacheKey::new(scope::DASHBOARD_CAROUSEL, caller.role), || async {
            Ok::<_, DbError>(Carousel {
                banners: db::list_active_banners_for_role(&context.db, caller.role).await?,
                services: db::list_active_service_cards_for_role(&context.db, caller.role).await?,
            })
        })
        .await?;
    Ok(Json(json!({
        "result": "ok",
        "role": caller.role,
        "banners": carousel.banners,
        "services": carousel.services,
    })))
}
