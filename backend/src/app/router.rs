use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::core;
use crate::middleware::{rate_limit, role_guard};
use crate::routes;

/// Back end server built from routes that are public, need a session, or need a resolved role
pub fn create_router(context: core::ArcContext) -> Router {
    // Owner-only data API
    let owner_routes = Router::new()
        .route("/properties", get(routes::properties::list_owned).post(routes::properties::create))
        .route(
            "/properties/{id}",
            get(routes::properties::get)
                .put(routes::properties::update)
                .delete(routes::properties::delete),
        )
        .route(
            "/properties/{id}/list",
            post(routes::properties::publish).delete(routes::properties::unpublish),
        )
        .route("/tenants/search", get(routes::tenancy::search_tenants))
        .route("/assignments", get(routes::tenancy::list_assigned).post(routes::tenancy::assign))
        .route("/assignments/{id}/invitation", get(routes::tenancy::invitation))
        .route("/reminders", get(routes::tenancy::reminders))
        .route("/expenses", get(routes::expenses::list).post(routes::expenses::create))
        .route("/expenses/{id}", axum::routing::delete(routes::expenses::delete))
        .route("/finance", get(routes::finance::summary))
        .route("/reports", get(routes::finance::monthly_report))
        .route(
            "/notification-settings",
            get(routes::notifications::get_settings).put(routes::notifications::update_settings),
        )
        .layer(middleware::from_fn_with_state(context.clone(), role_guard::require_owner));

    // Tenant-only data API
    let tenant_routes = Router::new()
        .route("/properties", get(routes::properties::browse_listed))
        .route("/properties/{id}/contact", get(routes::properties::contact_owner))
        .route("/agreement", get(routes::tenancy::agreement))
        .route("/schedule", get(routes::tenancy::rent_schedule))
        .route("/payments", post(routes::payments::record))
        .route("/receipts", get(routes::payments::receipts))
        .route(
            "/documents",
            get(routes::documents::list)
                .post(routes::documents::upload)
                .layer(DefaultBodyLimit::max(routes::documents::MAX_UPLOAD_BYTES)),
        )
        .route("/documents/{id}", axum::routing::delete(routes::documents::delete))
        .layer(middleware::from_fn_with_state(context.clone(), role_guard::require_tenant));

    // Admin-only content management and overviews
    let admin_routes = Router::new()
        .route("/banners", get(routes::banners::list).post(routes::banners::create))
        .route(
            "/banners/{id}",
            get(routes::banners::get)
                .put(routes::banners::update)
                .delete(routes::banners::delete),
        )
        .route("/banners/{id}/active", put(routes::banners::set_active))
        .route("/services", get(routes::service_cards::list).post(routes::service_cards::create))
        .route(
            "/services/{id}",
            get(routes::service_cards::get)
                .put(routes::service_cards::update)
                .delete(routes::service_cards::delete),
        )
        .route("/services/{id}/active", put(routes::service_cards::set_active))
        .route("/users", get(routes::admin::users))
        .route("/properties", get(routes::admin::properties))
        .route("/reports", get(routes::finance::platform_report))
        .layer(middleware::from_fn_with_state(context.clone(), role_guard::require_admin));

    // Any role, once resolved
    let dashboard_routes = Router::new()
        .route("/api/dashboard/carousel", get(routes::dashboard::carousel))
        .layer(middleware::from_fn_with_state(context.clone(), role_guard::require_resolved_role));

    // Routes that need a session; role guards run after authentication
    let session_routes = Router::new()
        .nest("/api/owner", owner_routes)
        .nest("/api/tenant", tenant_routes)
        .nest("/api/admin", admin_routes)
        .merge(dashboard_routes)
        .route("/api/profile", get(routes::profile::get_profile).put(routes::profile::update_profile))
        .route("/auth/password", post(routes::auth::change_password))
        .layer(middleware::from_fn_with_state(context.clone(), role_guard::authenticate))
        .with_state(context.clone());

    // Sign-in and sign-up are rate limited per client IP
    let limited_auth_routes = Router::new()
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .layer(middleware::from_fn_with_state(context.clone(), rate_limit::rate_limit_middleware))
        .with_state(context.clone());

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/logout", get(routes::auth::logout)) // revokes refresh tokens of the bearer
        .route("/auth/refresh", post(routes::auth::refresh_access_token))
        .route("/auth/revoke", post(routes::auth::revoke_token))
        .route("/auth/session", get(routes::auth::session))
        .route("/api/access", get(routes::access::check_access))
        .with_state(context);

    // Combine all routes
    Router::new()
        .merge(limited_auth_routes)
        .merge(session_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
}
