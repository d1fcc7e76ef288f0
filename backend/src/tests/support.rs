use axum::http::{StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};

use crate::app;
use crate::auth::{self, Role};
use crate::cfg;
use crate::core;
use crate::db;

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const JWT_SECRET: &str = "test__secret__key__for__jwt__testing";

pub struct TestApp {
    pub server: TestServer,
    pub context: core::ArcContext,
}

pub fn test_settings() -> cfg::AppSettings {
    cfg::AppSettings {
        jwt: cfg::JwtSettings {
            access_token_expiry: 3600,
            refresh_token_expiry: 86400,
        },
        // one connection keeps every query on the same in-memory database
        database: cfg::DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        auth: cfg::AuthSettings {
            rate_limit_max_requests: 10_000,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_settings()).await
}

pub async fn spawn_app_with(settings: cfg::AppSettings) -> TestApp {
    let db = app::create_db_context(&settings.database).await.unwrap();
    app::run_migrations(&db).await.unwrap();

    let jwt = auth::JwtContext::new(&settings.jwt, JWT_SECRET);
    let context = core::Context::new(db, jwt, settings);
    let server = TestServer::new(app::create_router(context.clone())).unwrap();
    TestApp { server, context }
}

impl TestApp {
    /// Signs up through the API and returns the response body.
    pub async fn signup(&self, email: &str, role: &str, phone: &str) -> Value {
        let response = self
            .server
            .post("/auth/signup")
            .json(&json!({
                "email": email,
                "password": TEST_PASSWORD,
                "full_name": format!("User {email}"),
                "phone": phone,
                "role": role,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    /// Signs up and returns `(user_id, access_token)`.
    pub async fn signup_token(&self, email: &str, role: &str) -> (i64, String) {
        let body = self.signup(email, role, "9876543210").await;
        (
            body["user"]["id"].as_i64().unwrap(),
            body["tokens"]["access_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn login_token(&self, email: &str) -> String {
        let response = self
            .server
            .post("/auth/login")
            .json(&json!({"email": email, "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["tokens"]["access_token"].as_str().unwrap().to_string()
    }

    /// Admins cannot sign up, so they are written straight to the database.
    pub async fn admin_token(&self) -> String {
        let email = "admin@renttrack.test";
        let new_user = db::NewUser {
            email: email.to_string(),
            password_hash: auth::hash_password(TEST_PASSWORD).unwrap(),
            full_name: "Site Admin".to_string(),
            phone: String::new(),
        };
        db::create_user_with_role(&self.context.db, &new_user, Role::Admin).await.unwrap();
        self.login_token(email).await
    }

    /// A user whose role row has not been written yet.
    pub async fn pending_user(&self, email: &str) -> (i64, String) {
        let new_user = db::NewUser {
            email: email.to_string(),
            password_hash: auth::hash_password(TEST_PASSWORD).unwrap(),
            full_name: "Pending User".to_string(),
            phone: String::new(),
        };
        let mut conn = self.context.db.acquire().await.unwrap();
        let user = db::insert_user(&mut conn, &new_user).await.unwrap();
        drop(conn);
        let token = self.login_token(email).await;
        (user.id, token)
    }

    pub async fn create_property(&self, token: &str, name: &str, rent_amount: f64) -> i64 {
        let response = self
            .server
            .post("/api/owner/properties")
            .add_header(header::AUTHORIZATION, format!("Bearer {token}"))
            .json(&json!({
                "name": name,
                "address": "12 MG Road",
                "city": "Pune",
                "rent_amount": rent_amount,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        body["property"]["id"].as_i64().unwrap()
    }
}
