use axum::http::StatusCode;
use axum::http::header;
use serde_json::Value;
use serde_json::json;

use crate::tests::support::{self, TestApp};

async fn browse_listed(app: &TestApp, token: &str) -> Value {
    app.server
        .get("/api/tenant/properties")
        .add_header(header::AUTHORIZATION, format!("Bearer {token}"))
        .await
        .json()
}

#[tokio::test]
async fn test_property_crud_is_scoped_to_owner() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let (_, other_owner) = app.signup_token("other@example.com", "owner").await;
    let property_id = app.create_property(&owner, "Sea View 2BHK", 15000.0).await;

    let listed: Value = app
        .server
        .get("/api/owner/properties")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(listed["properties"].as_array().unwrap().len(), 1);
    assert_eq!(listed["properties"][0]["status"], "vacant");

    // the list is cached; an update must still show up
    app.server
        .put(&format!("/api/owner/properties/{property_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"rent_amount": 16000.0}))
        .await
        .assert_status(StatusCode::OK);
    let listed: Value = app
        .server
        .get("/api/owner/properties")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(listed["properties"][0]["rent_amount"], 16000.0);

    app.server
        .get(&format!("/api/owner/properties/{property_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {other_owner}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete(&format!("/api/owner/properties/{property_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .assert_status(StatusCode::OK);
    let listed: Value = app
        .server
        .get("/api/owner/properties")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert!(listed["properties"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rented_property_cannot_be_deleted() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let (tenant_id, tenant) = app.signup_token("tenant@example.com", "tenant").await;
    let property_id = app.create_property(&owner, "Maple Court", 11000.0).await;
    app.server
        .post("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"property_id": property_id, "tenant_id": tenant_id}))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .json(&json!({"method": "upi"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .delete(&format!("/api/owner/properties/{property_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["message"], "This property has tenants and payment history and cannot be deleted");

    let receipts: Value = app
        .server
        .get("/api/tenant/receipts")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .await
        .json();
    assert_eq!(receipts["receipts"].as_array().unwrap().len(), 1);

    app.server
        .get(&format!("/api/owner/properties/{property_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .assert_status(StatusCode::OK);

    app.server
        .delete("/api/owner/properties/999")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_property_requires_name_and_valid_rent() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;

    app.server
        .post("/api/owner/properties")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"name": "  ", "rent_amount": 1000.0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/owner/properties")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"name": "Flat", "rent_amount": -5.0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assigning_same_tenant_twice_conflicts() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let (tenant_id, _) = app.signup_token("tenant@example.com", "tenant").await;
    let property_id = app.create_property(&owner, "Garden Flat", 12000.0).await;

    let assignment = json!({"property_id": property_id, "tenant_id": tenant_id, "move_in_date": "2025-01-10"});
    let first = app
        .server
        .post("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&assignment)
        .await;
    first.assert_status(StatusCode::CREATED);
    let first: Value = first.json();
    assert_eq!(first["assignment"]["rent_status"], "pending");

    let second = app
        .server
        .post("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&assignment)
        .await;
    second.assert_status(StatusCode::CONFLICT);
    let second: Value = second.json();
    assert_eq!(second["message"], "Tenant is already assigned to this property");

    let detail: Value = app
        .server
        .get(&format!("/api/owner/properties/{property_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(detail["property"]["status"], "occupied");
    assert_eq!(detail["tenants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_registered_tenants_can_be_assigned() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let (other_owner_id, _) = app.signup_token("other@example.com", "owner").await;
    let property_id = app.create_property(&owner, "Loft", 9000.0).await;

    app.server
        .post("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"property_id": property_id, "tenant_id": other_owner_id}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let detail: Value = app
        .server
        .get(&format!("/api/owner/properties/{property_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(detail["property"]["status"], "vacant");
}

#[tokio::test]
async fn test_tenant_search_matches_email_or_phone() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    app.signup("ravi@example.com", "tenant", "9123456780").await;
    app.signup("owner2@example.com", "owner", "9123456781").await;

    let by_phone: Value = app
        .server
        .get("/api/owner/tenants/search")
        .add_query_param("q", "912345")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    let tenants = by_phone["tenants"].as_array().unwrap();
    assert_eq!(tenants.len(), 1);
    assert_eq!(tenants[0]["email"], "ravi@example.com");

    // wildcards are matched literally
    let wildcard: Value = app
        .server
        .get("/api/owner/tenants/search")
        .add_query_param("q", "%_%")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert!(wildcard["tenants"].as_array().unwrap().is_empty());

    app.server
        .get("/api/owner/tenants/search")
        .add_query_param("q", "ra")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invitation_and_reminder_links() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let tenant = app.signup("tenant@example.com", "tenant", "+91 98765 43210").await;
    let tenant_id = tenant["user"]["id"].as_i64().unwrap();
    let property_id = app.create_property(&owner, "Lake House", 20000.0).await;

    let assigned: Value = app
        .server
        .post("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"property_id": property_id, "tenant_id": tenant_id}))
        .await
        .json();
    let assignment_id = assigned["assignment"]["id"].as_i64().unwrap();

    let invitation: Value = app
        .server
        .get(&format!("/api/owner/assignments/{assignment_id}/invitation"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    let uri = invitation["sms"]["uri"].as_str().unwrap();
    assert!(uri.starts_with("sms:919876543210?body="));
    assert!(!uri.contains('+'));
    assert!(invitation["sms"]["message"].as_str().unwrap().contains("Lake House"));

    let reminders: Value = app
        .server
        .get("/api/owner/reminders")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(reminders["auto_sms_enabled"], false);
    assert_eq!(reminders["days_before_due"], 3);
    assert_eq!(reminders["reminders"].as_array().unwrap().len(), 1);
    assert_eq!(reminders["reminders"][0]["amount"], 20000.0);
}

#[tokio::test]
async fn test_publish_makes_property_visible_to_tenants() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let (_, tenant) = app.signup_token("tenant@example.com", "tenant").await;
    let property_id = app.create_property(&owner, "Studio", 8000.0).await;

    assert!(browse_listed(&app, &tenant).await["properties"].as_array().unwrap().is_empty());

    app.server
        .post(&format!("/api/owner/properties/{property_id}/list"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .assert_status(StatusCode::OK);
    let listed = browse_listed(&app, &tenant).await;
    assert_eq!(listed["properties"].as_array().unwrap().len(), 1);
    assert_eq!(listed["properties"][0]["owner_name"], "User owner@example.com");

    let contact: Value = app
        .server
        .get(&format!("/api/tenant/properties/{property_id}/contact"))
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .await
        .json();
    assert!(contact["sms"]["uri"].as_str().unwrap().starts_with("sms:9876543210?body="));

    app.server
        .delete(&format!("/api/owner/properties/{property_id}/list"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .assert_status(StatusCode::OK);
    assert!(browse_listed(&app, &tenant).await["properties"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_expenses_feed_finance_summary() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let property_id = app.create_property(&owner, "Corner Shop", 10000.0).await;

    let created = app
        .server
        .post("/api/owner/expenses")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"property_id": property_id, "description": "Plumbing", "amount": 2500.0}))
        .await;
    created.assert_status(StatusCode::CREATED);
    let expense_id = created.json::<Value>()["expense"]["id"].as_i64().unwrap();

    let finance: Value = app
        .server
        .get("/api/owner/finance")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(finance["summary"]["total_income"], 0.0);
    assert_eq!(finance["summary"]["total_expenses"], 2500.0);
    assert_eq!(finance["summary"]["net_income"], -2500.0);
    assert_eq!(finance["transactions"][0]["kind"], "expense");

    app.server
        .delete(&format!("/api/owner/expenses/{expense_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .assert_status(StatusCode::OK);
    let expenses: Value = app
        .server
        .get("/api/owner/expenses")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert!(expenses["expenses"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_settings_round_trip_and_bounds() {
    let app = support::spawn_app().await;
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;

    let defaults: Value = app
        .server
        .get("/api/owner/notification-settings")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(defaults["settings"]["auto_sms_enabled"], false);
    assert_eq!(defaults["settings"]["days_before_due"], 3);

    app.server
        .put("/api/owner/notification-settings")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"auto_sms_enabled": true, "days_before_due": 5}))
        .await
        .assert_status(StatusCode::OK);
    let saved: Value = app
        .server
        .get("/api/owner/notification-settings")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(saved["settings"]["auto_sms_enabled"], true);
    assert_eq!(saved["settings"]["days_before_due"], 5);

    app.server
        .put("/api/owner/notification-settings")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"auto_sms_enabled": true, "days_before_due": 0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
