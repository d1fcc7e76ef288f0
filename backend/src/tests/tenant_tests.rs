use axum::http::StatusCode;
use axum::http::header;
use axum_test::multipart::{MultipartForm, Part};
use chrono::Local;
use serde_json::Value;
use serde_json::json;

use crate::db::{self, NewPayment, PaymentMethod, PaymentStatus};
use crate::services::payments;
use crate::tests::support::{self, TestApp};

/// Owner with one property assigned to a fresh tenant. Returns both tokens
/// and the property id.
async fn rented_property(app: &TestApp, rent_amount: f64) -> (String, String, i64) {
    let (_, owner) = app.signup_token("owner@example.com", "owner").await;
    let (tenant_id, tenant) = app.signup_token("tenant@example.com", "tenant").await;
    let property_id = app.create_property(&owner, "Hill Top 1BHK", rent_amount).await;
    app.server
        .post("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .json(&json!({"property_id": property_id, "tenant_id": tenant_id, "move_in_date": "2025-01-05"}))
        .await
        .assert_status(StatusCode::CREATED);
    (owner, tenant, property_id)
}

async fn receipts(app: &TestApp, token: &str) -> Vec<Value> {
    let body: Value = app
        .server
        .get("/api/tenant/receipts")
        .add_header(header::AUTHORIZATION, format!("Bearer {token}"))
        .await
        .json();
    body["receipts"].as_array().unwrap().clone()
}

#[tokio::test]
async fn test_payment_is_completed_and_listed_as_receipt() {
    let app = support::spawn_app().await;
    let (owner, tenant, property_id) = rented_property(&app, 12000.0).await;

    // warm the receipt cache so the payment has to invalidate it
    assert!(receipts(&app, &tenant).await.is_empty());

    // no month given, so this pays the current one
    let response = app
        .server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .json(&json!({"method": "UPI"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let payment = &body["payment"];
    assert_eq!(payment["status"], "completed");
    assert_eq!(payment["amount"], 12000.0);
    assert_eq!(payment["method"], "upi");
    let receipt_id = payment["receipt_id"].as_str().unwrap().to_string();
    assert!(receipt_id.starts_with(&Local::now().format("RCPT-%Y%m-").to_string()));

    let listed = receipts(&app, &tenant).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["receipt_id"], receipt_id.as_str());
    assert_eq!(listed[0]["property_name"], "Hill Top 1BHK");

    // the owner sees the rent as paid and the income in the summary
    let assigned: Value = app
        .server
        .get("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(assigned["tenants"][0]["property_id"], property_id);
    assert_eq!(assigned["tenants"][0]["rent_status"], "paid");

    let finance: Value = app
        .server
        .get("/api/owner/finance")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(finance["summary"]["total_income"], 12000.0);
    assert_eq!(finance["summary"]["net_income"], 12000.0);
}

#[tokio::test]
async fn test_paying_one_month_leaves_later_months_unpaid() {
    let app = support::spawn_app().await;
    let (owner, tenant, _) = rented_property(&app, 7000.0).await;

    app.server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .json(&json!({"method": "card", "month": 1, "year": 2025}))
        .await
        .assert_status(StatusCode::CREATED);

    let report = |month: u32| {
        app.server
            .get("/api/owner/reports")
            .add_query_param("month", month)
            .add_query_param("year", 2025)
            .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
    };
    let january: Value = report(1).await.json();
    assert_eq!(january["report"]["paid_tenants"], 1);
    assert_eq!(january["report"]["income"], 7000.0);

    let june: Value = report(6).await.json();
    assert_eq!(june["report"]["paid_tenants"], 0);
    assert_eq!(june["report"]["total_tenants"], 1);
    assert!(!june.to_string().contains("-0.0"));

    let reminders: Value = app
        .server
        .get("/api/owner/reminders")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(reminders["reminders"].as_array().unwrap().len(), 1);

    let assigned: Value = app
        .server
        .get("/api/owner/assignments")
        .add_header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .await
        .json();
    assert_eq!(assigned["tenants"][0]["rent_status"], "pending");

    let admin = app.admin_token().await;
    let platform: Value = app
        .server
        .get("/api/admin/reports")
        .add_header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .await
        .json();
    assert_eq!(platform["report"]["total_pending_rent"], 7000.0);
    assert_eq!(platform["report"]["total_paid_rent"], 7000.0);
}

#[tokio::test]
async fn test_taken_receipt_id_is_redrawn() {
    let app = support::spawn_app().await;
    let (_, tenant, _) = rented_property(&app, 4000.0).await;

    let first: Value = app
        .server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .json(&json!({"method": "upi", "month": 2, "year": 2025}))
        .await
        .json();
    let taken = first["payment"]["receipt_id"].as_str().unwrap().to_string();

    let tenant_id = db::get_user_by_email(&app.context.db, "tenant@example.com").await.unwrap().id;
    let assignment = db::list_assignments_for_tenant(&app.context.db, tenant_id).await.unwrap().remove(0);
    let new_payment = NewPayment {
        tenant_id,
        assignment_id: assignment.id,
        property_id: assignment.property_id,
        amount: 4000.0,
        method: PaymentMethod::Card,
        status: PaymentStatus::Completed,
        receipt_id: String::new(),
        month: 3,
        year: 2025,
    };
    let mut candidates = [taken, "RCPT-202503-FRESH001".to_string()].into_iter();

    let mut conn = app.context.db.acquire().await.unwrap();
    let payment = payments::insert_with_unique_receipt(&mut conn, new_payment, || candidates.next().unwrap())
        .await
        .unwrap();
    drop(conn);
    assert_eq!(payment.receipt_id, "RCPT-202503-FRESH001");
    assert_eq!(receipts(&app, &tenant).await.len(), 2);
}

#[tokio::test]
async fn test_each_payment_gets_its_own_receipt_id() {
    let app = support::spawn_app().await;
    let (_, tenant, _) = rented_property(&app, 8000.0).await;

    for method in ["UPI", "card", "Net Banking"] {
        app.server
            .post("/api/tenant/payments")
            .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
            .json(&json!({"method": method, "amount": 2000.0, "month": 4, "year": 2025}))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let listed = receipts(&app, &tenant).await;
    assert_eq!(listed.len(), 3);
    let mut ids: Vec<&str> = listed.iter().map(|r| r["receipt_id"].as_str().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_payment_validation() {
    let app = support::spawn_app().await;
    let (_, tenant) = app.signup_token("lonely@example.com", "tenant").await;

    // no rental yet
    app.server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .json(&json!({"method": "card"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let (_, renter, _) = rented_property(&app, 5000.0).await;
    app.server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {renter}"))
        .json(&json!({"method": "card", "amount": 0.0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {renter}"))
        .json(&json!({"method": "card", "month": 13}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {renter}"))
        .json(&json!({"method": "cash"}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(receipts(&app, &renter).await.is_empty());
}

#[tokio::test]
async fn test_agreement_and_schedule() {
    let app = support::spawn_app().await;
    let (_, tenant, property_id) = rented_property(&app, 9500.0).await;

    let agreement: Value = app
        .server
        .get("/api/tenant/agreement")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .await
        .json();
    let agreements = agreement["agreements"].as_array().unwrap();
    assert_eq!(agreements.len(), 1);
    assert_eq!(agreements[0]["property_id"], property_id);
    assert_eq!(agreements[0]["owner_email"], "owner@example.com");
    assert_eq!(agreements[0]["move_in_date"], "2025-01-05");

    app.server
        .post("/api/tenant/payments")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .json(&json!({"method": "card", "month": 1, "year": 2025}))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = app
        .server
        .get("/api/tenant/schedule")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .await
        .json();
    let installments = body["schedules"][0]["schedule"]["installments"].as_array().unwrap();
    let first_month = installments.last().unwrap();
    assert_eq!(first_month["due_date"], "2025-01-05");
    assert_eq!(first_month["status"], "paid");
    assert!(first_month["receipt_id"].as_str().unwrap().starts_with("RCPT-202501-"));
}

#[tokio::test]
async fn test_documents_upload_list_and_delete() {
    let app = support::spawn_app().await;
    let (_, tenant) = app.signup_token("tenant@example.com", "tenant").await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0_u8; 2048]).file_name("lease.pdf").mime_type("application/pdf"),
    );
    let response = app
        .server
        .post("/api/tenant/documents")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["document"]["name"], "lease.pdf");
    assert_eq!(body["document"]["file_type"], "PDF");
    assert_eq!(body["document"]["file_size"], "2.0 KB");
    let document_id = body["document"]["id"].as_i64().unwrap();

    let listed: Value = app
        .server
        .get("/api/tenant/documents")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .await
        .json();
    assert_eq!(listed["documents"].as_array().unwrap().len(), 1);

    app.server
        .delete(&format!("/api/tenant/documents/{document_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .await
        .assert_status(StatusCode::OK);
    let listed: Value = app
        .server
        .get("/api/tenant/documents")
        .add_header(header::AUTHORIZATION, format!("Bearer {tenant}"))
        .await
        .json();
    assert!(listed["documents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_tenant_cannot_delete_anothers_document() {
    let app = support::spawn_app().await;
    let (_, first) = app.signup_token("first@example.com", "tenant").await;
    let (_, second) = app.signup_token("second@example.com", "tenant").await;

    let form = MultipartForm::new().add_part("file", Part::bytes(b"hello".to_vec()).file_name("id.txt"));
    let body: Value = app
        .server
        .post("/api/tenant/documents")
        .add_header(header::AUTHORIZATION, format!("Bearer {first}"))
        .multipart(form)
        .await
        .json();
    let document_id = body["document"]["id"].as_i64().unwrap();

    app.server
        .delete(&format!("/api/tenant/documents/{document_id}"))
        .add_header(header::AUTHORIZATION, format!("Bearer {second}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
