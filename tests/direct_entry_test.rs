mod common;

use {
    common::*,
    axum::http::StatusCode,
    serde_json::json,
    wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    },
};

async fn servers() -> (MockServer, MockServer, tempfile::TempDir) {
    (
        MockServer::start().await,
        MockServer::start().await,
        tempfile::tempdir().unwrap(),
    )
}

// ── POST /summit ────────────────────────────────────────────────────────────

#[tokio::test]
async fn summit_creates_a_document_and_returns_its_handle() {
    let (gateway, accounting, dir) = servers().await;
    mock_customer_update_ok(&accounting).await;
    Mock::given(method("POST"))
        .and(path("/accounting/documents/create/"))
        .and(body_partial_json(json!({
            "Details": { "Customer": { "ExternalIdentifier": "FAM-1", "CompanyNumber": "01234567" } },
            "Payments": [{ "Amount": 1250.5, "Type": 5 }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Data": { "DocumentID": "D-1", "DocumentDownloadURL": "https://r.example/D-1" },
        })))
        .expect(1)
        .mount(&accounting)
        .await;

    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));
    let (status, body, _) = send(
        app,
        post_json(
            "/summit",
            json!({
                "customerexternalidentifier": "FAM-1",
                "personid": "0 1234 567",
                "customerName": "Jane",
                "amount": "₪1,250.50",
                "sku": "REG-FEE",
                "last4": "4580",
                "payments": 2,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["ok"], true);
    assert_eq!(parsed["documentId"], "D-1");
    assert_eq!(parsed["receiptUrl"], "https://r.example/D-1");
}

#[tokio::test]
async fn summit_accepts_numeric_ids_and_amounts() {
    let (gateway, accounting, dir) = servers().await;
    Mock::given(method("POST"))
        .and(path("/accounting/documents/create/"))
        .and(body_partial_json(json!({ "Payments": [{ "Amount": 150.0 }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Data": { "DocumentID": 7, "DocumentDownloadURL": "https://r.example/7" },
        })))
        .mount(&accounting)
        .await;

    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));
    let (status, body, _) = send(
        app,
        post_json(
            "/summit",
            json!({
                "customerexternalidentifier": 1001,
                "amount": 150,
                "sku": 42,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn summit_rejects_missing_fields_with_a_json_error() {
    let (gateway, accounting, dir) = servers().await;
    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));

    let (status, body, _) = send(
        app.clone(),
        post_json("/summit", json!({ "customerexternalidentifier": "F", "amount": "100" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["ok"], false);
    assert_eq!(parsed["error"], "sku is required");

    let (status, body, _) = send(
        app.clone(),
        post_json("/summit", json!({ "amount": "100", "sku": "S" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["error"], "customerexternalidentifier is required");

    let (status, body, _) = send(
        app,
        post_json(
            "/summit",
            json!({ "customerexternalidentifier": "F", "sku": "S", "amount": "0" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["error"], "amount invalid");
}

#[tokio::test]
async fn summit_surfaces_accounting_rejections() {
    let (gateway, accounting, dir) = servers().await;
    Mock::given(method("POST"))
        .and(path("/accounting/documents/create/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 1,
            "UserErrorMessage": "invalid credentials",
        })))
        .mount(&accounting)
        .await;

    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));
    let (status, body, _) = send(
        app,
        post_json(
            "/summit",
            json!({ "customerexternalidentifier": "F", "sku": "S", "amount": "100" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["error"], "invalid credentials");
}

// ── GET /summit-from-sf ─────────────────────────────────────────────────────

fn sf_uri(overrides: &[(&str, &str)]) -> String {
    let mut params = vec![
        ("paymentId", "P-1"),
        ("familyid", "FAM-1"),
        ("personid", "123456"),
        ("name", "Jane"),
        ("phone", "052-1234567"),
        ("email", "j@x.com"),
        ("amount", "150"),
        ("sku", "REG-FEE"),
    ];
    for (key, value) in overrides {
        params.retain(|(k, _)| k != key);
        if !value.is_empty() {
            params.push((key, value));
        }
    }
    format!(
        "/summit-from-sf?{}",
        serde_urlencoded::to_string(&params).unwrap()
    )
}

#[tokio::test]
async fn crm_entry_redirects_back_with_the_receipt() {
    let (gateway, accounting, dir) = servers().await;
    mock_customer_update_ok(&accounting).await;
    Mock::given(method("POST"))
        .and(path("/accounting/documents/create/"))
        .and(body_partial_json(json!({
            "Details": { "Customer": { "ExternalIdentifier": "FAM-1", "Phone": "0521234567" } },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Data": { "DocumentID": "D-5", "DocumentDownloadURL": "https://r.example/D-5" },
        })))
        .expect(1)
        .mount(&accounting)
        .await;

    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));
    let (status, _, location) = send(app, get(&sf_uri(&[]))).await;

    assert!(status.is_redirection(), "got {status}");
    let location = location.expect("redirect location");
    assert!(location.starts_with("https://crm.example/payment-done?"));
    assert!(location.contains("recordId=P-1"));
    assert!(location.contains("receiptUrl=https%3A%2F%2Fr.example%2FD-5"));
}

#[tokio::test]
async fn crm_entry_missing_sku_is_a_plain_500() {
    let (gateway, accounting, dir) = servers().await;
    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));

    let (status, body, _) = send(app, get(&sf_uri(&[("sku", "")]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "sku is required");
}

#[tokio::test]
async fn crm_entry_validates_its_required_ids() {
    let (gateway, accounting, dir) = servers().await;
    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));

    let (status, body, _) = send(app.clone(), get(&sf_uri(&[("paymentId", "")]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "paymentId is required");

    let (status, body, _) = send(app.clone(), get(&sf_uri(&[("familyid", "")]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "familyid is required");

    let (status, body, _) = send(app, get(&sf_uri(&[("phone", "")]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "phone required");
}

#[tokio::test]
async fn crm_entry_rejects_unknown_payment_methods() {
    let (gateway, accounting, dir) = servers().await;
    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));

    let (status, body, _) = send(
        app,
        get(&sf_uri(&[("paymentMethod", "שיק")])),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unsupported payment method");
}

#[tokio::test]
async fn crm_entry_builds_bank_transfer_payments() {
    let (gateway, accounting, dir) = servers().await;
    Mock::given(method("POST"))
        .and(path("/accounting/documents/create/"))
        .and(body_partial_json(json!({
            "Payments": [{
                "Amount": 150.0,
                "Type": 4,
                "Details_BankTransfer": { "Bank": "20", "Branch": "459", "Account": "1234" },
            }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Data": { "DocumentID": "D-8", "DocumentDownloadURL": "https://r.example/D-8" },
        })))
        .expect(1)
        .mount(&accounting)
        .await;

    let app = test_app(test_config(&gateway.uri(), &accounting.uri(), dir.path()));
    let uri = sf_uri(&[
        ("paymentMethod", "העברה בנקאית"),
        ("bank", "20"),
        ("branch", "459"),
        ("account", "1234"),
    ]);
    let (status, body, _) = send(app, get(&uri)).await;
    assert!(status.is_redirection(), "got {status}: {body}");
}
