#![allow(dead_code)]

use {
    axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    },
    http_body_util::BodyExt,
    reg_pay::{
        AppState,
        adapters::{http::router, pelecard::PelecardClient, sumit::SumitClient},
        config::{AppConfig, PelecardConfig, SumitConfig},
        infra::scratch_store::ScratchStore,
    },
    std::{path::Path, sync::Arc},
    tower::util::ServiceExt,
    wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    },
};

pub fn test_config(gateway_url: &str, accounting_url: &str, data_dir: &Path) -> AppConfig {
    AppConfig {
        sumit: SumitConfig {
            company_id: 777,
            api_key: "test-key".into(),
            base_url: accounting_url.trim_end_matches('/').to_string(),
        },
        pelecard: PelecardConfig {
            terminal: "0962210".into(),
            user: "test-user".into(),
            password: "test-pass".into(),
            base_url: gateway_url.trim_end_matches('/').to_string(),
            min_payments: 1,
            max_payments: 12,
        },
        public_base_url: "http://localhost:8080".into(),
        results_url: "https://results.example/payment-result".into(),
        sf_return_url: "https://crm.example/payment-done".into(),
        item_sku: "REG-FEE".into(),
        item_description: "registration fee".into(),
        data_dir: data_dir.to_path_buf(),
        port: 0,
    }
}

pub fn test_state(config: AppConfig) -> AppState {
    let gateway = PelecardClient::new(config.pelecard.clone(), config.public_base_url.clone())
        .expect("gateway client");
    let accounting = SumitClient::new(config.sumit.clone()).expect("accounting client");
    let store = ScratchStore::new(config.data_dir.clone());
    AppState {
        config: Arc::new(config),
        gateway,
        accounting,
        store,
    }
}

pub fn test_app(config: AppConfig) -> Router {
    router(test_state(config))
}

/// Fires one request at the app; returns status, body text, and the
/// Location header if any.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String, Option<String>) {
    let response = app.oneshot(request).await.expect("request failed");
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string(), location)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, content_type: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── Canned external endpoints ───────────────────────────────────────────────

pub async fn mock_init_ok(server: &MockServer, page_url: &str) {
    Mock::given(method("POST"))
        .and(path("/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "URL": page_url,
            "StatusCode": "000",
        })))
        .mount(server)
        .await;
}

pub async fn mock_get_transaction(server: &MockServer, details: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/GetTransaction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "StatusCode": "000",
            "ResultData": details,
        })))
        .mount(server)
        .await;
}

/// Document endpoint that must be hit exactly `expected` times.
pub async fn mock_document_ok(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/accounting/documents/create/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Status": 0,
            "Data": {
                "DocumentID": "12345",
                "DocumentDownloadURL": "https://receipts.example/12345.pdf",
            },
        })))
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mock_customer_update_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/accounting/customers/update/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "Status": 0, "Data": {} })),
        )
        .mount(server)
        .await;
}
