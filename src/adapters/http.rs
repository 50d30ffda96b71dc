//! HTTP surface: session initiation, the gateway webhook, the user-facing
//! return leg, and the two synchronous document-creation entry points.

use {
    crate::{
        AppState,
        adapters::{
            pelecard::TransactionId,
            sumit::{CustomerRecord, DocumentRequest, DocumentResult},
        },
        domain::{
            error::BridgeError,
            normalize,
            payment::{PaymentDetails, PaymentMethod},
            registration::{RegId, RegistrationContext},
        },
        services::reconcile,
    },
    axum::{
        Json, Router,
        extract::{DefaultBodyLimit, Query, State},
        http::StatusCode,
        response::{IntoResponse, Redirect, Response},
        routing::{get, post},
    },
    rust_decimal::Decimal,
    serde::Deserialize,
    serde_json::{Value, json},
    std::time::Duration,
    tower_http::timeout::TimeoutLayer,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(init_session))
        .route("/pelecard-callback", post(pelecard_callback))
        .route("/callback", get(payment_callback))
        .route("/summit", post(create_document_direct))
        .route("/summit-from-sf", get(create_document_from_crm))
        .layer(DefaultBodyLimit::max(64 * 1024)) // gateway payloads are tiny
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}

// ── Error mapping ───────────────────────────────────────────────────────────

/// Newtype over the domain error so the HTTP response mapping lives in the
/// adapter layer.
pub struct ApiError(pub BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            BridgeError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            BridgeError::Gateway(msg) => {
                tracing::error!("gateway error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "gateway_error",
                    msg.clone(),
                )
            }
            BridgeError::Accounting(msg) => {
                tracing::error!("accounting error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "accounting_error",
                    msg.clone(),
                )
            }
            BridgeError::Storage(err) => {
                tracing::error!("storage error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            BridgeError::Http(err) => {
                tracing::error!("outbound http error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            BridgeError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

// ── Session initiation ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InitQuery {
    #[serde(rename = "RegID")]
    reg_id: Option<String>,
    #[serde(rename = "CustomerName")]
    customer_name: Option<String>,
    #[serde(rename = "CustomerEmail")]
    customer_email: Option<String>,
}

/// Writes the initial scratch record, then hands the customer to the
/// gateway-hosted payment page. A gateway refusal surfaces its raw response
/// body so the operator sees exactly what the gateway said.
pub async fn init_session(
    State(state): State<AppState>,
    Query(query): Query<InitQuery>,
) -> Response {
    let reg_id = match RegId::new(query.reg_id.unwrap_or_default()) {
        Ok(id) => id,
        Err(e) => return ApiError(e).into_response(),
    };

    let record = RegistrationContext {
        reg_id: Some(reg_id.as_str().to_string()),
        customer_name: query.customer_name,
        customer_email: query.customer_email,
        ..Default::default()
    };
    state.store.put(&reg_id, &record).await;

    match state.gateway.init_session(&reg_id).await {
        Ok(url) => {
            tracing::info!(reg_id = %reg_id, "payment session opened");
            Redirect::to(&url).into_response()
        }
        Err(BridgeError::Gateway(body)) => {
            tracing::error!(reg_id = %reg_id, "gateway refused to open a session");
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}

// ── Gateway webhook ─────────────────────────────────────────────────────────

/// Webhooks are always acknowledged with 200, because the gateway treats
/// anything else as "retry". Outcomes go to the log only.
pub async fn pelecard_callback(State(state): State<AppState>, body: String) -> &'static str {
    let outcome = reconcile::reconcile(&state, &body).await;
    tracing::debug!(?outcome, "payment notification handled");
    "OK"
}

// ── User-facing return leg ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "RegID")]
    reg_id: Option<String>,
    #[serde(rename = "PelecardTransactionId")]
    transaction_id: Option<String>,
}

/// Reads whatever the webhook has written so far. When the webhook has not
/// landed yet, falls back to a gateway lookup purely to show the customer
/// an amount. Document creation stays the webhook's job.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let reg_id_raw = query.reg_id.unwrap_or_default();
    let status = query.status.unwrap_or_default();
    let mut total = String::new();
    let mut receipt_url = String::new();

    if let Ok(reg_id) = RegId::new(reg_id_raw.clone()) {
        let record = state.store.get(&reg_id).await;
        if let Some(amount) = record.paid_amount {
            total = format!("{amount:.2}");
        } else if let Some(tid) = query
            .transaction_id
            .and_then(|t| TransactionId::new(t).ok())
        {
            if let Some(details) = state.gateway.fetch_transaction(&tid).await {
                let minor = normalize::amount_minor_units(&details);
                if minor > 0 {
                    total = format!("{:.2}", Decimal::new(minor, 2));
                }
            }
        }
        receipt_url = record.receipt_url.unwrap_or_default();
    }

    let params = serde_urlencoded::to_string([
        ("RegID", reg_id_raw.as_str()),
        ("Status", status.as_str()),
        ("Total", total.as_str()),
        ("ReceiptURL", receipt_url.as_str()),
    ])
    .unwrap_or_default();
    Redirect::to(&format!("{}?{params}", state.config.results_url))
}

// ── Direct document creation ────────────────────────────────────────────────

/// Fields shared by the two synchronous entry points. Amount-like values
/// arrive as strings or numbers depending on the caller, so everything is
/// normalized from text.
#[derive(Debug, Default)]
struct DirectFields {
    external_id: Option<String>,
    person_id: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    city: Option<String>,
    address: Option<String>,
    amount: Option<String>,
    sku: Option<String>,
    payment_method: Option<String>,
    last4: Option<String>,
    payments: Option<String>,
    bank: Option<String>,
    branch: Option<String>,
    account: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

async fn issue_document(
    state: &AppState,
    fields: DirectFields,
) -> Result<DocumentResult, BridgeError> {
    let sku = non_empty(fields.sku)
        .ok_or_else(|| BridgeError::Validation("sku is required".into()))?;
    let external_id = non_empty(fields.external_id).ok_or_else(|| {
        BridgeError::Validation("customerexternalidentifier is required".into())
    })?;
    let amount = normalize::amount(fields.amount.as_deref())?;
    let method = PaymentMethod::parse(fields.payment_method.as_deref())?;

    let payment = match method {
        PaymentMethod::Cash => PaymentDetails::Cash,
        PaymentMethod::Credit => PaymentDetails::CreditCard {
            last4: non_empty(fields.last4).unwrap_or_default(),
            installments: normalize::payment_count(fields.payments.as_deref()),
        },
        PaymentMethod::Bank => PaymentDetails::BankTransfer {
            bank: non_empty(fields.bank).unwrap_or_default(),
            branch: non_empty(fields.branch).unwrap_or_default(),
            account: non_empty(fields.account).unwrap_or_default(),
        },
    };

    let customer = CustomerRecord {
        external_id,
        person_id: non_empty(fields.person_id),
        name: non_empty(fields.name).unwrap_or_else(|| "Client".to_string()),
        phone: fields.phone,
        email: non_empty(fields.email),
        city: non_empty(fields.city),
        address: non_empty(fields.address),
    };

    let upsert = state.accounting.upsert_customer(&customer).await;
    tracing::debug!(external_id = %customer.external_id, ?upsert, "customer upsert");

    state
        .accounting
        .create_document(&DocumentRequest {
            customer,
            sku,
            description: state.config.item_description.clone(),
            amount,
            payment,
        })
        .await
}

fn text_field(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// JSON entry point used by the registration system directly, bypassing the
/// gateway webhook. Callers send amounts and ids as strings or numbers
/// interchangeably.
#[derive(Debug, Deserialize)]
pub struct SummitBody {
    #[serde(rename = "customerExternalIdentifier", alias = "customerexternalidentifier")]
    customer_external_identifier: Option<Value>,
    #[serde(rename = "personId", alias = "personid")]
    person_id: Option<Value>,
    #[serde(rename = "customerName", alias = "CustomerName")]
    customer_name: Option<String>,
    #[serde(rename = "customerPhone")]
    customer_phone: Option<Value>,
    #[serde(rename = "customerEmail")]
    customer_email: Option<String>,
    city: Option<String>,
    address: Option<String>,
    amount: Option<Value>,
    sku: Option<Value>,
    #[serde(rename = "paymentMethod")]
    payment_method: Option<String>,
    last4: Option<Value>,
    payments: Option<Value>,
    bank: Option<Value>,
    branch: Option<Value>,
    account: Option<Value>,
}

pub async fn create_document_direct(
    State(state): State<AppState>,
    Json(body): Json<SummitBody>,
) -> Response {
    let fields = DirectFields {
        external_id: text_field(&body.customer_external_identifier),
        person_id: text_field(&body.person_id),
        name: body.customer_name,
        phone: text_field(&body.customer_phone),
        email: body.customer_email,
        city: body.city,
        address: body.address,
        amount: text_field(&body.amount),
        sku: text_field(&body.sku),
        payment_method: body.payment_method,
        last4: text_field(&body.last4),
        payments: text_field(&body.payments),
        bank: text_field(&body.bank),
        branch: text_field(&body.branch),
        account: text_field(&body.account),
    };

    match issue_document(&state, fields).await {
        Ok(result) => Json(json!({
            "ok": true,
            "documentId": result.document_id,
            "receiptUrl": result.receipt_url,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "direct document creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.user_message() })),
            )
                .into_response()
        }
    }
}

// ── CRM entry point ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SfQuery {
    #[serde(rename = "paymentId")]
    payment_id: Option<String>,
    #[serde(rename = "familyid")]
    family_id: Option<String>,
    #[serde(rename = "personid")]
    person_id: Option<String>,
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    city: Option<String>,
    address: Option<String>,
    amount: Option<String>,
    sku: Option<String>,
    #[serde(rename = "paymentMethod")]
    payment_method: Option<String>,
    last4: Option<String>,
    payments: Option<String>,
    bank: Option<String>,
    branch: Option<String>,
    account: Option<String>,
}

/// Synchronous entry point behind a CRM button: everything arrives as query
/// parameters and the browser ends up back on the CRM with the receipt.
/// Validation failures come back as plain text so the operator sees them.
pub async fn create_document_from_crm(
    State(state): State<AppState>,
    Query(query): Query<SfQuery>,
) -> Response {
    match crm_flow(&state, query).await {
        Ok((record_id, receipt_url)) => {
            let params = serde_urlencoded::to_string([
                ("recordId", record_id.as_str()),
                ("receiptUrl", receipt_url.as_str()),
            ])
            .unwrap_or_default();
            Redirect::to(&format!("{}?{params}", state.config.sf_return_url)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "CRM document creation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.user_message()).into_response()
        }
    }
}

async fn crm_flow(state: &AppState, query: SfQuery) -> Result<(String, String), BridgeError> {
    let record_id = non_empty(query.payment_id)
        .ok_or_else(|| BridgeError::Validation("paymentId is required".into()))?;
    let family_id = non_empty(query.family_id)
        .ok_or_else(|| BridgeError::Validation("familyid is required".into()))?;
    let phone = normalize::phone(query.phone.as_deref())?;

    let result = issue_document(
        state,
        DirectFields {
            external_id: Some(family_id),
            person_id: query.person_id,
            name: query.name,
            phone: Some(phone),
            email: query.email,
            city: query.city,
            address: query.address,
            amount: query.amount,
            sku: query.sku,
            payment_method: query.payment_method,
            last4: query.last4,
            payments: query.payments,
            bank: query.bank,
            branch: query.branch,
            account: query.account,
        },
    )
    .await?;

    Ok((record_id, result.receipt_url))
}
