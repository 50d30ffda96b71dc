//! Sumit accounting API: customer upsert and invoice/receipt creation.
//! Every endpoint wraps its payload in the same envelope, unwrapped in one
//! place here.

use {
    crate::{
        config::SumitConfig,
        domain::{error::BridgeError, money::Amount, payment::PaymentDetails},
    },
    chrono::Utc,
    serde_json::{Value, json},
    std::time::Duration,
};

/// Customer identity as the accounting API's customer endpoints accept it.
/// The external identifier is the stable correlation key (a family or
/// person id on the registration side).
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub external_id: String,
    pub person_id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DocumentRequest {
    pub customer: CustomerRecord,
    pub sku: String,
    pub description: String,
    pub amount: Amount,
    pub payment: PaymentDetails,
}

#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub document_id: String,
    pub receipt_url: String,
}

/// What happened to a best-effort customer upsert. `Failed` is logged and
/// swallowed by the client, since a document can still be issued against
/// the external identifier alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Updated,
    Created,
    Failed,
}

#[derive(Clone)]
pub struct SumitClient {
    http: reqwest::Client,
    config: SumitConfig,
}

impl SumitClient {
    pub fn new(config: SumitConfig) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, config })
    }

    fn credentials(&self) -> Value {
        json!({
            "CompanyID": self.config.company_id,
            "APIKey": self.config.api_key,
        })
    }

    async fn call(&self, path: &str, payload: &Value) -> Result<Value, BridgeError> {
        let response: Value = self
            .http
            .post(format!("{}{path}", self.config.base_url))
            .json(payload)
            .send()
            .await?
            .json()
            .await?;
        unwrap_envelope(response)
    }

    /// Update-then-create, keyed by the external identifier. Updating first
    /// keeps the customer ledger free of duplicates at the cost of one extra
    /// round trip on first contact. Both legs failing degrades to `Failed`
    /// without propagating; document creation does not depend on it.
    pub async fn upsert_customer(&self, customer: &CustomerRecord) -> UpsertOutcome {
        let payload = json!({
            "Credentials": self.credentials(),
            "Customer": customer_payload(customer),
        });

        match self.call("/accounting/customers/update/", &payload).await {
            Ok(_) => UpsertOutcome::Updated,
            Err(update_err) => {
                tracing::debug!(
                    external_id = %customer.external_id,
                    error = %update_err,
                    "customer update missed, creating"
                );
                match self.call("/accounting/customers/create/", &payload).await {
                    Ok(_) => UpsertOutcome::Created,
                    Err(create_err) => {
                        tracing::warn!(
                            external_id = %customer.external_id,
                            update_error = %update_err,
                            create_error = %create_err,
                            "customer upsert failed, issuing document without it"
                        );
                        UpsertOutcome::Failed
                    }
                }
            }
        }
    }

    pub async fn create_document(
        &self,
        request: &DocumentRequest,
    ) -> Result<DocumentResult, BridgeError> {
        let payload = document_payload(request, self.credentials());
        let data = self.call("/accounting/documents/create/", &payload).await?;

        let document_id = match data.get("DocumentID") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(BridgeError::Accounting("document creation failed".into()));
            }
        };
        let receipt_url = data
            .get("DocumentDownloadURL")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(DocumentResult {
            document_id,
            receipt_url,
        })
    }
}

/// Shared envelope: a numeric `Status`, optional error text, and the
/// payload under `Data`. Non-zero status carries the user-facing message
/// when the API supplied one.
fn unwrap_envelope(response: Value) -> Result<Value, BridgeError> {
    match response.get("Status").and_then(Value::as_i64) {
        None => Err(BridgeError::Accounting(
            "Invalid response from Summit".into(),
        )),
        Some(0) => Ok(response.get("Data").cloned().unwrap_or_else(|| json!({}))),
        Some(_) => {
            let message = response
                .get("UserErrorMessage")
                .and_then(Value::as_str)
                .or_else(|| response.get("TechnicalErrorDetails").and_then(Value::as_str))
                .unwrap_or("Summit returned an error");
            Err(BridgeError::Accounting(message.to_string()))
        }
    }
}

/// The API expects an uninterrupted id number.
fn strip_spaces(id: &str) -> String {
    id.split_whitespace().collect()
}

fn customer_payload(customer: &CustomerRecord) -> Value {
    json!({
        "ExternalIdentifier": customer.external_id,
        "CompanyNumber": customer.person_id.as_deref().map(strip_spaces),
        "Name": customer.name,
        "Phone": customer.phone,
        "EmailAddress": customer.email,
        "City": customer.city,
        "Address": customer.address,
        "SearchMode": 2,
    })
}

fn payment_payload(amount: Amount, payment: &PaymentDetails) -> Value {
    let mut block = json!({
        "Amount": amount.major(),
        "Type": payment.method().type_code(),
    });
    match payment {
        PaymentDetails::Cash => {}
        PaymentDetails::CreditCard {
            last4,
            installments,
        } => {
            block["Details_CreditCard"] = json!({
                "Last4Digits": last4,
                "Payments": installments,
            });
        }
        PaymentDetails::BankTransfer {
            bank,
            branch,
            account,
        } => {
            block["Details_BankTransfer"] = json!({
                "Bank": bank,
                "Branch": branch,
                "Account": account,
            });
        }
    }
    block
}

fn document_payload(request: &DocumentRequest, credentials: Value) -> Value {
    json!({
        "Details": {
            "Type": 1, // invoice-and-receipt
            "Date": Utc::now().to_rfc3339(),
            "Original": true,
            "IsDraft": false,
            "Customer": customer_payload(&request.customer),
        },
        "Items": [{
            "Quantity": 1,
            "UnitPrice": request.amount.major(),
            "Item": {
                "SKU": request.sku,
                "SearchMode": 4,
                "Description": request.description,
            },
        }],
        "Payments": [payment_payload(request.amount, &request.payment)],
        "VATIncluded": true,
        "Credentials": credentials,
    })
}
