use {
    super::error::BridgeError,
    chrono::{DateTime, Utc},
    derive_more::Display,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
};

/// Registration identifier supplied by the enrollment system. Passed to the
/// gateway as an opaque passthrough key and echoed back in every callback,
/// so it is the correlation key for the whole flow.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegId(String);

impl RegId {
    pub fn new(id: impl Into<String>) -> Result<Self, BridgeError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(BridgeError::Validation("RegID is required".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key used for the scratch-store filename. Anything path-hostile is
    /// replaced so an externally supplied id can never escape the data
    /// directory.
    pub fn file_key(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Per-registration scratch record bridging session initiation and the
/// asynchronous payment confirmation. Customer fields are written when the
/// session opens; amount, receipt URL and the reconciled marker are written
/// once, by the webhook path, after the document is issued.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationContext {
    #[serde(rename = "RegID", skip_serializing_if = "Option::is_none")]
    pub reg_id: Option<String>,

    #[serde(rename = "CustomerName", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(rename = "CustomerEmail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    #[serde(rename = "CustomerPhone", skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,

    #[serde(rename = "CustomerCity", skip_serializing_if = "Option::is_none")]
    pub customer_city: Option<String>,

    #[serde(rename = "CustomerAddress", skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<String>,

    /// Major-unit amount actually charged. Absent until reconciled.
    #[serde(rename = "PaidAmount", skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Decimal>,

    #[serde(rename = "ReceiptURL", skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,

    /// Set exactly once, when the document is issued. A notification that
    /// arrives after this is set is a re-delivery and must not create a
    /// second document.
    #[serde(rename = "ReconciledAt", skip_serializing_if = "Option::is_none")]
    pub reconciled_at: Option<DateTime<Utc>>,

    /// Last reconciliation failure for this registration: the payment was
    /// approved but no document could be issued. Kept on the record so the
    /// state is visible outside the logs.
    #[serde(rename = "LastError", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl RegistrationContext {
    pub fn is_reconciled(&self) -> bool {
        self.reconciled_at.is_some()
    }
}
