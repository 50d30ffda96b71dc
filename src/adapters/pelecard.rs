//! Pelecard gateway: hosted-session initiation, transaction lookup, and the
//! parsing of whatever shape the payment notification arrives in.

use {
    crate::{
        config::PelecardConfig,
        domain::{error::BridgeError, registration::RegId},
    },
    derive_more::Display,
    serde_json::{Value, json},
    std::{collections::HashMap, time::Duration},
};

/// Gateway-side transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Result<Self, BridgeError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(BridgeError::Validation("transaction id is required".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct PelecardClient {
    http: reqwest::Client,
    config: PelecardConfig,
    public_base_url: String,
}

impl PelecardClient {
    pub fn new(config: PelecardConfig, public_base_url: String) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            config,
            public_base_url,
        })
    }

    fn callback_url(&self, path: &str, reg_id: &RegId) -> String {
        let query = serde_urlencoded::to_string([("RegID", reg_id.as_str())]).unwrap_or_default();
        format!("{}{path}?{query}", self.public_base_url)
    }

    /// Opens a hosted payment session and returns the page URL to send the
    /// customer to. The gateway answering without a URL is a hard failure;
    /// the raw response body rides along for the caller to surface.
    pub async fn init_session(&self, reg_id: &RegId) -> Result<String, BridgeError> {
        let request = json!({
            "terminal": self.config.terminal,
            "user": self.config.user,
            "password": self.config.password,
            "ActionType": "J4",
            "Currency": "1",
            "FreeTotal": "True",
            "MinPayments": self.config.min_payments.to_string(),
            "MaxPayments": self.config.max_payments.to_string(),
            "GoodURL": self.callback_url("/callback", reg_id),
            "ErrorURL": self.callback_url("/callback", reg_id),
            "ServerSideGoodFeedbackURL": self.callback_url("/pelecard-callback", reg_id),
            "ParamX": reg_id.as_str(),
        });

        let response = self
            .http
            .post(format!("{}/init", self.config.base_url))
            .json(&request)
            .send()
            .await?;
        let body = response.text().await?;

        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        match parsed.get("URL").and_then(Value::as_str) {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(BridgeError::Gateway(body)),
        }
    }

    /// Best-effort transaction lookup. Any transport or shape problem yields
    /// `None`; callers then fall back to whatever the push payload carried.
    pub async fn fetch_transaction(&self, id: &TransactionId) -> Option<Value> {
        let request = json!({
            "terminal": self.config.terminal,
            "user": self.config.user,
            "password": self.config.password,
            "TransactionId": id.as_str(),
        });

        let response = match self
            .http
            .post(format!("{}/GetTransaction", self.config.base_url))
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(transaction_id = %id, error = %e, "transaction lookup failed");
                return None;
            }
        };

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(transaction_id = %id, error = %e, "transaction lookup returned garbage");
                return None;
            }
        };

        let data = details(&body);
        if data.is_object() {
            Some(data.clone())
        } else {
            tracing::warn!(transaction_id = %id, "transaction lookup returned no result data");
            None
        }
    }
}

// ── Notification payload shapes ─────────────────────────────────────────────

/// The gateway delivers the webhook body as a JSON document, as flat form
/// fields, or as a form field whose value is itself a JSON document.
/// Strategies run in that order; the first that yields an object wins.
pub fn parse_notification(body: &str) -> Option<Value> {
    const STRATEGIES: &[fn(&str) -> Option<Value>] =
        &[parse_json, parse_json_in_form, parse_form];
    STRATEGIES.iter().find_map(|parse| parse(body))
}

fn parse_json(body: &str) -> Option<Value> {
    serde_json::from_str::<Value>(body)
        .ok()
        .filter(|v| v.is_object())
}

fn parse_json_in_form(body: &str) -> Option<Value> {
    let fields: HashMap<String, String> = serde_urlencoded::from_str(body).ok()?;
    fields
        .into_values()
        .find_map(|v| serde_json::from_str::<Value>(&v).ok().filter(|v| v.is_object()))
}

fn parse_form(body: &str) -> Option<Value> {
    let fields: HashMap<String, String> = serde_urlencoded::from_str(body).ok()?;
    if fields.is_empty() {
        return None;
    }
    Some(Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    ))
}

/// Transaction fields live either at the top level or under a `ResultData`
/// envelope, depending on which leg of the gateway produced the payload.
pub fn details(payload: &Value) -> &Value {
    match payload.get("ResultData") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    }
}

const TRANSACTION_ID_FIELDS: &[&str] = &["TransactionId", "PelecardTransactionId"];
const REG_ID_FIELDS: &[&str] = &["ParamX", "RegID", "UserKey"];

fn first_text(payload: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match payload.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn extract_transaction_id(payload: &Value) -> Option<TransactionId> {
    first_text(payload, TRANSACTION_ID_FIELDS).and_then(|s| TransactionId::new(s).ok())
}

pub fn extract_reg_id(payload: &Value) -> Option<RegId> {
    first_text(payload, REG_ID_FIELDS).and_then(|s| RegId::new(s).ok())
}

/// Last four digits of the masked card number the gateway reports.
pub fn extract_last4(payload: &Value) -> Option<String> {
    let masked = first_text(payload, &["CreditCardNumber", "Last4Digits"])?;
    let digits: String = masked.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let cut = digits.len().saturating_sub(4);
    Some(digits[cut..].to_string())
}

/// A transaction is approved only when its status code equals the success
/// sentinel, which arrives either as `"000"` or as a bare zero.
pub fn is_approved(payload: &Value) -> bool {
    match payload.get("StatusCode") {
        Some(Value::String(s)) => {
            let s = s.trim();
            s == "000" || s == "0"
        }
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        _ => false,
    }
}

pub fn status_code(payload: &Value) -> String {
    match payload.get("StatusCode") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "unknown".to_string(),
    }
}
