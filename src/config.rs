use {
    std::{env, path::PathBuf},
    thiserror::Error,
};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(String);

/// Immutable service configuration, built once at startup and shared by
/// reference. Missing required variables abort startup instead of failing
/// individual calls later.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sumit: SumitConfig,
    pub pelecard: PelecardConfig,
    /// Externally reachable base URL of this service, used to build the
    /// gateway's success/error/webhook callback URLs.
    pub public_base_url: String,
    /// User-facing results page the payment redirect lands on.
    pub results_url: String,
    /// CRM page the synchronous entry point returns the browser to.
    pub sf_return_url: String,
    /// Line item placed on every issued document.
    pub item_sku: String,
    pub item_description: String,
    pub data_dir: PathBuf,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct SumitConfig {
    pub company_id: i64,
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct PelecardConfig {
    pub terminal: String,
    pub user: String,
    pub password: String,
    pub base_url: String,
    pub min_payments: u32,
    pub max_payments: u32,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let (Some(company_id), Some(api_key)) = (var("SUMIT_COMPANY_ID"), var("SUMIT_API_KEY"))
        else {
            return Err(ConfigError(
                "Missing Summit credentials in env variables".into(),
            ));
        };
        let company_id = company_id
            .parse()
            .map_err(|_| ConfigError("SUMIT_COMPANY_ID must be numeric".into()))?;

        let (Some(terminal), Some(user), Some(password)) = (
            var("PELECARD_TERMINAL"),
            var("PELECARD_USER"),
            var("PELECARD_PASSWORD"),
        ) else {
            return Err(ConfigError(
                "Missing Pelecard credentials in env variables".into(),
            ));
        };

        let port = var_or("PORT", "8080")
            .parse()
            .map_err(|_| ConfigError("PORT must be numeric".into()))?;

        Ok(Self {
            sumit: SumitConfig {
                company_id,
                api_key,
                base_url: var_or("SUMIT_BASE_URL", "https://app.sumit.co.il"),
            },
            pelecard: PelecardConfig {
                terminal,
                user,
                password,
                base_url: var_or("PELECARD_BASE_URL", "https://gateway20.pelecard.biz/PaymentGW"),
                min_payments: 1,
                max_payments: 12,
            },
            public_base_url: var_or("PUBLIC_BASE_URL", "http://localhost:8080"),
            results_url: var_or("RESULTS_URL", "https://www.puah.org.il/payment-result"),
            sf_return_url: var_or("SF_RETURN_URL", "https://www.puah.org.il/payment-done"),
            item_sku: var_or("SUMIT_ITEM_SKU", "REG-FEE"),
            item_description: var_or("SUMIT_ITEM_DESCRIPTION", "השגחה בטיפול פוריות"),
            data_dir: PathBuf::from(var_or("DATA_DIR", "./data")),
            port,
        })
    }
}
