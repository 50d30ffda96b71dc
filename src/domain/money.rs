use {
    super::error::BridgeError,
    rust_decimal::{Decimal, prelude::ToPrimitive},
    serde::{Deserialize, Serialize},
    std::fmt,
    std::str::FromStr,
};

/// Positive payment amount, stored in minor currency units (agorot).
///
/// The gateway reports amounts in minor units; the accounting API wants
/// major units. Keeping the integer form internally means the /100
/// conversion happens in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount(i64);

impl Amount {
    pub fn from_minor(minor: i64) -> Result<Self, BridgeError> {
        if minor <= 0 {
            return Err(BridgeError::Validation("amount invalid".into()));
        }
        Ok(Self(minor))
    }

    /// Parses a free-text major-unit amount as it arrives from forms and
    /// CRM links: currency symbols and thousands separators are stripped,
    /// only digits, the decimal point and a sign survive.
    /// `"₪1,250.50"` → 125050 minor units.
    pub fn parse_major(raw: &str) -> Result<Self, BridgeError> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        if cleaned.is_empty() {
            return Err(BridgeError::Validation("amount invalid".into()));
        }
        let value = Decimal::from_str(&cleaned)
            .map_err(|_| BridgeError::Validation("amount invalid".into()))?;
        if value <= Decimal::ZERO {
            return Err(BridgeError::Validation("amount invalid".into()));
        }
        let minor = (value * Decimal::from(100))
            .round()
            .to_i64()
            .ok_or_else(|| BridgeError::Validation("amount invalid".into()))?;
        Self::from_minor(minor)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Major-unit value with two fraction digits, as the accounting API
    /// and the user-facing redirect expect it.
    pub fn major(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major())
    }
}
