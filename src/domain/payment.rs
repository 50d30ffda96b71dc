use super::error::BridgeError;

/// Settlement channel as the accounting API encodes it on a document's
/// payment block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Credit,
    Bank,
}

impl PaymentMethod {
    /// `Payments[].Type` code on a document-creation request.
    pub fn type_code(&self) -> u8 {
        match self {
            Self::Cash => 1,
            Self::Bank => 4,
            Self::Credit => 5,
        }
    }

    /// Maps the operator-facing labels used on the registration forms.
    /// Absent input means the hosted card page was used, so credit.
    pub fn parse(raw: Option<&str>) -> Result<Self, BridgeError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::Credit),
            Some("מזומן") => Ok(Self::Cash),
            Some("אשראי") => Ok(Self::Credit),
            Some("העברה בנקאית") => Ok(Self::Bank),
            Some(_) => Err(BridgeError::Validation(
                "unsupported payment method".into(),
            )),
        }
    }
}

/// One payment block on a document, tagged by settlement channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDetails {
    Cash,
    CreditCard { last4: String, installments: u32 },
    BankTransfer {
        bank: String,
        branch: String,
        account: String,
    },
}

impl PaymentDetails {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Cash => PaymentMethod::Cash,
            Self::CreditCard { .. } => PaymentMethod::Credit,
            Self::BankTransfer { .. } => PaymentMethod::Bank,
        }
    }
}
