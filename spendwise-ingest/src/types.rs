use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spendwise_core::{PaymentMode, TransactionType};

/// Merchant used when neither the dictionary nor any pattern resolves one
pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";

/// Structured fields pulled from one notification message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    pub amount: Decimal,
    /// Canonical merchant name, or [`UNKNOWN_MERCHANT`]
    pub merchant: String,
    pub payment_mode: PaymentMode,
    pub transaction_type: TransactionType,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Could not detect transaction amount. Please paste the complete bank or UPI message.")]
    AmountNotDetected,

    #[error("Could not detect transaction amount: '{0}' is not a valid number.")]
    InvalidAmount(String),

    #[error("Amount {0} is larger than any single transaction can be.")]
    AmountOutOfRange(String),
}

impl From<ExtractionError> for spendwise_core::Error {
    fn from(e: ExtractionError) -> Self {
        spendwise_core::Error::Extraction(e.to_string())
    }
}
