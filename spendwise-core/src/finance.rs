//! Finance record types shared by the extractor, the pipeline and the store

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the money moved, as detected from the message text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentMode {
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Net Banking")]
    NetBanking,
    #[serde(rename = "Wallet")]
    Wallet,
    #[serde(rename = "EMI")]
    Emi,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 7] = [
        PaymentMode::Upi,
        PaymentMode::CreditCard,
        PaymentMode::DebitCard,
        PaymentMode::NetBanking,
        PaymentMode::Wallet,
        PaymentMode::Emi,
        PaymentMode::BankTransfer,
    ];

    /// Display label, also the value persisted by the store
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Upi => "UPI",
            PaymentMode::CreditCard => "Credit Card",
            PaymentMode::DebitCard => "Debit Card",
            PaymentMode::NetBanking => "Net Banking",
            PaymentMode::Wallet => "Wallet",
            PaymentMode::Emi => "EMI",
            PaymentMode::BankTransfer => "Bank Transfer",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown payment mode: {s}"))
    }
}

/// Direction of the money relative to the account holder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionType {
    #[serde(rename = "debit")]
    Debit,
    #[serde(rename = "credit")]
    Credit,
    #[serde(rename = "unknown")]
    Unknown,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "debit",
            TransactionType::Credit => "credit",
            TransactionType::Unknown => "unknown",
        }
    }

    /// Credits are never counted as spend; unknown direction is treated as spend
    pub fn counts_as_spend(&self) -> bool {
        !matches!(self, TransactionType::Credit)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debit" => Ok(TransactionType::Debit),
            "credit" => Ok(TransactionType::Credit),
            "unknown" => Ok(TransactionType::Unknown),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// A finalized transaction handed to the persistence sink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub merchant: String,
    pub category: String,
    pub payment_mode: PaymentMode,
    pub transaction_type: TransactionType,
}

impl TransactionRecord {
    /// Returns true if this record contributes to category spend
    pub fn is_spend(&self) -> bool {
        self.transaction_type.counts_as_spend()
    }
}

/// An alert message paired with the time it was raised
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertRecord {
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn new(message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_round_trips_through_label() {
        for mode in PaymentMode::ALL {
            assert_eq!(mode.as_str().parse::<PaymentMode>().unwrap(), mode);
        }
        assert_eq!("bank transfer".parse::<PaymentMode>().unwrap(), PaymentMode::BankTransfer);
        assert!("cheque".parse::<PaymentMode>().is_err());
    }

    #[test]
    fn test_payment_mode_serializes_as_label() {
        let json = serde_json::to_string(&PaymentMode::CreditCard).unwrap();
        assert_eq!(json, "\"Credit Card\"");
    }

    #[test]
    fn test_credit_is_not_spend() {
        assert!(TransactionType::Debit.counts_as_spend());
        assert!(TransactionType::Unknown.counts_as_spend());
        assert!(!TransactionType::Credit.counts_as_spend());
    }
}
