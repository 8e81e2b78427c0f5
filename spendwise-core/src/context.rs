//! The record threaded through one pipeline run.
//!
//! A context is owned by exactly one run. Nodes take it by value and hand it
//! back, so no node keeps a reference after the next one starts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::finance::{PaymentMode, TransactionRecord, TransactionType};

/// The mutually exclusive path taken after alerting
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Branch {
    #[serde(rename = "advisor")]
    Advisor,
    #[serde(rename = "insight")]
    Insight,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionContext {
    raw_text: String,
    pub amount: Option<Decimal>,
    pub merchant: Option<String>,
    pub payment_mode: Option<PaymentMode>,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub over_budget: bool,
    pub alerts: Vec<String>,
    pub insights: Vec<String>,
    pub prediction: Option<String>,
    pub advisor_response: Option<String>,
    pub branch: Option<Branch>,
    pub error: Option<String>,
}

impl TransactionContext {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            amount: None,
            merchant: None,
            payment_mode: None,
            transaction_type: None,
            category: None,
            over_budget: false,
            alerts: Vec::new(),
            insights: Vec::new(),
            prediction: None,
            advisor_response: None,
            branch: None,
            error: None,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Record the extracted fields together; they are only ever set as a set.
    pub fn set_extracted(
        &mut self,
        amount: Decimal,
        merchant: String,
        payment_mode: PaymentMode,
        transaction_type: TransactionType,
    ) {
        self.amount = Some(amount);
        self.merchant = Some(merchant);
        self.payment_mode = Some(payment_mode);
        self.transaction_type = Some(transaction_type);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_extracted(&self) -> bool {
        self.amount.is_some()
            && self.merchant.is_some()
            && self.payment_mode.is_some()
            && self.transaction_type.is_some()
    }

    /// Amount that counts against the category budget (zero for credits)
    pub fn pending_spend(&self) -> Decimal {
        match (self.amount, self.transaction_type) {
            (Some(amount), Some(t)) if t.counts_as_spend() => amount,
            _ => Decimal::ZERO,
        }
    }

    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(crate::categorizer::FALLBACK_CATEGORY)
    }

    /// Finalized record for the persistence sink; `None` unless the run got
    /// through extraction and categorization without error.
    pub fn to_record(&self, timestamp: DateTime<Utc>) -> Option<TransactionRecord> {
        if self.is_failed() {
            return None;
        }
        Some(TransactionRecord {
            timestamp,
            amount: self.amount?,
            merchant: self.merchant.clone()?,
            category: self.category.clone()?,
            payment_mode: self.payment_mode?,
            transaction_type: self.transaction_type?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted() -> TransactionContext {
        let mut ctx = TransactionContext::new("Rs.500 debited at Swiggy");
        ctx.set_extracted(
            Decimal::from(500),
            "Swiggy".to_string(),
            PaymentMode::Upi,
            TransactionType::Debit,
        );
        ctx
    }

    #[test]
    fn test_new_context_is_empty() {
        let ctx = TransactionContext::new("hello");
        assert_eq!(ctx.raw_text(), "hello");
        assert!(!ctx.is_extracted());
        assert!(!ctx.is_failed());
        assert!(ctx.alerts.is_empty());
        assert!(ctx.insights.is_empty());
    }

    #[test]
    fn test_pending_spend_ignores_credits() {
        let mut ctx = extracted();
        assert_eq!(ctx.pending_spend(), Decimal::from(500));
        ctx.transaction_type = Some(TransactionType::Credit);
        assert_eq!(ctx.pending_spend(), Decimal::ZERO);
    }

    #[test]
    fn test_to_record_requires_category() {
        let mut ctx = extracted();
        let now = Utc::now();
        assert!(ctx.to_record(now).is_none());

        ctx.category = Some("Food".to_string());
        let rec = ctx.to_record(now).unwrap();
        assert_eq!(rec.merchant, "Swiggy");
        assert_eq!(rec.category, "Food");
        assert_eq!(rec.timestamp, now);
    }

    #[test]
    fn test_failed_context_has_no_record() {
        let mut ctx = extracted();
        ctx.category = Some("Food".to_string());
        ctx.fail("store unavailable");
        assert!(ctx.to_record(Utc::now()).is_none());
    }
}
