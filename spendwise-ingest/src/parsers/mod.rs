//! Field extractors for free-text transaction notifications (bank, UPI and
//! wallet SMS). Each extractor is an ordered table of patterns evaluated
//! first-match-wins; adding a pattern means adding a table row.

pub mod amount;
pub mod direction;
pub mod merchant;
pub mod payment_mode;

use spendwise_core::TransactionContext;

use crate::types::{ExtractedTransaction, ExtractionError};
use amount::AmountMatcher;
use direction::DirectionMatcher;
use merchant::MerchantMatcher;
use payment_mode::PaymentModeMatcher;

/// Compiled pattern tables for every field. Build once, share freely.
#[derive(Debug, Clone)]
pub struct Extractor {
    amount: AmountMatcher,
    merchant: MerchantMatcher,
    payment_mode: PaymentModeMatcher,
    direction: DirectionMatcher,
}

impl Extractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            amount: AmountMatcher::compile()?,
            merchant: MerchantMatcher::compile()?,
            payment_mode: PaymentModeMatcher::compile()?,
            direction: DirectionMatcher::compile()?,
        })
    }

    /// Extract structured fields from raw message text.
    ///
    /// The amount is resolved first; without one nothing else is extracted.
    pub fn extract(&self, raw_text: &str) -> Result<ExtractedTransaction, ExtractionError> {
        let amount = self.amount.find(raw_text)?;

        Ok(ExtractedTransaction {
            amount,
            merchant: self.merchant.resolve(raw_text),
            payment_mode: self.payment_mode.detect(raw_text),
            transaction_type: self.direction.classify(raw_text),
        })
    }

    /// Run extraction against a pipeline context, setting either every
    /// extracted field or the error.
    pub fn apply(&self, ctx: &mut TransactionContext) -> Result<(), ExtractionError> {
        match self.extract(ctx.raw_text()) {
            Ok(t) => {
                ctx.set_extracted(t.amount, t.merchant, t.payment_mode, t.transaction_type);
                Ok(())
            }
            Err(e) => {
                ctx.fail(e.to_string());
                Err(e)
            }
        }
    }
}
