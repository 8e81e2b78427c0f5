//! Debit/credit classification. The debit check runs first, so text that
//! loosely matches both ("refund of amount debited") is a debit.

use regex::Regex;

use spendwise_core::TransactionType;

const DEBIT_PATTERN: &str = r"(?i)\b(?:debited|spent|paid|purchased?|withdrawn|sent|deducted|transferred\s+out)\b";
const CREDIT_PATTERN: &str = r"(?i)\b(?:credited|received|salary|refund(?:ed)?|cashback|deposited|transferred\s+in)\b";

#[derive(Debug, Clone)]
pub struct DirectionMatcher {
    debit: Regex,
    credit: Regex,
}

impl DirectionMatcher {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            debit: Regex::new(DEBIT_PATTERN)?,
            credit: Regex::new(CREDIT_PATTERN)?,
        })
    }

    pub fn classify(&self, text: &str) -> TransactionType {
        if self.debit.is_match(text) {
            TransactionType::Debit
        } else if self.credit.is_match(text) {
            TransactionType::Credit
        } else {
            TransactionType::Unknown
        }
    }
}
