//! Amount detection.
//!
//! Patterns are tried in table order and the first one that matches decides
//! the amount. A match that does not parse is a failure, not a fall-through.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::types::ExtractionError;

/// Number with optional thousands separators and up to two decimals
const NUM: &str = r"\d[\d,]*(?:\.\d{1,2})?";

/// Largest amount accepted from a message (one lakh crore). Anything above
/// is a misread; the bound keeps sums and paise conversions far from overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// (name, pattern) in priority order; `{num}` marks the captured amount.
const AMOUNT_PATTERNS: &[(&str, &str)] = &[
    // Rs.500 / Rs 500 / INR 2,000.00 / ₹99
    ("currency_prefix", r"(?i)(?:₹|\brs\.?|\binr)\s*({num})"),
    // 500 Rs / 2,000 INR / 40 rupees
    ("currency_suffix", r"(?i)({num})\s*(?:rs\b|inr\b|rupees?\b|₹)"),
    // debited by 500 / spent 120.50
    (
        "verb_anchored",
        r"(?i)\b(?:debited|credited|spent|paid|charged)\s+(?:with\s+|by\s+|of\s+|for\s+)?({num})",
    ),
    // 500 has been debited
    ("has_been", r"(?i)({num})\s+has\s+been\s+(?:debited|credited)"),
];

#[derive(Debug, Clone)]
pub struct AmountMatcher {
    patterns: Vec<(&'static str, Regex)>,
}

impl AmountMatcher {
    pub fn compile() -> Result<Self, regex::Error> {
        let patterns = AMOUNT_PATTERNS
            .iter()
            .map(|(name, pat)| Ok((*name, Regex::new(&pat.replace("{num}", NUM))?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }

    pub fn find(&self, text: &str) -> Result<Decimal, ExtractionError> {
        let Some((name, raw)) = self.patterns.iter().find_map(|(name, re)| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| (*name, m.as_str()))
        }) else {
            return Err(ExtractionError::AmountNotDetected);
        };

        tracing::trace!(pattern = name, raw, "amount matched");
        parse_amount(raw)
    }
}

/// Strip thousands separators, parse, and reject anything above [`MAX_AMOUNT`].
pub fn parse_amount(raw: &str) -> Result<Decimal, ExtractionError> {
    let cleaned = raw.replace(',', "");
    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| ExtractionError::InvalidAmount(raw.to_string()))?;
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(ExtractionError::AmountOutOfRange(raw.to_string()));
    }
    Ok(amount)
}
