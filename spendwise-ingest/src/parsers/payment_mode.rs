//! Payment mode detection: keyword table, then account-number evidence, then UPI.

use regex::Regex;

use spendwise_core::PaymentMode;

/// (mode, pattern) in priority order; first match wins.
const MODE_PATTERNS: &[(PaymentMode, &str)] = &[
    (
        PaymentMode::Upi,
        r"(?i)\bupi\b|\bvpa\b|\bbhim\b|google\s*pay|\bgpay\b|phone\s*pe|\bpaytm\s+upi\b|@(?:ok(?:axis|hdfcbank|icici|sbi)|ybl|ibl|axl|paytm|upi)\b",
    ),
    (PaymentMode::CreditCard, r"(?i)\bcredit\s*card\b|\bcc\b"),
    (PaymentMode::DebitCard, r"(?i)\bdebit\s*card\b|\bdc\b|\batm\b"),
    (
        PaymentMode::NetBanking,
        r"(?i)\bneft\b|\brtgs\b|\bimps\b|\bnet\s*-?\s*banking\b|\binternet\s+banking\b",
    ),
    (
        PaymentMode::Wallet,
        r"(?i)\bwallet\b|\bpaytm\b|amazon\s*pay|\bmobikwik\b|\bfreecharge\b|ola\s*money|airtel\s+money",
    ),
    (PaymentMode::Emi, r"(?i)\bemi\b"),
];

/// "A/c XX1234", "acct no. 5521", "account ending 9876", "A/c AB1234".
/// The captured token still has to look like an account number.
const ACCOUNT_PATTERN: &str = r"(?i)(?:\ba/c|\bac\b|\bacct\b|\baccount\b)\.?\s*(?:no\.?\s*|number\s*|ending\s+(?:with\s+)?)?[:\-]?\s*([a-z\d*#]{4,})";

#[derive(Debug, Clone)]
pub struct PaymentModeMatcher {
    patterns: Vec<(PaymentMode, Regex)>,
    account: Regex,
}

impl PaymentModeMatcher {
    pub fn compile() -> Result<Self, regex::Error> {
        let patterns = MODE_PATTERNS
            .iter()
            .map(|(mode, pat)| Ok((*mode, Regex::new(pat)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            patterns,
            account: Regex::new(ACCOUNT_PATTERN)?,
        })
    }

    pub fn detect(&self, text: &str) -> PaymentMode {
        if let Some((mode, _)) = self.patterns.iter().find(|(_, re)| re.is_match(text)) {
            return *mode;
        }
        let has_account = self
            .account
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .any(|token| looks_like_account_number(token.as_str()));
        if has_account {
            return PaymentMode::BankTransfer;
        }
        // UPI dominates notification volume in the target market.
        PaymentMode::Upi
    }
}

/// A digit or mask character somewhere, or masked entirely ("XXXX").
/// Keeps "account holder" and "account exceeded" out.
fn looks_like_account_number(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit() || c == '*' || c == '#')
        || token.chars().all(|c| c.eq_ignore_ascii_case(&'x'))
}
