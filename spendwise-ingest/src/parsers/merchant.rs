//! Merchant resolution.
//!
//! Priority: known-merchant dictionary > anchored patterns > "Unknown Merchant".

use regex::Regex;

use crate::types::UNKNOWN_MERCHANT;

/// (lowercase alias, canonical name). Scanned in order; the first alias found
/// anywhere in the text wins, so longer aliases precede their prefixes.
pub const KNOWN_MERCHANTS: &[(&str, &str)] = &[
    ("swiggy", "Swiggy"),
    ("zomato", "Zomato"),
    ("uber eats", "Uber Eats"),
    ("ubereats", "Uber Eats"),
    ("uber", "Uber"),
    ("olacabs", "Ola"),
    ("ola cabs", "Ola"),
    ("ola money", "Ola"),
    ("rapido", "Rapido"),
    ("amazon", "Amazon"),
    ("amzn", "Amazon"),
    ("flipkart", "Flipkart"),
    ("myntra", "Myntra"),
    ("ajio", "Ajio"),
    ("nykaa", "Nykaa"),
    ("bigbasket", "BigBasket"),
    ("big basket", "BigBasket"),
    ("blinkit", "Blinkit"),
    ("grofers", "Blinkit"),
    ("zepto", "Zepto"),
    ("dmart", "DMart"),
    ("d-mart", "DMart"),
    ("dominos", "Domino's"),
    ("domino's", "Domino's"),
    ("mcdonald", "McDonald's"),
    ("kfc", "KFC"),
    ("starbucks", "Starbucks"),
    ("netflix", "Netflix"),
    ("spotify", "Spotify"),
    ("hotstar", "Hotstar"),
    ("bookmyshow", "BookMyShow"),
    ("airtel", "Airtel"),
    ("jio", "Jio"),
    ("bses", "BSES"),
    ("irctc", "IRCTC"),
    ("makemytrip", "MakeMyTrip"),
    ("indigo", "IndiGo"),
    ("apollo pharmacy", "Apollo Pharmacy"),
    ("pharmeasy", "PharmEasy"),
];

/// Words that are never a merchant on their own
const NOISE: &[&str] = &[
    "bank", "your", "ac", "a/c", "acct", "account", "you", "the", "sbi", "hdfc", "icici",
    "axis", "kotak", "pnb", "canara", "idfc", "indusind", "yes", "federal", "union",
    "baroda", "purchase", "payment",
];

/// One to four words; the first starts with a letter.
const NAME: &str = r"[A-Za-z][A-Za-z0-9&'._-]*(?:\s+[A-Za-z0-9&'._-]+){0,3}?";

/// What may follow a merchant name: a connective word, punctuation, or the end.
const END: &str = r"(?:\s+(?:on|via|ref|refno|upi|using|from|dated|for|at|to|with|by|is|was|has|avl|avbl|bal|balance|info|txn|account|a/c|ac|acct)\b|\s*[.,;:()]|\s*$)";

/// (name, pattern) in priority order. `{name}` is the captured candidate.
const MERCHANT_PATTERNS: &[(&str, &str)] = &[
    ("label", r"(?i)\b(?:merchant|store|vendor|payee)(?:\s+name)?\s*[:\-]\s*(?P<m>{name}){end}"),
    ("upi_to", r"(?i)\bupi\s+(?:txn\s+|payment\s+)?to\s+(?P<m>{name}){end}"),
    ("at_dated", r"(?i)\bat\s+(?P<m>{name})\s+(?:on|dated)\b"),
    ("at", r"(?i)\bat\s+(?P<m>{name}){end}"),
    ("to", r"(?i)\bto\s+(?P<m>{name}){end}"),
    ("at_sign", r"(?i)(?:^|\s)@\s*(?P<m>{name}){end}"),
    ("for", r"(?i)\bfor\s+(?P<m>{name}){end}"),
];

#[derive(Debug, Clone)]
pub struct MerchantMatcher {
    patterns: Vec<(&'static str, Regex)>,
}

impl MerchantMatcher {
    pub fn compile() -> Result<Self, regex::Error> {
        let patterns = MERCHANT_PATTERNS
            .iter()
            .map(|(name, pat)| {
                let pat = pat.replace("{name}", NAME).replace("{end}", END);
                Ok((*name, Regex::new(&pat)?))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }

    pub fn resolve(&self, text: &str) -> String {
        if let Some(canonical) = known_merchant(text) {
            return canonical.to_string();
        }

        for (name, re) in &self.patterns {
            for caps in re.captures_iter(text) {
                let Some(m) = caps.name("m") else { continue };
                let candidate = trim_candidate(m.as_str());
                if is_noise(candidate) {
                    tracing::trace!(pattern = name, candidate, "merchant candidate rejected");
                    continue;
                }
                return title_case(candidate);
            }
        }

        UNKNOWN_MERCHANT.to_string()
    }
}

/// Case-insensitive dictionary lookup
pub fn known_merchant(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    KNOWN_MERCHANTS
        .iter()
        .find(|(alias, _)| lower.contains(alias))
        .map(|(_, canonical)| *canonical)
}

fn trim_candidate(s: &str) -> &str {
    s.trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '\'' && c != '&')
        .trim_end()
}

fn is_noise(candidate: &str) -> bool {
    if candidate.chars().count() <= 1 {
        return true;
    }
    let lower = candidate.to_lowercase();
    if NOISE.contains(&lower.as_str()) {
        return true;
    }
    // "your hdfc bank" is as meaningless as each of its words
    lower.split_whitespace().all(|w| NOISE.contains(&w))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
