//! spendwise-core: shared types, collaborator contracts and the deterministic
//! pipeline steps (categorize, budget, alert)

pub mod alerts;
pub mod budget;
pub mod context;
pub mod error;
pub mod finance;
pub mod sources;

pub use context::{Branch, TransactionContext};
pub use error::{Error, Result};
pub use finance::{AlertRecord, PaymentMode, TransactionRecord, TransactionType};
pub use sources::{BudgetSource, FinanceStore, SpendAggregates, TextGenerator, TransactionSink};

/// Merchant-to-category lookup
pub mod categorizer {
    /// Category for merchants with no mapping
    pub const FALLBACK_CATEGORY: &str = "Others";

    /// Canonical merchant name -> spending category.
    ///
    /// Keys are the canonical names produced by the extractor's merchant
    /// dictionary; the match is exact and case-sensitive.
    pub const CATEGORY_MAP: &[(&str, &str)] = &[
        // Food
        ("Swiggy", "Food"),
        ("Zomato", "Food"),
        ("Uber Eats", "Food"),
        ("Domino's", "Food"),
        ("McDonald's", "Food"),
        ("KFC", "Food"),
        ("Starbucks", "Food"),
        // Transport
        ("Uber", "Transport"),
        ("Ola", "Transport"),
        ("Rapido", "Transport"),
        // Shopping
        ("Amazon", "Shopping"),
        ("Flipkart", "Shopping"),
        ("Myntra", "Shopping"),
        ("Ajio", "Shopping"),
        ("Nykaa", "Shopping"),
        // Groceries
        ("BigBasket", "Groceries"),
        ("Blinkit", "Groceries"),
        ("Zepto", "Groceries"),
        ("DMart", "Groceries"),
        // Entertainment
        ("Netflix", "Entertainment"),
        ("Spotify", "Entertainment"),
        ("Hotstar", "Entertainment"),
        ("BookMyShow", "Entertainment"),
        // Bills
        ("Airtel", "Bills"),
        ("Jio", "Bills"),
        ("BSES", "Bills"),
        // Travel
        ("IRCTC", "Travel"),
        ("MakeMyTrip", "Travel"),
        ("IndiGo", "Travel"),
        // Health
        ("Apollo Pharmacy", "Health"),
        ("PharmEasy", "Health"),
    ];

    /// Categorize a canonical merchant name. Total: unmapped names yield
    /// [`FALLBACK_CATEGORY`].
    pub fn classify(merchant: &str) -> &'static str {
        CATEGORY_MAP
            .iter()
            .find(|(name, _)| *name == merchant)
            .map(|(_, category)| *category)
            .unwrap_or(FALLBACK_CATEGORY)
    }

}

pub use categorizer::{classify, FALLBACK_CATEGORY};
