//! Persistence backends for budgets, transactions and alerts.
//!
//! - `sqlite` - file-backed store used by the CLI
//! - `memory` - process-local store for tests and dry runs
//!
//! Spend aggregates only count debit and unknown-direction rows. Category
//! totals used for budgets are month-to-date (UTC calendar month).

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use spendwise_core::{Error, Result, TransactionRecord};

pub(crate) const STORE: &str = "store";

/// A configured limit with what has been spent against it this month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub monthly_limit: Decimal,
    pub spent: Decimal,
}

impl BudgetStatus {
    pub fn remaining(&self) -> Decimal {
        self.monthly_limit - self.spent
    }

    pub fn is_over(&self) -> bool {
        spendwise_core::budget::exceeds_limit(self.spent, Some(self.monthly_limit))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTransaction {
    pub id: i64,
    #[serde(flatten)]
    pub record: TransactionRecord,
}

/// Key of the budget period containing `at`
pub(crate) fn period_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// Money is stored as integer paise so sums stay exact.
pub(crate) fn to_minor(amount: Decimal) -> Result<i64> {
    amount
        .round_dp(2)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| Error::InvalidInput(format!("amount out of range: {amount}")))
}

pub(crate) fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Sum that reports overflow instead of panicking.
pub(crate) fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, a| {
        acc.checked_add(a)
            .ok_or_else(|| Error::InvalidInput("spend total out of range".into()))
    })
}

pub(crate) fn average(total_minor: i64, count: i64) -> Decimal {
    if count <= 0 {
        return Decimal::ZERO;
    }
    (from_minor(total_minor) / Decimal::from(count)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor(Decimal::new(200000, 2)).unwrap(), 200000);
        assert_eq!(to_minor(Decimal::from(500)).unwrap(), 50000);
        assert_eq!(from_minor(12345), Decimal::new(12345, 2));
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum([Decimal::ONE, Decimal::TEN]).unwrap(), Decimal::from(11));
        assert!(checked_sum([Decimal::MAX, Decimal::ONE]).is_err());
    }

    #[test]
    fn test_minor_units_out_of_range() {
        assert!(matches!(to_minor(Decimal::MAX), Err(Error::InvalidInput(_))));
        assert!(to_minor(Decimal::from(i64::MAX)).is_err());
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(average(0, 0), Decimal::ZERO);
        assert_eq!(average(100000, 3), Decimal::new(33333, 2));
    }

    #[test]
    fn test_period_key() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(period_key(at), "2026-03");
    }

    #[test]
    fn test_budget_status() {
        let status = BudgetStatus {
            category: "Food".into(),
            monthly_limit: Decimal::from(1000),
            spent: Decimal::from(1100),
        };
        assert!(status.is_over());
        assert_eq!(status.remaining(), Decimal::from(-100));
    }
}
