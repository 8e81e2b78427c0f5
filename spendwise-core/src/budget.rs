//! Budget evaluation: is the category over its monthly limit?

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Error, Result};
use crate::sources::{BudgetSource, SpendAggregates};

/// Pure comparison. No limit configured means never over budget.
pub fn exceeds_limit(total_spend: Decimal, limit: Option<Decimal>) -> bool {
    match limit {
        Some(limit) => total_spend > limit,
        None => false,
    }
}

/// Read the limit and the spend so far for `category`, add the spend of the
/// transaction being processed, and compare.
///
/// The limit is read first; when none is configured the spend aggregate is
/// not consulted at all. Read failures propagate: a store outage must not
/// look like "under budget".
///
/// Read-then-compare is not atomic. Two runs for the same category can both
/// read the spend before either one is saved, and each then sees only its
/// own pending amount on top of it.
pub async fn evaluate<B, A>(
    budgets: &B,
    aggregates: &A,
    category: &str,
    pending: Decimal,
) -> Result<bool>
where
    B: BudgetSource + ?Sized,
    A: SpendAggregates + ?Sized,
{
    let Some(limit) = budgets.get_limit(category).await? else {
        debug!(category, "no budget configured");
        return Ok(false);
    };

    let spent = aggregates.get_total_spend(category).await?;
    let projected = spent
        .checked_add(pending)
        .ok_or_else(|| Error::InvalidInput(format!("spend for {category} is out of range")))?;
    let over = exceeds_limit(projected, Some(limit));
    debug!(category, %spent, %pending, %limit, over, "budget evaluated");
    Ok(over)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct Fixed {
        limits: HashMap<String, Decimal>,
        spend: HashMap<String, Decimal>,
        fail_spend: bool,
    }

    impl Fixed {
        fn new() -> Self {
            Self {
                limits: HashMap::new(),
                spend: HashMap::new(),
                fail_spend: false,
            }
        }
    }

    #[async_trait]
    impl BudgetSource for Fixed {
        async fn get_limit(&self, category: &str) -> Result<Option<Decimal>> {
            Ok(self.limits.get(category).copied())
        }
    }

    #[async_trait]
    impl SpendAggregates for Fixed {
        async fn get_total_spend(&self, category: &str) -> Result<Decimal> {
            if self.fail_spend {
                return Err(Error::external("store", "disk gone"));
            }
            Ok(self.spend.get(category).copied().unwrap_or_default())
        }
        async fn get_overall_average(&self) -> Result<Decimal> {
            Ok(Decimal::ZERO)
        }
        async fn get_top_category(&self) -> Result<Option<(String, Decimal)>> {
            Ok(None)
        }
    }

    #[test]
    fn test_exceeds_limit_is_strict() {
        assert!(!exceeds_limit(Decimal::from(1000), Some(Decimal::from(1000))));
        assert!(exceeds_limit(Decimal::new(100001, 2), Some(Decimal::from(1000))));
        assert!(!exceeds_limit(Decimal::from(1_000_000), None));
    }

    #[tokio::test]
    async fn test_pending_amount_pushes_over_limit() {
        let mut src = Fixed::new();
        src.limits.insert("Food".into(), Decimal::from(1000));
        src.spend.insert("Food".into(), Decimal::from(900));

        assert!(evaluate(&src, &src, "Food", Decimal::from(200)).await.unwrap());
        assert!(!evaluate(&src, &src, "Food", Decimal::from(100)).await.unwrap());
    }

    #[tokio::test]
    async fn test_spend_above_limit_is_over_without_pending() {
        let mut src = Fixed::new();
        src.limits.insert("Travel".into(), Decimal::from(50));
        src.spend.insert("Travel".into(), Decimal::from(51));
        assert!(evaluate(&src, &src, "Travel", Decimal::ZERO).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_limit_never_over_budget() {
        let mut src = Fixed::new();
        src.spend.insert("Food".into(), Decimal::from(1_000_000));
        src.fail_spend = true;
        // The aggregate is never read when no limit exists.
        assert!(!evaluate(&src, &src, "Food", Decimal::from(5)).await.unwrap());
    }

    #[tokio::test]
    async fn test_overflowing_total_is_an_error() {
        let mut src = Fixed::new();
        src.limits.insert("Food".into(), Decimal::from(1000));
        src.spend.insert("Food".into(), Decimal::MAX);
        let err = evaluate(&src, &src, "Food", Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let mut src = Fixed::new();
        src.limits.insert("Food".into(), Decimal::from(1000));
        src.fail_spend = true;
        let err = evaluate(&src, &src, "Food", Decimal::ONE).await.unwrap_err();
        assert!(err.is_external());
    }
}
