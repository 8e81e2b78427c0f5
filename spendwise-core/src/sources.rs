//! Boundary contracts for the collaborators the pipeline talks to.
//!
//! The pipeline only reads through these traits. Writes go through
//! [`TransactionSink`], which is called by the pipeline's caller after a
//! successful run, never by a node.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::finance::{AlertRecord, TransactionRecord};

/// Configured monthly limits, by category.
#[async_trait]
pub trait BudgetSource: Send + Sync {
    /// `None` means no budget is configured for the category.
    async fn get_limit(&self, category: &str) -> Result<Option<Decimal>>;
}

/// Aggregates over persisted spend.
#[async_trait]
pub trait SpendAggregates: Send + Sync {
    /// Spend recorded so far for the category in the current budget period.
    async fn get_total_spend(&self, category: &str) -> Result<Decimal>;

    /// Mean spend amount over everything persisted; zero when empty.
    async fn get_overall_average(&self) -> Result<Decimal>;

    /// Category with the largest total spend, if any spend exists.
    async fn get_top_category(&self) -> Result<Option<(String, Decimal)>>;
}

/// Destination for a finalized run.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    async fn save_transaction(&self, record: &TransactionRecord) -> Result<i64>;

    async fn save_alerts(&self, alerts: &[AlertRecord]) -> Result<()>;
}

/// Free-text generation (chat completion) service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Everything a single backing store provides.
pub trait FinanceStore: BudgetSource + SpendAggregates + TransactionSink {}

impl<T: BudgetSource + SpendAggregates + TransactionSink> FinanceStore for T {}
