use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use spendwise_core::{
    AlertRecord, BudgetSource, Error, Result, SpendAggregates, TransactionRecord, TransactionSink,
};

use super::{checked_sum, period_key, to_minor, STORE};

#[derive(Debug, Default)]
struct State {
    budgets: HashMap<String, Decimal>,
    transactions: Vec<TransactionRecord>,
    alerts: Vec<AlertRecord>,
}

/// Store that lives and dies with the process. Same aggregate rules as
/// [`super::SqliteStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::external(STORE, "state lock poisoned"))
    }

    pub fn set_budget(&self, category: &str, monthly_limit: Decimal) -> Result<()> {
        self.lock()?.budgets.insert(category.to_string(), monthly_limit);
        Ok(())
    }

    pub fn transactions(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self.lock()?.transactions.clone())
    }

    pub fn alerts(&self) -> Result<Vec<AlertRecord>> {
        Ok(self.lock()?.alerts.clone())
    }
}

#[async_trait]
impl BudgetSource for MemoryStore {
    async fn get_limit(&self, category: &str) -> Result<Option<Decimal>> {
        Ok(self.lock()?.budgets.get(category).copied())
    }
}

#[async_trait]
impl SpendAggregates for MemoryStore {
    async fn get_total_spend(&self, category: &str) -> Result<Decimal> {
        let period = period_key(Utc::now());
        checked_sum(
            self.lock()?
                .transactions
                .iter()
                .filter(|t| t.is_spend() && t.category == category && period_key(t.timestamp) == period)
                .map(|t| t.amount),
        )
    }

    async fn get_overall_average(&self) -> Result<Decimal> {
        let state = self.lock()?;
        let spend: Vec<Decimal> = state
            .transactions
            .iter()
            .filter(|t| t.is_spend())
            .map(|t| t.amount)
            .collect();
        if spend.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let total = checked_sum(spend.iter().copied())?;
        Ok((total / Decimal::from(spend.len())).round_dp(2))
    }

    async fn get_top_category(&self) -> Result<Option<(String, Decimal)>> {
        let state = self.lock()?;
        let mut totals: HashMap<&str, Decimal> = HashMap::new();
        for t in state.transactions.iter().filter(|t| t.is_spend()) {
            let total = totals.entry(t.category.as_str()).or_default();
            *total = checked_sum([*total, t.amount])?;
        }
        // Highest total, ties broken alphabetically.
        Ok(totals
            .into_iter()
            .max_by(|(ca, ta), (cb, tb)| ta.cmp(tb).then_with(|| cb.cmp(ca)))
            .map(|(category, total)| (category.to_string(), total)))
    }
}

#[async_trait]
impl TransactionSink for MemoryStore {
    async fn save_transaction(&self, record: &TransactionRecord) -> Result<i64> {
        // Same bound as the SQLite paise column.
        to_minor(record.amount)?;
        let mut state = self.lock()?;
        state.transactions.push(record.clone());
        Ok(i64::try_from(state.transactions.len()).unwrap_or(i64::MAX))
    }

    async fn save_alerts(&self, alerts: &[AlertRecord]) -> Result<()> {
        self.lock()?.alerts.extend_from_slice(alerts);
        Ok(())
    }
}
