//! SQLite-backed store.
//!
//! One connection behind a mutex. Every query runs on the blocking pool and
//! holds the lock only for the duration of its closure.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::{debug, info};

use spendwise_core::{
    AlertRecord, BudgetSource, Error, Result, SpendAggregates, TransactionRecord, TransactionSink,
};

use super::{
    average, from_minor, period_key, to_minor, BudgetStatus, CategoryTotal, StoredTransaction, STORE,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    amount_minor INTEGER NOT NULL,
    merchant TEXT NOT NULL,
    category TEXT NOT NULL,
    payment_mode TEXT NOT NULL,
    transaction_type TEXT NOT NULL DEFAULT 'debit'
);
CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);

CREATE TABLE IF NOT EXISTS budgets (
    category TEXT PRIMARY KEY,
    limit_minor INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| Error::external(STORE, e))?;
        info!(path = %path.display(), "opened database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::external(STORE, e))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(|e| Error::external(STORE, e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool. Dropping the
    /// returned future does not stop `f`; it runs to completion regardless.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::external(STORE, "connection lock poisoned"))?;
            f(&*guard).map_err(|e| Error::external(STORE, e))
        })
        .await
        .map_err(|e| Error::external(STORE, e))?
    }

    /// Insert or replace the monthly limit for a category.
    pub async fn set_budget(&self, category: &str, monthly_limit: Decimal) -> Result<()> {
        if monthly_limit.is_sign_negative() {
            return Err(Error::InvalidInput("budget limit must not be negative".into()));
        }
        let category = category.trim().to_string();
        if category.is_empty() {
            return Err(Error::InvalidInput("budget category must not be empty".into()));
        }
        let limit_minor = to_minor(monthly_limit)?;
        debug!(%category, %monthly_limit, "setting budget");
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO budgets (category, limit_minor) VALUES (?1, ?2)
                 ON CONFLICT(category) DO UPDATE SET limit_minor = excluded.limit_minor",
                params![category, limit_minor],
            )
            .map(|_| ())
        })
        .await
    }

    pub async fn list_budgets(&self) -> Result<Vec<BudgetStatus>> {
        let period = period_key(Utc::now());
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT b.category, b.limit_minor,
                        COALESCE((SELECT SUM(e.amount_minor) FROM expenses e
                                  WHERE e.category = b.category
                                    AND e.transaction_type != 'credit'
                                    AND substr(e.date, 1, 7) = ?1), 0)
                 FROM budgets b
                 ORDER BY b.category",
            )?;
            let rows = stmt.query_map(params![period], |row| {
                Ok(BudgetStatus {
                    category: row.get(0)?,
                    monthly_limit: from_minor(row.get(1)?),
                    spent: from_minor(row.get(2)?),
                })
            })?;
            rows.collect()
        })
        .await
    }

    /// Debit spend recorded in the current calendar month.
    pub async fn monthly_total(&self) -> Result<Decimal> {
        let period = period_key(Utc::now());
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(amount_minor), 0) FROM expenses
                 WHERE transaction_type != 'credit' AND substr(date, 1, 7) = ?1",
                params![period],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(from_minor)
    }

    /// All-time spend per category, largest first.
    pub async fn category_summary(&self) -> Result<Vec<CategoryTotal>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT category, SUM(amount_minor) AS total FROM expenses
                 WHERE transaction_type != 'credit'
                 GROUP BY category
                 ORDER BY total DESC, category ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: from_minor(row.get(1)?),
                })
            })?;
            rows.collect()
        })
        .await
    }

    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<StoredTransaction>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, amount_minor, merchant, category, payment_mode, transaction_type
                 FROM expenses ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], map_transaction_row)?;
            rows.collect()
        })
        .await
    }

    pub async fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT message, created_at FROM alerts ORDER BY id DESC LIMIT ?1")?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(AlertRecord {
                    message: row.get(0)?,
                    created_at: parse_timestamp(row, 1)?,
                })
            })?;
            rows.collect()
        })
        .await
    }
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn map_transaction_row(row: &Row<'_>) -> rusqlite::Result<StoredTransaction> {
    Ok(StoredTransaction {
        id: row.get(0)?,
        record: TransactionRecord {
            timestamp: parse_timestamp(row, 1)?,
            amount: from_minor(row.get(2)?),
            merchant: row.get(3)?,
            category: row.get(4)?,
            payment_mode: parse_text(row, 5)?,
            transaction_type: parse_text(row, 6)?,
        },
    })
}

#[async_trait]
impl BudgetSource for SqliteStore {
    async fn get_limit(&self, category: &str) -> Result<Option<Decimal>> {
        let category = category.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT limit_minor FROM budgets WHERE category = ?1",
                params![category],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        })
        .await
        .map(|limit| limit.map(from_minor))
    }
}

#[async_trait]
impl SpendAggregates for SqliteStore {
    async fn get_total_spend(&self, category: &str) -> Result<Decimal> {
        let category = category.to_string();
        let period = period_key(Utc::now());
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(amount_minor), 0) FROM expenses
                 WHERE category = ?1 AND transaction_type != 'credit' AND substr(date, 1, 7) = ?2",
                params![category, period],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(from_minor)
    }

    async fn get_overall_average(&self) -> Result<Decimal> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(amount_minor), 0), COUNT(*) FROM expenses
                 WHERE transaction_type != 'credit'",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
        })
        .await
        .map(|(total, count)| average(total, count))
    }

    async fn get_top_category(&self) -> Result<Option<(String, Decimal)>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT category, SUM(amount_minor) AS total FROM expenses
                 WHERE transaction_type != 'credit'
                 GROUP BY category
                 ORDER BY total DESC, category ASC
                 LIMIT 1",
                [],
                |row| Ok((row.get::<_, String>(0)?, from_minor(row.get(1)?))),
            )
            .optional()
        })
        .await
    }
}

#[async_trait]
impl TransactionSink for SqliteStore {
    async fn save_transaction(&self, record: &TransactionRecord) -> Result<i64> {
        let amount_minor = to_minor(record.amount)?;
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO expenses (date, amount_minor, merchant, category, payment_mode, transaction_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.timestamp.to_rfc3339(),
                    amount_minor,
                    record.merchant,
                    record.category,
                    record.payment_mode.as_str(),
                    record.transaction_type.as_str(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn save_alerts(&self, alerts: &[AlertRecord]) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }
        let alerts = alerts.to_vec();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("INSERT INTO alerts (message, created_at) VALUES (?1, ?2)")?;
            for alert in &alerts {
                stmt.execute(params![alert.message, alert.created_at.to_rfc3339()])?;
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spendwise_core::{PaymentMode, TransactionType};

    fn record(category: &str, amount: i64, kind: TransactionType) -> TransactionRecord {
        TransactionRecord {
            timestamp: Utc::now(),
            amount: Decimal::from(amount),
            merchant: "Test Merchant".into(),
            category: category.into(),
            payment_mode: PaymentMode::Upi,
            transaction_type: kind,
        }
    }

    #[tokio::test]
    async fn test_missing_limit_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_limit("Food").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_budget_upserts() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_budget("Food", Decimal::from(1000)).await.unwrap();
        store.set_budget("Food", Decimal::new(150050, 2)).await.unwrap();
        assert_eq!(store.get_limit("Food").await.unwrap(), Some(Decimal::new(150050, 2)));
    }

    #[tokio::test]
    async fn test_set_budget_rejects_negative() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.set_budget("Food", Decimal::from(-1)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_total_spend_skips_credits_and_old_months() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_transaction(&record("Food", 400, TransactionType::Debit)).await.unwrap();
        store.save_transaction(&record("Food", 500, TransactionType::Unknown)).await.unwrap();
        store.save_transaction(&record("Food", 9000, TransactionType::Credit)).await.unwrap();

        let mut old = record("Food", 7000, TransactionType::Debit);
        old.timestamp = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        store.save_transaction(&old).await.unwrap();

        assert_eq!(store.get_total_spend("Food").await.unwrap(), Decimal::from(900));
        assert_eq!(store.get_total_spend("Travel").await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_average_and_top_category() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_overall_average().await.unwrap(), Decimal::ZERO);
        assert_eq!(store.get_top_category().await.unwrap(), None);

        store.save_transaction(&record("Food", 100, TransactionType::Debit)).await.unwrap();
        store.save_transaction(&record("Food", 200, TransactionType::Debit)).await.unwrap();
        store.save_transaction(&record("Shopping", 250, TransactionType::Debit)).await.unwrap();
        store.save_transaction(&record("Others", 5000, TransactionType::Credit)).await.unwrap();

        assert_eq!(store.get_overall_average().await.unwrap(), Decimal::new(18333, 2));
        assert_eq!(
            store.get_top_category().await.unwrap(),
            Some(("Food".to_string(), Decimal::from(300)))
        );
    }

    #[tokio::test]
    async fn test_round_trip_and_reports() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut rec = record("Food", 0, TransactionType::Debit);
        rec.amount = Decimal::new(49999, 2);
        rec.payment_mode = PaymentMode::CreditCard;
        let id = store.save_transaction(&rec).await.unwrap();

        let recent = store.recent_transactions(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, id);
        assert_eq!(recent[0].record.amount, Decimal::new(49999, 2));
        assert_eq!(recent[0].record.payment_mode, PaymentMode::CreditCard);

        assert_eq!(store.monthly_total().await.unwrap(), Decimal::new(49999, 2));
        let summary = store.category_summary().await.unwrap();
        assert_eq!(summary, vec![CategoryTotal { category: "Food".into(), total: Decimal::new(49999, 2) }]);
    }

    #[tokio::test]
    async fn test_alerts_keep_order_and_timestamps() {
        let store = SqliteStore::open_in_memory().unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 1).unwrap();
        store
            .save_alerts(&[AlertRecord::new("first", t1), AlertRecord::new("second", t2)])
            .await
            .unwrap();

        let alerts = store.recent_alerts(5).await.unwrap();
        assert_eq!(alerts[0], AlertRecord::new("second", t2));
        assert_eq!(alerts[1], AlertRecord::new("first", t1));
    }

    #[tokio::test]
    async fn test_list_budgets_reports_spend() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_budget("Food", Decimal::from(1000)).await.unwrap();
        store.save_transaction(&record("Food", 1200, TransactionType::Debit)).await.unwrap();

        let budgets = store.list_budgets().await.unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].spent, Decimal::from(1200));
        assert!(budgets[0].is_over());
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finance.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set_budget("Bills", Decimal::from(800)).await.unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get_limit("Bills").await.unwrap(), Some(Decimal::from(800)));
    }
}
