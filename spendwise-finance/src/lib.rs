//! spendwise-finance: the transaction pipeline, its enrichment nodes, stores
//! and the service that ties them together

pub mod enrich;
pub mod llm;
pub mod pipeline;
pub mod service;
pub mod store;

pub use llm::{ChatClient, LlmConfig};
pub use pipeline::{next_stage, Pipeline, PipelineConfig, PipelineRun, Stage};
pub use service::{FinanceService, RunOutcome};
pub use store::{BudgetStatus, CategoryTotal, MemoryStore, SqliteStore, StoredTransaction};
