//! Entry point for callers (CLI, API): validate, run the pipeline, persist.
//!
//! Persistence happens only after a successful run, as two separate writes:
//! the transaction row, then the alert rows. There is no transaction spanning
//! both, so a failure between them leaves the expense without its alerts.
//!
//! Writes are not bounded by the store timeout. A blocking write cannot be
//! cancelled, so a timed-out insert would still commit after the caller had
//! been told the run failed, and a retry would record the expense twice.
//!
//! The budget check reads spend before this run is saved, so concurrent runs
//! on one category can each pass it (see [`spendwise_core::budget::evaluate`]).

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use spendwise_core::{AlertRecord, Error, FinanceStore, Result, TextGenerator, TransactionContext};

use crate::pipeline::{Pipeline, PipelineConfig, RUN_FAILED_MESSAGE};

pub const MAX_MESSAGE_CHARS: usize = 1000;

/// What a caller sees for one processed message
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub ok: bool,
    pub error: Option<String>,
    pub advisor: Option<String>,
    /// Final context, when the pipeline ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionContext>,
}

impl RunOutcome {
    fn failed(error: impl Into<String>, transaction: Option<TransactionContext>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            advisor: None,
            transaction,
        }
    }
}

/// Reject input the pipeline should never see.
pub fn validate_text_input(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Please paste a transaction message".into()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(Error::InvalidInput(format!(
            "Message is too long (max {MAX_MESSAGE_CHARS} characters)"
        )));
    }
    Ok(trimmed)
}

pub struct FinanceService<S> {
    store: Arc<S>,
    pipeline: Pipeline<S, S>,
}

impl<S: FinanceStore> FinanceService<S> {
    pub fn new(
        store: Arc<S>,
        advisor: Option<Arc<dyn TextGenerator>>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let mut pipeline = Pipeline::new(Arc::clone(&store), Arc::clone(&store), config)?;
        if let Some(advisor) = advisor {
            pipeline = pipeline.with_advisor(advisor);
        }
        Ok(Self { store, pipeline })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run_pipeline_from_text(&self, text: &str) -> RunOutcome {
        let text = match validate_text_input(text) {
            Ok(t) => t,
            Err(e) => return RunOutcome::failed(e.to_string(), None),
        };

        let run = self.pipeline.run(text).await;
        let ctx = run.context;

        if let Some(err) = ctx.error.clone() {
            return RunOutcome::failed(err, Some(ctx));
        }

        if let Err(e) = self.persist(&ctx).await {
            warn!(error = %e, "could not persist transaction");
            return RunOutcome::failed(RUN_FAILED_MESSAGE, Some(ctx));
        }

        RunOutcome {
            ok: true,
            error: None,
            advisor: ctx.advisor_response.clone(),
            transaction: Some(ctx),
        }
    }

    async fn persist(&self, ctx: &TransactionContext) -> Result<()> {
        let record = ctx
            .to_record(Utc::now())
            .ok_or_else(|| Error::InvalidInput("run finished without a complete transaction".into()))?;

        let id = self.store.save_transaction(&record).await?;

        let alerts: Vec<AlertRecord> = ctx
            .alerts
            .iter()
            .map(|msg| AlertRecord::new(msg.clone(), Utc::now()))
            .collect();
        self.store.save_alerts(&alerts).await?;

        info!(id, alerts = alerts.len(), "transaction saved");
        Ok(())
    }
}
