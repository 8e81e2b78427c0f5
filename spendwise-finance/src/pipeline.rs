//! Pipeline orchestrator.
//!
//! ```text
//! Parsing ─► Categorizing ─► BudgetChecking ─► Alerting ─┬─► AdvisorBranch ─┬─► Predicting ─► Done
//!    │                              │                    └─► InsightBranch ─┘        │
//!    └──────────────────────────────┴──────────────► Failed ◄─────────────────────────┘
//! ```
//!
//! Sequencing lives in [`next_stage`], a pure function of the current stage
//! and the context. [`Pipeline::run`] only executes the node for a stage and
//! asks `next_stage` where to go. The context moves into each node and comes
//! back out; nothing holds on to it in between.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use spendwise_core::{
    alerts, budget, classify, Branch, BudgetSource, Error, Result, SpendAggregates, TextGenerator,
    TransactionContext,
};
use spendwise_ingest::Extractor;

use crate::enrich;

/// Shown to the user when a node fails after extraction. Details go to the log.
pub const RUN_FAILED_MESSAGE: &str = "Could not process the transaction right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parsing,
    Categorizing,
    BudgetChecking,
    Alerting,
    AdvisorBranch,
    InsightBranch,
    Predicting,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

/// Transition function. Any error on the context is absorbing.
pub fn next_stage(stage: Stage, ctx: &TransactionContext) -> Stage {
    if ctx.is_failed() {
        return Stage::Failed;
    }
    match stage {
        Stage::Parsing => Stage::Categorizing,
        Stage::Categorizing => Stage::BudgetChecking,
        Stage::BudgetChecking => Stage::Alerting,
        Stage::Alerting => {
            if ctx.alerts.is_empty() {
                Stage::InsightBranch
            } else {
                Stage::AdvisorBranch
            }
        }
        Stage::AdvisorBranch | Stage::InsightBranch => Stage::Predicting,
        Stage::Predicting => Stage::Done,
        Stage::Done => Stage::Done,
        Stage::Failed => Stage::Failed,
    }
}

/// Deadlines for nodes that reach outside the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub store_timeout: Duration,
    pub llm_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(2_000),
            llm_timeout: Duration::from_millis(15_000),
        }
    }
}

/// Result of one run: the final context plus the stages that executed.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub context: TransactionContext,
    pub stage: Stage,
    /// Stages whose node ran, in order (terminal stages excluded)
    pub visited: Vec<Stage>,
    /// Underlying failure for logs and callers; the context only carries the
    /// user-facing message.
    pub failure: Option<Error>,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }
}

pub struct Pipeline<B, A> {
    extractor: Extractor,
    budgets: Arc<B>,
    aggregates: Arc<A>,
    advisor: Option<Arc<dyn TextGenerator>>,
    config: PipelineConfig,
}

impl<B, A> Pipeline<B, A>
where
    B: BudgetSource,
    A: SpendAggregates,
{
    pub fn new(budgets: Arc<B>, aggregates: Arc<A>, config: PipelineConfig) -> Result<Self> {
        let extractor = Extractor::new().map_err(|e| Error::Config(format!("pattern table: {e}")))?;
        Ok(Self {
            extractor,
            budgets,
            aggregates,
            advisor: None,
            config,
        })
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn TextGenerator>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, raw_text: &str) -> PipelineRun {
        let mut ctx = TransactionContext::new(raw_text);
        let mut stage = Stage::Parsing;
        let mut visited = Vec::new();
        let mut failure = None;

        while !stage.is_terminal() {
            visited.push(stage);
            let (next_ctx, err) = self.step(stage, ctx).await;
            ctx = next_ctx;
            if let Some(e) = err {
                failure = Some(e);
            }
            let next = next_stage(stage, &ctx);
            debug!(from = ?stage, to = ?next, "pipeline transition");
            stage = next;
        }

        match &failure {
            Some(e) if e.is_external() => warn!(error = %e, "pipeline failed"),
            Some(e) => info!(error = %e, "pipeline stopped"),
            None => info!(
                merchant = ctx.merchant.as_deref().unwrap_or_default(),
                category = ctx.category_or_default(),
                over_budget = ctx.over_budget,
                branch = ?ctx.branch,
                "pipeline complete"
            ),
        }

        PipelineRun {
            context: ctx,
            stage,
            visited,
            failure,
        }
    }

    /// Execute the node for `stage`. Returns the context and, when the node
    /// failed, the underlying error (the context then carries the message).
    async fn step(
        &self,
        stage: Stage,
        mut ctx: TransactionContext,
    ) -> (TransactionContext, Option<Error>) {
        let outcome = match stage {
            Stage::Parsing => self
                .extractor
                .apply(&mut ctx)
                .map_err(Error::from)
                .err(),
            Stage::Categorizing => {
                let category = classify(ctx.merchant.as_deref().unwrap_or_default());
                ctx.category = Some(category.to_string());
                None
            }
            Stage::BudgetChecking => self.check_budget(&mut ctx).await.err(),
            Stage::Alerting => {
                let raised = alerts::generate(ctx.over_budget, ctx.category_or_default());
                ctx.alerts.extend(raised);
                None
            }
            Stage::AdvisorBranch => {
                ctx.branch = Some(Branch::Advisor);
                ctx.advisor_response = self.advise(&ctx).await;
                None
            }
            Stage::InsightBranch => {
                ctx.branch = Some(Branch::Insight);
                self.gather_insights(&mut ctx).await.err()
            }
            Stage::Predicting => self.predict(&mut ctx).await.err(),
            Stage::Done | Stage::Failed => None,
        };

        // Extraction writes its own message; later failures are generic.
        if let Some(e) = &outcome {
            if !ctx.is_failed() {
                warn!(?stage, error = %e, "node failed");
                ctx.fail(RUN_FAILED_MESSAGE);
            }
        }
        (ctx, outcome)
    }

    async fn check_budget(&self, ctx: &mut TransactionContext) -> Result<()> {
        let category = ctx.category_or_default().to_string();
        let pending = ctx.pending_spend();
        let over = bounded(
            "budget store",
            self.config.store_timeout,
            budget::evaluate(self.budgets.as_ref(), self.aggregates.as_ref(), &category, pending),
        )
        .await?;
        ctx.over_budget = over;
        Ok(())
    }

    /// Generation failures degrade to no advice; they never fail the run.
    async fn advise(&self, ctx: &TransactionContext) -> Option<String> {
        let Some(generator) = &self.advisor else {
            debug!("no text generator configured; skipping advice");
            return None;
        };
        let prompt = enrich::advisor_prompt(ctx);
        match bounded("text generation", self.config.llm_timeout, generator.generate(&prompt)).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!("text generation returned nothing");
                None
            }
            Err(e) => {
                warn!(error = %e, "advisor unavailable");
                None
            }
        }
    }

    async fn gather_insights(&self, ctx: &mut TransactionContext) -> Result<()> {
        let top = bounded(
            "spend aggregates",
            self.config.store_timeout,
            self.aggregates.get_top_category(),
        )
        .await?;
        ctx.insights.extend(enrich::insights(top));
        Ok(())
    }

    async fn predict(&self, ctx: &mut TransactionContext) -> Result<()> {
        let average = bounded(
            "spend aggregates",
            self.config.store_timeout,
            self.aggregates.get_overall_average(),
        )
        .await?;
        ctx.prediction = Some(enrich::prediction(average));
        Ok(())
    }
}

/// Apply a deadline to an external read.
pub async fn bounded<T>(
    dependency: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(Error::Timeout {
            dependency,
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted_ctx() -> TransactionContext {
        let mut ctx = TransactionContext::new("Rs 10 at Swiggy");
        ctx.set_extracted(
            rust_decimal::Decimal::TEN,
            "Swiggy".into(),
            spendwise_core::PaymentMode::Upi,
            spendwise_core::TransactionType::Debit,
        );
        ctx
    }

    #[test]
    fn test_linear_prefix() {
        let ctx = extracted_ctx();
        assert_eq!(next_stage(Stage::Parsing, &ctx), Stage::Categorizing);
        assert_eq!(next_stage(Stage::Categorizing, &ctx), Stage::BudgetChecking);
        assert_eq!(next_stage(Stage::BudgetChecking, &ctx), Stage::Alerting);
    }

    #[test]
    fn test_alerts_select_advisor_branch() {
        let mut ctx = extracted_ctx();
        assert_eq!(next_stage(Stage::Alerting, &ctx), Stage::InsightBranch);
        ctx.alerts.push("You exceeded budget for Food".into());
        assert_eq!(next_stage(Stage::Alerting, &ctx), Stage::AdvisorBranch);
    }

    #[test]
    fn test_branches_converge_on_predicting() {
        let ctx = extracted_ctx();
        assert_eq!(next_stage(Stage::AdvisorBranch, &ctx), Stage::Predicting);
        assert_eq!(next_stage(Stage::InsightBranch, &ctx), Stage::Predicting);
        assert_eq!(next_stage(Stage::Predicting, &ctx), Stage::Done);
    }

    #[test]
    fn test_error_is_absorbing() {
        let mut ctx = TransactionContext::new("Your OTP is ABCDE");
        ctx.fail("Could not detect transaction amount.");
        for stage in [
            Stage::Parsing,
            Stage::Categorizing,
            Stage::BudgetChecking,
            Stage::Alerting,
            Stage::AdvisorBranch,
            Stage::InsightBranch,
            Stage::Predicting,
            Stage::Failed,
        ] {
            assert_eq!(next_stage(stage, &ctx), Stage::Failed, "{stage:?}");
        }
    }

    #[test]
    fn test_terminal_stages_stay_put() {
        let ctx = extracted_ctx();
        assert_eq!(next_stage(Stage::Done, &ctx), Stage::Done);
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Predicting.is_terminal());
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, Error>(1)
        };
        let err = bounded("slow thing", Duration::from_millis(10), slow).await.unwrap_err();
        assert_eq!(
            err,
            Error::Timeout {
                dependency: "slow thing",
                timeout_ms: 10
            }
        );
    }
}
