//! Text produced by the enrichment nodes: advisor prompt, insights, prediction.

use rust_decimal::Decimal;

use spendwise_core::TransactionContext;

/// Prompt for the advisor branch, built from what the run has learned so far.
pub fn advisor_prompt(ctx: &TransactionContext) -> String {
    format!(
        "You are a safe financial assistant.\n\n\
         Spending category: {}\n\
         Alerts: {}\n\
         Insights: {}\n\n\
         Give short budgeting advice.",
        ctx.category_or_default(),
        render_list(&ctx.alerts),
        render_list(&ctx.insights),
    )
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join("; ")
    }
}

/// Observation about where the money goes; empty when nothing is recorded yet.
pub fn insights(top_category: Option<(String, Decimal)>) -> Vec<String> {
    top_category
        .map(|(category, _)| vec![format!("Highest spending category is {category}")])
        .unwrap_or_default()
}

pub fn prediction(average: Decimal) -> String {
    format!("Next expense may be around {:.2}", average.round_dp(2))
}
