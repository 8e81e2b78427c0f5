//! Plain-text rendering of command results.

use rust_decimal::Decimal;

use spendwise_core::AlertRecord;
use spendwise_finance::{BudgetStatus, CategoryTotal, RunOutcome, StoredTransaction};

pub fn outcome(out: &RunOutcome) -> String {
    if !out.ok {
        return format!("Error: {}\n", out.error.as_deref().unwrap_or("unknown error"));
    }
    let Some(ctx) = &out.transaction else {
        return String::new();
    };

    let mut s = String::from("# Transaction\n\n");
    if let Some(amount) = ctx.amount {
        s.push_str(&format!("Amount:   {amount:.2}\n"));
    }
    s.push_str(&format!("Merchant: {}\n", ctx.merchant.as_deref().unwrap_or("-")));
    s.push_str(&format!("Category: {}\n", ctx.category_or_default()));
    if let Some(mode) = ctx.payment_mode {
        s.push_str(&format!("Mode:     {mode}\n"));
    }
    if let Some(kind) = ctx.transaction_type {
        s.push_str(&format!("Type:     {kind}\n"));
    }

    s.push_str(&bullets("Alerts", &ctx.alerts));
    s.push_str(&bullets("Insights", &ctx.insights));
    if let Some(advice) = &out.advisor {
        s.push_str(&format!("\n## Advice\n\n{advice}\n"));
    }
    if let Some(prediction) = &ctx.prediction {
        s.push_str(&format!("\n{prediction}\n"));
    }
    s
}

/// Titled list; empty when there is nothing to show.
fn bullets(title: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let list: String = items.iter().map(|item| format!("- {item}\n")).collect();
    format!("\n## {title}\n\n{list}")
}

pub fn budgets(rows: &[BudgetStatus]) -> String {
    if rows.is_empty() {
        return "No budgets set. Try: spendwise budget set Food 5000\n".to_string();
    }
    rows.iter()
        .map(|b| {
            let flag = if b.is_over() { "  OVER" } else { "" };
            format!(
                "{:<14} limit={:>10.2} spent={:>10.2} remaining={:>10.2}{flag}\n",
                b.category,
                b.monthly_limit,
                b.spent,
                b.remaining()
            )
        })
        .collect()
}

pub fn summary(month_total: Decimal, by_category: &[CategoryTotal]) -> String {
    let mut s = format!("Spent this month: {month_total:.2}\n\n");
    if by_category.is_empty() {
        s.push_str("(no spend recorded)\n");
    }
    for c in by_category {
        s.push_str(&format!("{:<14} {:>10.2}\n", c.category, c.total));
    }
    s
}

pub fn transactions(rows: &[StoredTransaction]) -> String {
    if rows.is_empty() {
        return "(no transactions)\n".to_string();
    }
    rows.iter()
        .map(|t| {
            let r = &t.record;
            format!(
                "#{:<4} {} {:>10.2} {:<6} {:<20} {:<14} {}\n",
                t.id,
                r.timestamp.format("%Y-%m-%d %H:%M"),
                r.amount,
                r.transaction_type,
                r.merchant,
                r.category,
                r.payment_mode
            )
        })
        .collect()
}

pub fn alerts(rows: &[AlertRecord]) -> String {
    if rows.is_empty() {
        return "(no alerts)\n".to_string();
    }
    rows.iter()
        .map(|a| format!("{}  {}\n", a.created_at.format("%Y-%m-%d %H:%M"), a.message))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_shows_error_only() {
        let out = RunOutcome {
            ok: false,
            error: Some("Please paste a transaction message".into()),
            advisor: None,
            transaction: None,
        };
        assert_eq!(outcome(&out), "Error: Please paste a transaction message\n");
    }

    #[test]
    fn test_budget_over_flag() {
        let rows = vec![BudgetStatus {
            category: "Food".into(),
            monthly_limit: Decimal::from(1000),
            spent: Decimal::from(1100),
        }];
        let s = budgets(&rows);
        assert!(s.starts_with("Food"));
        assert!(s.contains("remaining=   -100.00"));
        assert!(s.trim_end().ends_with("OVER"));
    }

    #[test]
    fn test_empty_tables() {
        assert!(budgets(&[]).contains("budget set"));
        assert!(summary(Decimal::ZERO, &[]).contains("Spent this month: 0.00"));
        assert_eq!(alerts(&[]), "(no alerts)\n");
    }

    #[test]
    fn test_outcome_sections() {
        let mut ctx = spendwise_core::TransactionContext::new("Rs 50 paid to Swiggy");
        ctx.amount = Some(Decimal::from(50));
        ctx.merchant = Some("Swiggy".into());
        ctx.category = Some("Food".into());
        ctx.alerts = vec!["Over budget in Food".into()];
        ctx.prediction = Some("Next expense may be around 50.00".into());
        let out = RunOutcome {
            ok: true,
            error: None,
            advisor: Some("Cook at home.".into()),
            transaction: Some(ctx),
        };
        assert_eq!(
            outcome(&out),
            "# Transaction\n\nAmount:   50.00\nMerchant: Swiggy\nCategory: Food\n\
             \n## Alerts\n\n- Over budget in Food\n\
             \n## Advice\n\nCook at home.\n\
             \nNext expense may be around 50.00\n"
        );
    }

    #[test]
    fn test_summary_rows() {
        let rows = vec![CategoryTotal {
            category: "Food".into(),
            total: Decimal::from(250),
        }];
        assert_eq!(
            summary(Decimal::from(250), &rows),
            "Spent this month: 250.00\n\nFood               250.00\n"
        );
    }
}
