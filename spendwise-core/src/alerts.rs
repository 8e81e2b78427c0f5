//! Alert generation from the budget verdict

/// One alert when over budget, none otherwise.
pub fn generate(over_budget: bool, category: &str) -> Vec<String> {
    if over_budget {
        vec![format!("You exceeded budget for {category}")]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_over_budget_yields_single_alert() {
        let alerts = generate(true, "Food");
        assert_eq!(alerts, vec!["You exceeded budget for Food".to_string()]);
    }

    #[test]
    fn test_under_budget_yields_nothing() {
        assert!(generate(false, "Food").is_empty());
    }
}
