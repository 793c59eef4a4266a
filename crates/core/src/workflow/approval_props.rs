//! Property-based tests for ApprovalEngine.
//!
//! Rule selection must always pick the highest threshold not above the
//! amount, and never a rule without steps.

use proptest::prelude::*;
use rust_decimal::Decimal;

use expenseflow_shared::types::{ApprovalRuleId, ApprovalStepId, UserId};

use crate::workflow::approval::{ApprovalEngine, ApprovalRule, ApprovalStep};

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating a catalog of (threshold, step count) pairs.
fn arb_catalog() -> impl Strategy<Value = Vec<(Decimal, usize)>> {
    prop::collection::vec(((0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2)), 0usize..4), 0..8)
}

fn build(catalog: &[(Decimal, usize)]) -> Vec<ApprovalRule> {
    catalog
        .iter()
        .enumerate()
        .map(|(i, (min_amount, step_count))| {
            let id = ApprovalRuleId::new();
            ApprovalRule {
                id,
                name: format!("rule-{i}"),
                min_amount: *min_amount,
                steps: (0..*step_count)
                    .map(|n| ApprovalStep {
                        id: ApprovalStepId::new(),
                        rule_id: id,
                        approver_id: UserId::new(),
                        step_number: ApprovalEngine::next_step_number(n),
                    })
                    .collect(),
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The selected rule never has a threshold above the amount.
    #[test]
    fn prop_selected_threshold_not_above_amount(
        catalog in arb_catalog(),
        amount in arb_amount()
    ) {
        let rules = build(&catalog);
        if let Some(rule) = ApprovalEngine::find_applicable_rule(&rules, amount) {
            prop_assert!(rule.min_amount <= amount);
            prop_assert!(rule.has_steps());
        }
    }

    /// No matching rule has a strictly higher threshold than the selected one.
    #[test]
    fn prop_selected_threshold_is_highest_match(
        catalog in arb_catalog(),
        amount in arb_amount()
    ) {
        let rules = build(&catalog);
        let best = rules
            .iter()
            .filter(|r| r.min_amount <= amount)
            .map(|r| r.min_amount)
            .max();

        match ApprovalEngine::find_applicable_rule(&rules, amount) {
            Some(rule) => prop_assert_eq!(Some(rule.min_amount), best),
            None => {
                // Either nothing matched, or every best-threshold rule is empty.
                if let Some(best) = best {
                    prop_assert!(rules
                        .iter()
                        .filter(|r| r.min_amount == best)
                        .any(|r| !r.has_steps()));
                }
            }
        }
    }

    /// Selection does not depend on catalog order.
    #[test]
    fn prop_selection_is_order_independent(
        catalog in arb_catalog(),
        amount in arb_amount()
    ) {
        let rules = build(&catalog);
        let mut reversed = rules.clone();
        reversed.reverse();

        let forward = ApprovalEngine::find_applicable_rule(&rules, amount).map(|r| r.id);
        let backward = ApprovalEngine::find_applicable_rule(&reversed, amount).map(|r| r.id);
        prop_assert_eq!(forward, backward);
    }

    /// Steps appended one by one are numbered contiguously from 1.
    #[test]
    fn prop_step_numbers_contiguous(count in 0usize..50) {
        let numbers: Vec<i32> = (0..count).map(ApprovalEngine::next_step_number).collect();
        for (i, n) in numbers.iter().enumerate() {
            prop_assert_eq!(*n as usize, i + 1);
        }
    }
}
