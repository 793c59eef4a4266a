//! Property-based tests for WorkflowService.
//!
//! Walks random approval chains through random decision sequences and checks
//! the state machine never skips a step or leaves a terminal state.

use proptest::prelude::*;

use expenseflow_shared::types::{ApprovalRuleId, ApprovalStepId, UserId};

use crate::workflow::approval::{ApprovalEngine, ApprovalStep};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::{DecisionOutcome, WorkflowService};
use crate::workflow::types::{Decision, ExpenseStatus};

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approved), Just(Decision::Rejected)]
}

fn chain(len: usize) -> Vec<ApprovalStep> {
    let rule_id = ApprovalRuleId::new();
    (0..len)
        .map(|i| ApprovalStep {
            id: ApprovalStepId::new(),
            rule_id,
            approver_id: UserId::new(),
            step_number: ApprovalEngine::next_step_number(i),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving every step visits each step exactly once, in order.
    #[test]
    fn prop_full_approval_visits_every_step(len in 1usize..8) {
        let steps = chain(len);
        let mut current = steps[0];
        let mut visited = vec![current.step_number];

        loop {
            match WorkflowService::decide(&current, &steps, current.approver_id, Decision::Approved) {
                Ok(DecisionOutcome::Advance { next }) => {
                    prop_assert_eq!(next.step_number, current.step_number + 1);
                    visited.push(next.step_number);
                    current = next;
                }
                Ok(DecisionOutcome::Finalize { status }) => {
                    prop_assert_eq!(status, ExpenseStatus::Approved);
                    break;
                }
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }

        let expected: Vec<i32> = (1..=len).map(|n| n as i32).collect();
        prop_assert_eq!(visited, expected);
    }

    /// A random decision sequence ends in exactly one terminal outcome, and a
    /// rejection always ends it.
    #[test]
    fn prop_decision_sequence_terminates(
        len in 1usize..8,
        decisions in prop::collection::vec(arb_decision(), 8)
    ) {
        let steps = chain(len);
        let mut current = steps[0];

        for decision in decisions {
            let outcome = WorkflowService::decide(&current, &steps, current.approver_id, decision)
                .expect("current approver may always decide");
            match outcome {
                DecisionOutcome::Advance { next } => {
                    prop_assert_eq!(decision, Decision::Approved);
                    current = next;
                }
                DecisionOutcome::Finalize { status } => {
                    if decision == Decision::Rejected {
                        prop_assert_eq!(status, ExpenseStatus::Rejected);
                    } else {
                        prop_assert_eq!(status, ExpenseStatus::Approved);
                        prop_assert_eq!(current.step_number as usize, len);
                    }
                    return Ok(());
                }
            }
        }
        // Eight approvals can only run out on a chain longer than eight.
        prop_assert!(false, "chain of {len} never finished");
    }

    /// Only the current step's approver may decide.
    #[test]
    fn prop_non_current_approver_forbidden(
        len in 2usize..8,
        pick in 0usize..8,
        decision in arb_decision()
    ) {
        let steps = chain(len);
        let other = steps[1 + pick % (len - 1)].approver_id;

        let result = WorkflowService::decide(&steps[0], &steps, other, decision);
        prop_assert!(
            matches!(result, Err(WorkflowError::Forbidden { user_id }) if user_id == other),
            "expected Forbidden"
        );
    }
}
