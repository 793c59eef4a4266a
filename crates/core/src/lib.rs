//! Core business logic for ExpenseFlow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Rule selection, the approval state machine, currency normalization and the
//! user-role invariants live here; persistence calls into these functions
//! inside its transactions.
//!
//! # Modules
//!
//! - `workflow` - Approval rules, step advancement, terminal transitions
//! - `currency` - Normalization of amounts into the reference currency
//! - `user` - Roles and the single-admin invariant

pub mod currency;
pub mod user;
pub mod workflow;
