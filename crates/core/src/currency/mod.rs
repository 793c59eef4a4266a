//! Normalization of expense amounts into the reference currency.
//!
//! The rate source is a collaborator behind [`ExchangeRateProvider`]; a missing
//! rate never fails a read, the amount is passed through unchanged.

pub mod exchange;
pub mod service;

#[cfg(test)]
mod props;

pub use exchange::{ExchangeRateProvider, StaticRateTable};
pub use service::CurrencyService;
