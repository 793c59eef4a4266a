//! Exchange rate lookup.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// Source of multipliers into a single reference currency.
pub trait ExchangeRateProvider: Send + Sync {
    /// Reference currency code every rate converts into.
    fn reference_currency(&self) -> &str;

    /// Multiplier such that `amount * rate` is in the reference currency.
    ///
    /// Returns `None` when no rate is known for `currency`.
    fn rate_to_reference(&self, currency: &str) -> Option<Decimal>;
}

/// Fixed rate table, typically loaded from configuration.
#[derive(Debug, Clone)]
pub struct StaticRateTable {
    reference: String,
    rates: HashMap<String, Decimal>,
}

impl StaticRateTable {
    /// Creates a table. Currency codes are matched case-insensitively.
    #[must_use]
    pub fn new(reference: impl Into<String>, rates: HashMap<String, Decimal>) -> Self {
        Self {
            reference: reference.into().to_uppercase(),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.to_uppercase(), rate))
                .collect(),
        }
    }
}

impl ExchangeRateProvider for StaticRateTable {
    fn reference_currency(&self) -> &str {
        &self.reference
    }

    fn rate_to_reference(&self, currency: &str) -> Option<Decimal> {
        let code = currency.to_uppercase();
        if code == self.reference {
            return Some(Decimal::ONE);
        }
        self.rates.get(&code).copied()
    }
}
