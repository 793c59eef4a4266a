//! Currency service for normalization into the reference currency.
//!
//! Converted amounts use Banker's Rounding (MidpointNearestEven) at 4 decimal
//! places.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::currency::exchange::ExchangeRateProvider;

/// Currency service for conversion operations.
pub struct CurrencyService;

impl CurrencyService {
    /// Convert amount using exchange rate with Banker's Rounding.
    ///
    /// Returns `None` when the product does not fit in a `Decimal`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use expenseflow_core::currency::CurrencyService;
    ///
    /// let result = CurrencyService::convert(dec!(100), dec!(1.5));
    /// assert_eq!(result, Some(dec!(150.0000)));
    /// ```
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(rate)
            .map(|v| v.round_dp_with_strategy(4, RoundingStrategy::MidpointNearestEven))
    }

    /// Normalizes `amount` in `currency` into the provider's reference currency.
    ///
    /// A currency without a known rate is treated as a multiplier of 1, and so
    /// is a conversion that would overflow.
    #[must_use]
    pub fn normalize(
        amount: Decimal,
        currency: &str,
        provider: &dyn ExchangeRateProvider,
    ) -> Decimal {
        match provider.rate_to_reference(currency) {
            Some(rate) if rate != Decimal::ONE => Self::convert(amount, rate).unwrap_or(amount),
            _ => amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::exchange::StaticRateTable;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn table() -> StaticRateTable {
        StaticRateTable::new("INR", HashMap::from([("USD".to_string(), dec!(83.50))]))
    }

    #[test]
    fn test_convert_basic() {
        let result = CurrencyService::convert(dec!(100), dec!(1.5));
        assert_eq!(result, Some(dec!(150.0000)));
    }

    #[test]
    fn test_convert_overflow_is_none() {
        assert_eq!(CurrencyService::convert(Decimal::MAX, dec!(83.50)), None);
    }

    #[test]
    fn test_convert_rounds_to_4_decimals() {
        // 100 * 1.23456789 = 123.456789 → rounds to 123.4568
        let result = CurrencyService::convert(dec!(100), dec!(1.23456789));
        assert_eq!(result, Some(dec!(123.4568)));
    }

    #[test]
    fn test_normalize_known_rate() {
        let result = CurrencyService::normalize(dec!(200), "USD", &table());
        assert_eq!(result, dec!(16700));
    }

    #[test]
    fn test_normalize_reference_passthrough() {
        let result = CurrencyService::normalize(dec!(200.55), "INR", &table());
        assert_eq!(result, dec!(200.55));
    }

    #[test]
    fn test_normalize_overflow_passthrough() {
        let huge = Decimal::MAX / dec!(10);
        let result = CurrencyService::normalize(huge, "USD", &table());
        assert_eq!(result, huge);
    }

    #[test]
    fn test_normalize_missing_rate_passthrough() {
        let result = CurrencyService::normalize(dec!(42.10), "JPY", &table());
        assert_eq!(result, dec!(42.10));
    }
}
