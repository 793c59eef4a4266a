//! Property-based tests for currency normalization.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::exchange::StaticRateTable;
use super::service::CurrencyService;

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Unknown currencies pass through unchanged.
    #[test]
    fn prop_missing_rate_is_identity(amount in positive_amount()) {
        let table = StaticRateTable::new("INR", HashMap::new());
        prop_assert_eq!(CurrencyService::normalize(amount, "XYZ", &table), amount);
    }

    /// Normalizing is the rounded product of amount and rate.
    #[test]
    fn prop_known_rate_is_rounded_product(amount in positive_amount(), rate in positive_rate()) {
        let table = StaticRateTable::new("INR", HashMap::from([("USD".to_string(), rate)]));
        let normalized = CurrencyService::normalize(amount, "USD", &table);
        prop_assert!((normalized - amount * rate).abs() <= Decimal::new(5, 5));
        prop_assert!(normalized.scale() <= 4);
    }
}
