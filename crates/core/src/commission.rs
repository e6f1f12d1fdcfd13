//! Commission rate and earnings calculation.
//!
//! The base rate is 10% of the project estimate. The backend attributes the
//! real commission; the portal only uses this for the landing page calculator
//! and as the default an admin gets when approving a lead.

use rust_decimal::Decimal;

/// Base commission rate (10%).
pub const COMMISSION_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Commission earned on an estimate at the base rate, rounded to kopecks.
///
/// ```
/// use partner_portal_core::commission_for;
/// use rust_decimal::Decimal;
///
/// assert_eq!(commission_for(Decimal::new(500_000, 0)), Decimal::new(50_000, 0));
/// ```
#[must_use]
pub fn commission_for(estimate: Decimal) -> Decimal {
    (estimate * COMMISSION_RATE).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_is_ten_percent() {
        assert_eq!(COMMISSION_RATE, Decimal::new(1, 1));
    }

    #[test]
    fn test_calculator_presets() {
        for (estimate, expected) in [(100_000, 10_000), (300_000, 30_000), (500_000, 50_000)] {
            assert_eq!(
                commission_for(Decimal::new(estimate, 0)),
                Decimal::new(expected, 0)
            );
        }
    }

    #[test]
    fn test_rounds_to_two_places() {
        // 10% of 1234.567 = 123.4567
        assert_eq!(
            commission_for(Decimal::new(1_234_567, 3)),
            Decimal::new(12_346, 2)
        );
    }

    #[test]
    fn test_zero_estimate() {
        assert_eq!(commission_for(Decimal::ZERO), Decimal::ZERO);
    }
}
