//! Ruble amounts and their ru-RU rendering.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Digit group separator used by the ru-RU locale (no-break space).
pub const GROUP_SEPARATOR: char = '\u{a0}';

/// A ruble amount.
///
/// Displays the way the ru-RU locale formats currency: digits grouped by
/// three with a no-break space, a comma before the fraction, at most two
/// fractional digits and trailing zeros dropped.
///
/// ```
/// use partner_portal_core::Rubles;
/// use rust_decimal::Decimal;
///
/// assert_eq!(Rubles(Decimal::new(50_000, 0)).to_string(), "50\u{a0}000\u{a0}₽");
/// assert_eq!(Rubles(Decimal::new(12_345, 1)).to_string(), "1\u{a0}234,5\u{a0}₽");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rubles(pub Decimal);

impl Rubles {
    /// The amount without the currency sign.
    #[must_use]
    pub fn amount_text(&self) -> String {
        let rounded = self.0.round_dp(2).normalize();
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = rounded.abs().to_string();

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (digits.as_str(), None),
        };

        let mut out = String::with_capacity(digits.len() + 8);
        if negative {
            out.push('-');
        }
        out.push_str(&group_thousands(whole));
        if let Some(fraction) = fraction {
            out.push(',');
            out.push_str(fraction);
        }
        out
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl From<Decimal> for Rubles {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Rubles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{GROUP_SEPARATOR}₽", self.amount_text())
    }
}

/// Insert a group separator every three digits, counting from the right.
fn group_thousands(whole: &str) -> String {
    let len = whole.chars().count();
    let mut out = String::with_capacity(len + len / 3 * 2);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rub(num: i64, scale: u32) -> String {
        Rubles(Decimal::new(num, scale)).to_string()
    }

    #[test]
    fn test_small_amounts_are_not_grouped() {
        assert_eq!(rub(0, 0), "0\u{a0}₽");
        assert_eq!(rub(999, 0), "999\u{a0}₽");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(rub(1000, 0), "1\u{a0}000\u{a0}₽");
        assert_eq!(rub(500_000, 0), "500\u{a0}000\u{a0}₽");
        assert_eq!(rub(1_234_567, 0), "1\u{a0}234\u{a0}567\u{a0}₽");
    }

    #[test]
    fn test_fraction_is_rounded_and_trimmed() {
        assert_eq!(rub(500_000, 2), "5\u{a0}000\u{a0}₽");
        assert_eq!(rub(123_456, 3), "123,46\u{a0}₽");
        assert_eq!(rub(1050, 2), "10,5\u{a0}₽");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(rub(-25_000, 0), "-25\u{a0}000\u{a0}₽");
    }

    #[test]
    fn test_is_positive() {
        assert!(Rubles(Decimal::new(1, 2)).is_positive());
        assert!(!Rubles(Decimal::ZERO).is_positive());
        assert!(!Rubles(Decimal::new(-1, 0)).is_positive());
    }
}
