//! Currency rounding helpers

use bigdecimal::rounding::RoundingMode;
use bigdecimal::BigDecimal;

/// Round to currency precision (2 decimal places, half-up).
pub fn round_cents(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// One cent, the difference below which two rounded amounts are considered
/// equal.
pub fn one_cent() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents_half_up() {
        let value = BigDecimal::from(12345) / BigDecimal::from(1000); // 12.345
        assert_eq!(round_cents(&value), BigDecimal::from(1235) / BigDecimal::from(100));

        let negative = BigDecimal::from(-12345) / BigDecimal::from(1000);
        assert_eq!(
            round_cents(&negative),
            BigDecimal::from(-1235) / BigDecimal::from(100)
        );
    }

    #[test]
    fn test_round_cents_no_op_on_exact_values() {
        let value = BigDecimal::from(110);
        assert_eq!(round_cents(&value), BigDecimal::from(110));
    }
}
