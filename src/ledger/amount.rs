//! Overflow-safe arithmetic over money amounts.

use rust_decimal::Decimal;

/// Sums `amounts`, saturating at the representable bounds.
pub fn total(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// `minuend - subtrahend`, saturating at the representable bounds.
pub fn difference(minuend: Decimal, subtrahend: Decimal) -> Decimal {
    minuend.saturating_sub(subtrahend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        assert_eq!(total([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert_eq!(total([dec!(10.50), dec!(0.25)]), dec!(10.75));
        assert_eq!(total(Vec::new()), Decimal::ZERO);
        assert_eq!(difference(Decimal::MIN, Decimal::MAX), Decimal::MIN);
        assert_eq!(difference(dec!(500), dec!(350)), dec!(150));
    }
}
