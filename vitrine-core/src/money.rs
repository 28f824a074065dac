use rust_decimal::{Decimal, RoundingStrategy};

/// Round a money amount to two decimal places, half-up.
///
/// Every money boundary (line total, subtotal, delivery fee, order total)
/// goes through this so intermediate products cannot leak extra scale into
/// stored amounts.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
