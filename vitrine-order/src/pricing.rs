use rust_decimal::Decimal;

use crate::models::LineItem;
use vitrine_core::round_money;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("order must contain at least one line item")]
    EmptyOrder,

    #[error("delivery settings not configured")]
    MissingDeliverySettings,
}

/// Cost of one line: quantity × unit price, rounded half-up to 2 dp.
pub fn line_total(item: &LineItem) -> Decimal {
    round_money(Decimal::from(item.quantity) * item.unit_price)
}

/// Sum of line totals. An order is never priced empty; drafts that want a
/// display value use [`crate::models::Order::subtotal`] instead.
pub fn order_subtotal(items: &[LineItem]) -> Result<Decimal, PricingError> {
    if items.is_empty() {
        return Err(PricingError::EmptyOrder);
    }
    Ok(round_money(items.iter().map(line_total).sum()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn item(quantity: u32, unit_price: Decimal) -> LineItem {
        LineItem {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn line_total_is_quantity_times_price() {
        assert_eq!(
            line_total(&item(3, Decimal::new(19999, 2))),
            Decimal::new(59997, 2)
        );
    }

    #[test]
    fn subtotal_is_independent_of_line_order() {
        let a = item(2, Decimal::new(4950, 2));
        let b = item(1, Decimal::new(100000, 2));
        let c = item(5, Decimal::new(33, 2));

        let forward = order_subtotal(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = order_subtotal(&[c, b, a]).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward, Decimal::new(110065, 2)); // 99.00 + 1000.00 + 1.65
    }

    #[test]
    fn empty_order_cannot_be_priced() {
        assert_eq!(order_subtotal(&[]).unwrap_err(), PricingError::EmptyOrder);
    }

    #[test]
    fn fractional_products_round_half_up() {
        // 3 × 0.125 = 0.375, rounds to 0.38 rather than truncating.
        assert_eq!(
            line_total(&item(3, Decimal::new(125, 3))),
            Decimal::new(38, 2)
        );
    }
}
