use rust_decimal::Decimal;

use crate::models::{DeliverySettings, DeliveryType};
use crate::pricing::PricingError;
use vitrine_core::round_money;

/// Delivery fee for an order subtotal.
///
/// Express delivery always costs `express_cost`, whatever the subtotal.
/// Ordinary delivery costs `regular_cost` below `free_threshold` and is free
/// from the threshold upward (the boundary itself ships free).
///
/// Missing settings are a hard failure: a silent default would misprice
/// every order.
pub fn delivery_fee(
    subtotal: Decimal,
    delivery_type: DeliveryType,
    settings: Option<&DeliverySettings>,
) -> Result<Decimal, PricingError> {
    let settings = settings.ok_or(PricingError::MissingDeliverySettings)?;

    let fee = match delivery_type {
        DeliveryType::Express => settings.express_cost,
        DeliveryType::Ordinary if subtotal < settings.free_threshold => settings.regular_cost,
        DeliveryType::Ordinary => Decimal::ZERO,
    };
    Ok(round_money(fee))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DeliverySettings {
        DeliverySettings::default() // 500 / 2000 / 200
    }

    #[test]
    fn express_overrides_the_threshold_rule() {
        let s = settings();
        for subtotal in [Decimal::ZERO, Decimal::from(1999), Decimal::from(100_000)] {
            assert_eq!(
                delivery_fee(subtotal, DeliveryType::Express, Some(&s)).unwrap(),
                Decimal::from(500)
            );
        }
    }

    #[test]
    fn threshold_boundary_is_inclusive_of_free_shipping() {
        let s = settings();

        let just_below = Decimal::from(2000) - Decimal::new(1, 2); // 1999.99
        assert_eq!(
            delivery_fee(just_below, DeliveryType::Ordinary, Some(&s)).unwrap(),
            Decimal::from(200)
        );
        assert_eq!(
            delivery_fee(Decimal::from(2000), DeliveryType::Ordinary, Some(&s)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn missing_settings_fail_loudly() {
        let err = delivery_fee(Decimal::from(100), DeliveryType::Ordinary, None).unwrap_err();
        assert_eq!(err, PricingError::MissingDeliverySettings);
    }

    #[test]
    fn worked_example_from_the_pricing_rules() {
        let s = settings();
        let subtotal = Decimal::from(1500);

        let ordinary = delivery_fee(subtotal, DeliveryType::Ordinary, Some(&s)).unwrap();
        assert_eq!(subtotal + ordinary, Decimal::from(1700));

        let express = delivery_fee(subtotal, DeliveryType::Express, Some(&s)).unwrap();
        assert_eq!(subtotal + express, Decimal::from(2000));
    }
}
