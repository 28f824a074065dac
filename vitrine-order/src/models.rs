use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrine_core::{round_money, OwnerId};

/// Order status in the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Allowed transitions: pending_payment → paid → shipped → delivered,
    /// with cancellation possible until the order ships.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (PendingPayment, Paid)
                | (Paid, Shipped)
                | (Shipped, Delivered)
                | (PendingPayment, Cancelled)
                | (Paid, Cancelled)
        )
    }
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(OrderStatus::PendingPayment),
            "PAID" => Ok(OrderStatus::Paid),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Ordinary,
    Express,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryType::Ordinary => "ordinary",
            DeliveryType::Express => "express",
        }
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordinary" => Ok(DeliveryType::Ordinary),
            "express" => Ok(DeliveryType::Express),
            other => Err(format!("unknown delivery type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Paid online by the order's owner.
    Online,
    /// Paid online from someone else's account.
    Someone,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentType::Online => "online",
            PaymentType::Someone => "someone",
        }
    }
}

impl std::str::FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PaymentType::Online),
            "someone" => Ok(PaymentType::Someone),
            other => Err(format!("unknown payment type: {other}")),
        }
    }
}

/// One product within an order, with the price frozen at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    /// Always ≥ 1; the assembler rejects zero-quantity lines.
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// A persisted, priced collection of line items belonging to one owner.
///
/// Immutable after creation except for status transitions and pre-payment
/// edits; an edit replaces the whole line set and re-derives `total_cost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub owner: OwnerId,
    pub created_at: DateTime<Utc>,
    pub delivery_type: DeliveryType,
    pub payment_type: PaymentType,
    pub city: String,
    pub address: String,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    /// Subtotal plus delivery fee, rounded to two decimal places.
    pub total_cost: Decimal,
}

impl Order {
    /// Display subtotal for this order's items. A draft without items
    /// reports zero; order *creation* still refuses empty line sets.
    /// Sums the same per-line totals the pricing engine uses, so display
    /// and stored amounts never diverge.
    pub fn subtotal(&self) -> Decimal {
        round_money(self.items.iter().map(crate::pricing::line_total).sum())
    }
}

/// Process-wide delivery pricing knobs, kept as a single settings record.
/// Loaded per pricing computation; absence is a hard error, never a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliverySettings {
    pub express_cost: Decimal,
    pub free_threshold: Decimal,
    pub regular_cost: Decimal,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            express_cost: Decimal::from(500),
            free_threshold: Decimal::from(2000),
            regular_cost: Decimal::from(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use OrderStatus::*;

        assert!(PendingPayment.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(PendingPayment.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Cancelled));

        assert!(!PendingPayment.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(PendingPayment));
        assert!(!Paid.can_transition_to(PendingPayment));
    }

    fn order_with(items: Vec<LineItem>) -> Order {
        Order {
            id: Uuid::new_v4(),
            owner: OwnerId::User(Uuid::new_v4()),
            created_at: Utc::now(),
            delivery_type: DeliveryType::Ordinary,
            payment_type: PaymentType::Online,
            city: String::new(),
            address: String::new(),
            status: OrderStatus::PendingPayment,
            items,
            total_cost: Decimal::ZERO,
        }
    }

    #[test]
    fn draft_order_reports_zero_subtotal() {
        assert_eq!(order_with(Vec::new()).subtotal(), Decimal::ZERO);
    }

    #[test]
    fn display_subtotal_matches_the_pricing_engine() {
        // Two lines of 1 × 0.125: each line rounds half-up to 0.13 before
        // summing, so both paths must report 0.26.
        let items = vec![
            LineItem {
                product_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: Decimal::new(125, 3),
            },
            LineItem {
                product_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: Decimal::new(125, 3),
            },
        ];
        let order = order_with(items.clone());

        assert_eq!(order.subtotal(), Decimal::new(26, 2));
        assert_eq!(
            order.subtotal(),
            crate::pricing::order_subtotal(&items).unwrap()
        );
    }
}
