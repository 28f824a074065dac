pub mod assembler;
pub mod delivery;
pub mod memory;
pub mod models;
pub mod pricing;
pub mod repository;

pub use assembler::{OrderAssembler, OrderError, OrderRequest, PriceSource, RequestedLine};
pub use delivery::delivery_fee;
pub use memory::{InMemoryOrders, StaticDeliverySettings};
pub use models::{DeliverySettings, DeliveryType, LineItem, Order, OrderStatus, PaymentType};
pub use pricing::{line_total, order_subtotal, PricingError};
pub use repository::{DeliverySettingsSource, OrderRepository};
