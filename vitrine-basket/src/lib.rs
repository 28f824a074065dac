pub mod basket;
pub mod memory;

pub use basket::{BasketChange, BasketEntry, BasketError, BasketManager, BasketStore};
pub use memory::InMemoryBasket;
