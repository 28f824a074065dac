pub mod lookup;
pub mod memory;
pub mod product;
pub mod review;

pub use lookup::{CatalogLookup, StockError};
pub use memory::InMemoryCatalog;
pub use product::{Product, ProductSnapshot};
pub use review::{RatingHook, RatingSummary, Review, ReviewError, ReviewManager};
