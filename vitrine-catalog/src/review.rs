use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer review of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub author: String,
    pub email: String,
    pub text: String,
    /// 1 through 5.
    pub rate: u8,
    pub created_at: DateTime<Utc>,
}

/// Aggregate the catalog displays next to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingSummary {
    pub rating: Decimal,
    pub reviews_count: u32,
}

/// Invoked after a review write commits, with the recomputed aggregate.
///
/// The write path calls this explicitly rather than wiring a listener into
/// the persistence layer, so the side effect is visible at the call site.
pub trait RatingHook: Send + Sync {
    fn rating_changed(&self, product_id: Uuid, summary: RatingSummary);
}

impl<H: RatingHook + ?Sized> RatingHook for std::sync::Arc<H> {
    fn rating_changed(&self, product_id: Uuid, summary: RatingSummary) {
        (**self).rating_changed(product_id, summary);
    }
}

/// Stores reviews and keeps product rating aggregates current through the
/// post-commit hook.
pub struct ReviewManager<H: RatingHook> {
    reviews: RwLock<HashMap<Uuid, Vec<Review>>>,
    hook: H,
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("rate must be between 1 and 5, got {0}")]
    RateOutOfRange(u8),

    #[error("review not found: {0}")]
    NotFound(Uuid),
}

impl<H: RatingHook> ReviewManager<H> {
    pub fn new(hook: H) -> Self {
        Self {
            reviews: RwLock::new(HashMap::new()),
            hook,
        }
    }

    pub fn add_review(
        &self,
        product_id: Uuid,
        author: impl Into<String>,
        email: impl Into<String>,
        text: impl Into<String>,
        rate: u8,
    ) -> Result<Review, ReviewError> {
        if !(1..=5).contains(&rate) {
            return Err(ReviewError::RateOutOfRange(rate));
        }

        let review = Review {
            id: Uuid::new_v4(),
            product_id,
            author: author.into(),
            email: email.into(),
            text: text.into(),
            rate,
            created_at: Utc::now(),
        };

        let summary = {
            let mut reviews = self.reviews.write().expect("review lock poisoned");
            let entries = reviews.entry(product_id).or_default();
            entries.push(review.clone());
            summarize(entries)
        };

        self.hook.rating_changed(product_id, summary);
        Ok(review)
    }

    pub fn remove_review(&self, product_id: Uuid, review_id: Uuid) -> Result<(), ReviewError> {
        let summary = {
            let mut reviews = self.reviews.write().expect("review lock poisoned");
            let entries = reviews
                .get_mut(&product_id)
                .ok_or(ReviewError::NotFound(review_id))?;
            let before = entries.len();
            entries.retain(|r| r.id != review_id);
            if entries.len() == before {
                return Err(ReviewError::NotFound(review_id));
            }
            summarize(entries)
        };

        self.hook.rating_changed(product_id, summary);
        Ok(())
    }

    pub fn reviews_for(&self, product_id: Uuid) -> Vec<Review> {
        self.reviews
            .read()
            .expect("review lock poisoned")
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn summarize(reviews: &[Review]) -> RatingSummary {
    if reviews.is_empty() {
        return RatingSummary {
            rating: Decimal::ZERO,
            reviews_count: 0,
        };
    }

    let sum: Decimal = reviews.iter().map(|r| Decimal::from(r.rate)).sum();
    let mean = sum / Decimal::from(reviews.len() as u32);

    RatingSummary {
        rating: mean.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
        reviews_count: reviews.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;
    use crate::product::Product;
    use std::sync::Arc;

    struct NullHook;

    impl RatingHook for NullHook {
        fn rating_changed(&self, _product_id: Uuid, _summary: RatingSummary) {}
    }

    #[test]
    fn rejects_out_of_range_rate() {
        let manager = ReviewManager::new(NullHook);
        let err = manager
            .add_review(Uuid::new_v4(), "ann", "ann@example.com", "meh", 0)
            .unwrap_err();
        assert!(matches!(err, ReviewError::RateOutOfRange(0)));
    }

    #[test]
    fn saving_reviews_updates_product_aggregate() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let product_id = catalog.insert(Product::new("Desk", Decimal::new(9900, 2), 3));
        let manager = ReviewManager::new(Arc::clone(&catalog));

        manager
            .add_review(product_id, "ann", "ann@example.com", "great", 5)
            .unwrap();
        manager
            .add_review(product_id, "bob", "bob@example.com", "okay", 4)
            .unwrap();

        let product = catalog.get(&product_id).unwrap();
        assert_eq!(product.reviews_count, 2);
        assert_eq!(product.rating, Decimal::new(45, 1)); // (5 + 4) / 2

        let review = manager.reviews_for(product_id)[0].clone();
        manager.remove_review(product_id, review.id).unwrap();

        let product = catalog.get(&product_id).unwrap();
        assert_eq!(product.reviews_count, 1);
        assert_eq!(product.rating, Decimal::new(40, 1));
    }
}
