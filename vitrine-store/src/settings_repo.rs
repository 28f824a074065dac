use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use vitrine_core::BoxError;
use vitrine_order::{DeliverySettings, DeliverySettingsSource};

/// Loads the single delivery-settings row. No row means no settings; the
/// pricing layer turns that into a hard error rather than defaulting.
pub struct PgDeliverySettings {
    pool: PgPool,
}

impl PgDeliverySettings {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    express_cost: Decimal,
    free_threshold: Decimal,
    regular_cost: Decimal,
}

#[async_trait]
impl DeliverySettingsSource for PgDeliverySettings {
    async fn load(&self) -> Result<Option<DeliverySettings>, BoxError> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT express_cost, free_threshold, regular_cost FROM delivery_settings LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| DeliverySettings {
            express_cost: row.express_cost,
            free_threshold: row.free_threshold,
            regular_cost: row.regular_cost,
        }))
    }
}
