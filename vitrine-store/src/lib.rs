pub mod app_config;
pub mod basket_repo;
pub mod catalog_repo;
pub mod database;
pub mod order_repo;
pub mod settings_repo;

pub use app_config::AppConfig;
pub use basket_repo::PgBasketStore;
pub use catalog_repo::PgCatalog;
pub use database::DbClient;
pub use order_repo::PgOrderRepository;
pub use settings_repo::PgDeliverySettings;
