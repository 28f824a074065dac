pub mod identity;
pub mod money;

pub use identity::OwnerId;
pub use money::round_money;

/// Error type used at repository/collaborator seams; domain layers map it
/// into their own typed errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
