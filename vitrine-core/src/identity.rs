use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who owns a basket or an order: an authenticated user or an anonymous
/// session. Whether anonymous owners may check out is the calling surface's
/// policy; storage and pricing treat both kinds alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum OwnerId {
    User(Uuid),
    Session(String),
}

impl OwnerId {
    /// Stable key used for basket/order storage lookups.
    pub fn storage_key(&self) -> String {
        match self {
            OwnerId::User(id) => format!("user:{}", id),
            OwnerId::Session(token) => format!("session:{}", token),
        }
    }

    /// Inverse of [`storage_key`](Self::storage_key), for rows read back
    /// from storage.
    pub fn from_storage_key(key: &str) -> Option<Self> {
        if let Some(id) = key.strip_prefix("user:") {
            return Uuid::parse_str(id).ok().map(OwnerId::User);
        }
        key.strip_prefix("session:")
            .map(|token| OwnerId::Session(token.to_string()))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, OwnerId::User(_))
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_key())
    }
}
