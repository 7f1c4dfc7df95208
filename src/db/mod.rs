//! Persistence layer (per-user key-value documents).

pub mod file;
pub mod memory;
pub mod user_store;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use user_store::UserStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Recent sessions, newest first
    pub const SESSIONS: &str = "sessions";
    /// Every completed session without its route, newest first
    pub const SESSION_HISTORY: &str = "session_history";
    pub const LEDGER: &str = "ledger";
    /// Unlocked achievement ids with their unlock dates
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const PLACED_ITEMS: &str = "placed_items";
    /// Sessions whose upload failed, keyed by session id
    pub const PENDING_UPLOADS: &str = "pending_uploads";
}

/// Build the namespaced key for a user's collection.
pub fn user_key(user_id: &str, collection: &str) -> String {
    format!("{}/{}/{}", collections::USERS, user_id, collection)
}

/// Minimal document store the tracker persists into.
///
/// Values are JSON strings. Calls are synchronous and may block on local
/// disk; they must never make network round-trips. The tracker actor calls
/// the store inline on its own task, while spawned upload tasks go through
/// `tokio::task::spawn_blocking`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&self, key: &str, value: String) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Errors from the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl From<StoreError> for crate::error::TrackerError {
    fn from(e: StoreError) -> Self {
        crate::error::TrackerError::Store(e.to_string())
    }
}
