use chrono::{DateTime, Utc};

use crate::{
    domain::{MessageToken, PendingMessage, UserId},
    Result,
};

/// Hexagonal port for the pending-message store.
///
/// The base contract is insert + lookup only; stored messages are immutable.
/// `purge_older_than` exists solely for the optional retention knob.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message. A token collision must surface as
    /// `Error::Conflict` so the caller can regenerate and retry; it must
    /// never overwrite the existing row.
    async fn insert(&self, message: &PendingMessage) -> Result<()>;

    /// Read-only lookup. `None` is a normal outcome (stale or fabricated
    /// token), not an error.
    async fn get(&self, token: &MessageToken) -> Result<Option<PendingMessage>>;

    /// Delete messages created before `cutoff`. Returns how many were removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// Hexagonal port for per-author rejection-text overrides.
#[async_trait::async_trait]
pub trait OverrideStore: Send + Sync {
    /// The author's override, or `None` when unset / reset to default.
    async fn get_override(&self, author: UserId) -> Result<Option<String>>;

    /// Upsert. `None` resets to default (kept distinct from an empty string).
    async fn set_override(&self, author: UserId, text: Option<&str>) -> Result<()>;
}
