use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Telegram user id (numeric). Used as the author principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// A case-insensitive recipient handle, stored lowercase.
///
/// Handles are platform-assigned (`@username`); a viewer without one can
/// never match an exclusion.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle(String);

impl Handle {
    pub fn new(raw: &str) -> Self {
        Self(raw.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to one pending scoped message.
///
/// A full UUIDv4 in simple form (32 hex chars): URL-safe, fits Telegram's
/// 64-byte callback-data budget alongside a short prefix, and carries enough
/// entropy that a collision among live references is negligible.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageToken(pub String);

impl MessageToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One stored scoped message. Immutable after creation; looked up by token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMessage {
    pub token: MessageToken,
    pub author: UserId,
    pub body: String,
    /// Lowercase, de-duplicated, in first-occurrence order.
    pub excluded: Vec<Handle>,
    pub created_at: DateTime<Utc>,
}

impl PendingMessage {
    pub fn is_excluded(&self, handle: &Handle) -> bool {
        self.excluded.contains(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_normalizes_to_lowercase() {
        assert_eq!(Handle::new("VaSya_99").as_str(), "vasya_99");
        assert_eq!(Handle::new("vasya_99"), Handle::new("VASYA_99"));
    }

    #[test]
    fn token_is_url_safe_hex() {
        let t = MessageToken::generate();
        assert_eq!(t.as_str().len(), 32);
        assert!(t.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let a = MessageToken::generate();
        let b = MessageToken::generate();
        assert_ne!(a, b);
    }
}
