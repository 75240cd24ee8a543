//! Rejection-text registry: per-author override of the default rejection
//! text shown to excluded viewers.

use std::sync::Arc;

use crate::{domain::UserId, ports::OverrideStore, Error, Result};

/// Shown to excluded viewers when the author has not configured an override.
pub const DEFAULT_REJECTION_TEXT: &str = "🚫 Это сообщение не для тебя";

/// Upper bound on override text, in characters.
pub const MAX_OVERRIDE_LEN: usize = 200;

pub struct RejectionRegistry {
    store: Arc<dyn OverrideStore>,
}

impl RejectionRegistry {
    pub fn new(store: Arc<dyn OverrideStore>) -> Self {
        Self { store }
    }

    /// The text an excluded viewer of `author`'s messages sees right now.
    pub async fn rejection_text(&self, author: UserId) -> Result<String> {
        let over = self.store.get_override(author).await?;
        Ok(over.unwrap_or_else(|| DEFAULT_REJECTION_TEXT.to_string()))
    }

    pub async fn is_custom(&self, author: UserId) -> Result<bool> {
        Ok(self.store.get_override(author).await?.is_some())
    }

    /// Set the author's override. Over-long input is rejected and the stored
    /// value is left untouched.
    pub async fn set(&self, author: UserId, text: &str) -> Result<()> {
        let len = text.chars().count();
        if len > MAX_OVERRIDE_LEN {
            return Err(Error::TextTooLong {
                len,
                max: MAX_OVERRIDE_LEN,
            });
        }
        self.store.set_override(author, Some(text)).await
    }

    /// Reset to the default text (stores NULL, not an empty string).
    pub async fn reset(&self, author: UserId) -> Result<()> {
        self.store.set_override(author, None).await
    }
}
