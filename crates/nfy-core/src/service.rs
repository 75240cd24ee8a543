//! Compose pipeline and the per-viewer access decision engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    domain::{Handle, MessageToken, PendingMessage, UserId},
    formatting,
    parse::{self, ParseError},
    ports::MessageStore,
    registry::RejectionRegistry,
    Error, Result,
};

/// Bound on token regeneration after a store collision. With 122 bits of
/// token entropy a single retry is already astronomically unlikely.
const TOKEN_RETRY_LIMIT: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] Error),
}

/// Preview artifact handed to the integration layer: the stored message plus
/// the short texts for the inline result card.
#[derive(Clone, Debug)]
pub struct ComposedPreview {
    pub message: PendingMessage,
    pub title: String,
    pub description: String,
}

/// Outcome of one reveal request. Terminal and single-shot; the engine keeps
/// no session state between calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Unknown, forged, or over-age reference.
    Expired,
    /// The viewer is excluded; show the author's rejection text instead.
    Denied(String),
    /// The viewer is authorized; show the real body.
    Granted(String),
}

/// The application service: owns the storage ports and makes every
/// compose / reveal / override decision. Constructed once at startup and
/// shared by reference across request handlers.
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    registry: RejectionRegistry,
    message_ttl: Option<Duration>,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: RejectionRegistry,
        message_ttl: Option<Duration>,
    ) -> Self {
        Self {
            store,
            registry,
            message_ttl,
        }
    }

    pub fn registry(&self) -> &RejectionRegistry {
        &self.registry
    }

    /// Parse a compose request, persist it under a fresh token, and return
    /// the preview artifact. A token collision is retried with a fresh token
    /// and stays invisible to the caller.
    pub async fn compose(
        &self,
        author: UserId,
        raw: &str,
    ) -> std::result::Result<ComposedPreview, ComposeError> {
        let parsed = parse::parse(raw)?;

        if let Some(cutoff) = self.retention_cutoff() {
            if let Err(e) = self.store.purge_older_than(cutoff).await {
                tracing::warn!(error = %e, "retention purge failed");
            }
        }

        let mut attempts = 0usize;
        let message = loop {
            let candidate = PendingMessage {
                token: MessageToken::generate(),
                author,
                body: parsed.body.clone(),
                excluded: parsed.excluded.clone(),
                created_at: Utc::now(),
            };
            match self.store.insert(&candidate).await {
                Ok(()) => break candidate,
                Err(Error::Conflict(_)) if attempts < TOKEN_RETRY_LIMIT => {
                    attempts += 1;
                    tracing::warn!(attempts, "token collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        };

        Ok(ComposedPreview {
            title: formatting::preview_title(&message.excluded),
            description: formatting::preview_description(&message.body),
            message,
        })
    }

    /// Decide what one viewer gets to see behind `token`.
    ///
    /// Pure function of stored state: no session state, no mutation, and
    /// repeated calls return identical results (modulo the author changing
    /// the override text in between, which only affects future calls).
    pub async fn reveal(
        &self,
        token: &MessageToken,
        viewer: Option<&str>,
    ) -> Result<RevealOutcome> {
        let Some(message) = self.store.get(token).await? else {
            return Ok(RevealOutcome::Expired);
        };

        if self.is_past_ttl(message.created_at) {
            return Ok(RevealOutcome::Expired);
        }

        // A viewer without a registered handle can never match an exclusion.
        if let Some(viewer) = viewer {
            let handle = Handle::new(viewer);
            if message.is_excluded(&handle) {
                let text = self.registry.rejection_text(message.author).await?;
                return Ok(RevealOutcome::Denied(text));
            }
        }

        Ok(RevealOutcome::Granted(message.body))
    }

    fn retention_cutoff(&self) -> Option<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(self.message_ttl?).ok()?;
        Some(Utc::now() - ttl)
    }

    fn is_past_ttl(&self, created_at: DateTime<Utc>) -> bool {
        let Some(ttl) = self.message_ttl else {
            return false;
        };
        Utc::now()
            .signed_duration_since(created_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false)
    }
}
