//! Per-author rejection-text overrides.

use chrono::Utc;
use rusqlite::OptionalExtension;

use nfy_core::{domain::UserId, ports::OverrideStore, Result};

use crate::{storage_err, Database};

pub struct SqliteOverrideStore {
    db: Database,
}

impl SqliteOverrideStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl OverrideStore for SqliteOverrideStore {
    async fn get_override(&self, author: UserId) -> Result<Option<String>> {
        self.db.with_conn(|conn| {
            let row: Option<Option<String>> = conn
                .query_row(
                    "SELECT reject_text FROM reject_overrides WHERE author_id = ?1",
                    [author.0],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_err)?;

            // A NULL reject_text row means "reset to default".
            Ok(row.flatten())
        })
    }

    async fn set_override(&self, author: UserId, text: Option<&str>) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reject_overrides (author_id, reject_text, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(author_id) DO UPDATE SET
                   reject_text = excluded.reject_text,
                   updated_at = excluded.updated_at",
                rusqlite::params![author.0, text, Utc::now().to_rfc3339()],
            )
            .map_err(storage_err)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHOR: UserId = UserId(7);

    fn store() -> SqliteOverrideStore {
        SqliteOverrideStore::new(Database::in_memory().unwrap())
    }

    #[tokio::test]
    async fn unset_author_has_no_override() {
        let store = store();
        assert_eq!(store.get_override(AUTHOR).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = store();
        store.set_override(AUTHOR, Some("Не положено")).await.unwrap();
        assert_eq!(
            store.get_override(AUTHOR).await.unwrap(),
            Some("Не положено".to_string())
        );
    }

    #[tokio::test]
    async fn upsert_replaces_previous_value() {
        let store = store();
        store.set_override(AUTHOR, Some("первый")).await.unwrap();
        store.set_override(AUTHOR, Some("второй")).await.unwrap();
        assert_eq!(
            store.get_override(AUTHOR).await.unwrap(),
            Some("второй".to_string())
        );
    }

    #[tokio::test]
    async fn setting_the_same_value_twice_is_idempotent() {
        let store = store();
        store.set_override(AUTHOR, Some("тот же")).await.unwrap();
        store.set_override(AUTHOR, Some("тот же")).await.unwrap();
        assert_eq!(
            store.get_override(AUTHOR).await.unwrap(),
            Some("тот же".to_string())
        );
    }

    #[tokio::test]
    async fn reset_stores_null_not_empty_string() {
        let store = store();
        store.set_override(AUTHOR, Some("кастом")).await.unwrap();
        store.set_override(AUTHOR, None).await.unwrap();
        assert_eq!(store.get_override(AUTHOR).await.unwrap(), None);

        // An explicit empty string is a value, not a reset.
        store.set_override(AUTHOR, Some("")).await.unwrap();
        assert_eq!(store.get_override(AUTHOR).await.unwrap(), Some(String::new()));
    }

    #[tokio::test]
    async fn overrides_are_per_author() {
        let store = store();
        store.set_override(UserId(1), Some("один")).await.unwrap();
        store.set_override(UserId(2), Some("два")).await.unwrap();

        assert_eq!(
            store.get_override(UserId(1)).await.unwrap(),
            Some("один".to_string())
        );
        assert_eq!(
            store.get_override(UserId(2)).await.unwrap(),
            Some("два".to_string())
        );
    }
}
