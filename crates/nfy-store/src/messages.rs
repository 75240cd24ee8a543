//! Pending-message persistence.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use nfy_core::{
    domain::{Handle, MessageToken, PendingMessage, UserId},
    ports::MessageStore,
    Error, Result,
};

use crate::{storage_err, Database};

pub struct SqliteMessageStore {
    db: Database,
}

impl SqliteMessageStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl MessageStore for SqliteMessageStore {
    async fn insert(&self, message: &PendingMessage) -> Result<()> {
        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(storage_err)?;

            tx.execute(
                "INSERT INTO pending_messages (token, author_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    message.token.as_str(),
                    message.author.0,
                    message.body,
                    message.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| insert_err(e, message.token.as_str()))?;

            for (position, handle) in message.excluded.iter().enumerate() {
                tx.execute(
                    "INSERT INTO excluded_handles (token, handle, position)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![message.token.as_str(), handle.as_str(), position as i64],
                )
                .map_err(storage_err)?;
            }

            tx.commit().map_err(storage_err)
        })
    }

    async fn get(&self, token: &MessageToken) -> Result<Option<PendingMessage>> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT author_id, body, created_at FROM pending_messages WHERE token = ?1",
                    [token.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(storage_err)?;

            let Some((author_id, body, created_at)) = row else {
                return Ok(None);
            };

            let mut stmt = conn
                .prepare(
                    "SELECT handle FROM excluded_handles WHERE token = ?1 ORDER BY position",
                )
                .map_err(storage_err)?;
            let excluded = stmt
                .query_map([token.as_str()], |row| row.get::<_, String>(0))
                .map_err(storage_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(storage_err)?
                .iter()
                .map(|h| Handle::new(h))
                .collect();

            Ok(Some(PendingMessage {
                token: token.clone(),
                author: UserId(author_id),
                body,
                excluded,
                created_at: parse_created_at(&created_at)?,
            }))
        })
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(storage_err)?;
            let cutoff = cutoff.to_rfc3339();

            tx.execute(
                "DELETE FROM excluded_handles WHERE token IN
                 (SELECT token FROM pending_messages WHERE created_at < ?1)",
                [&cutoff],
            )
            .map_err(storage_err)?;

            let removed = tx
                .execute("DELETE FROM pending_messages WHERE created_at < ?1", [&cutoff])
                .map_err(storage_err)?;

            tx.commit().map_err(storage_err)?;
            Ok(removed)
        })
    }
}

fn insert_err(e: rusqlite::Error, token: &str) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(format!("token already exists: {token}"))
        }
        _ => storage_err(e),
    }
}

fn parse_created_at(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("bad created_at {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteMessageStore {
        SqliteMessageStore::new(Database::in_memory().unwrap())
    }

    fn message(token: &str, body: &str, excluded: &[&str]) -> PendingMessage {
        PendingMessage {
            token: MessageToken(token.to_string()),
            author: UserId(42),
            body: body.to_string(),
            excluded: excluded.iter().map(|h| Handle::new(h)).collect(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_all_fields() {
        let store = store();
        let msg = message("tok1", "привет", &["vasya", "petya"]);

        store.insert(&msg).await.unwrap();
        let got = store.get(&msg.token).await.unwrap().unwrap();
        assert_eq!(got, msg);
    }

    #[tokio::test]
    async fn get_unknown_token_is_none() {
        let store = store();
        assert_eq!(store.get(&MessageToken("nope".into())).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_token_is_a_conflict_and_keeps_the_original() {
        let store = store();
        let first = message("tok1", "первое", &["vasya"]);
        let second = message("tok1", "второе", &["petya"]);

        store.insert(&first).await.unwrap();
        let err = store.insert(&second).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let got = store.get(&first.token).await.unwrap().unwrap();
        assert_eq!(got.body, "первое");
    }

    #[tokio::test]
    async fn excluded_handles_keep_first_occurrence_order() {
        let store = store();
        let msg = message("tok1", "x", &["zzzzz", "aaaaa", "mmmmm"]);

        store.insert(&msg).await.unwrap();
        let got = store.get(&msg.token).await.unwrap().unwrap();
        let order: Vec<&str> = got.excluded.iter().map(|h| h.as_str()).collect();
        assert_eq!(order, vec!["zzzzz", "aaaaa", "mmmmm"]);
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_partial_rows() {
        let store = store();
        store
            .insert(&message("tok1", "первое", &["vasya"]))
            .await
            .unwrap();

        // Same token, different handles: the transaction must roll back
        // without touching excluded_handles.
        let _ = store
            .insert(&message("tok1", "второе", &["petya", "kolya"]))
            .await
            .unwrap_err();

        let got = store.get(&MessageToken("tok1".into())).await.unwrap().unwrap();
        assert_eq!(
            got.excluded,
            vec![Handle::new("vasya")],
            "conflicting insert must not add handles"
        );
    }

    #[tokio::test]
    async fn purge_removes_only_over_age_messages() {
        let store = store();

        let mut old = message("old1", "старое", &["vasya"]);
        old.created_at = Utc::now() - chrono::Duration::hours(3);
        let fresh = message("new1", "новое", &["petya"]);

        store.insert(&old).await.unwrap();
        store.insert(&fresh).await.unwrap();

        let cutoff = Utc::now() - chrono::Duration::hours(1);
        let removed = store.purge_older_than(cutoff).await.unwrap();
        assert_eq!(removed, 1);

        assert_eq!(store.get(&old.token).await.unwrap(), None);
        assert!(store.get(&fresh.token).await.unwrap().is_some());
    }
}
