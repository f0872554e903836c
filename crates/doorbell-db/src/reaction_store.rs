//! Reaction side log: which actors reacted to which status messages.
//!
//! Reactor sets live in the `message_reactors` join table, one row per
//! distinct `(message, actor)` pair. A message is tracked in
//! `reaction_messages` even while nobody has reacted to it, so a refresh
//! sweep can enumerate every message worth re-reading.

use std::collections::{BTreeMap, BTreeSet};

use doorbell_types::{ActorId, MessageId, ReactionRecord};
use sqlx::SqlitePool;

use crate::error::DbError;

/// Operations on `reaction_messages` and `message_reactors`.
#[derive(Debug, Clone)]
pub struct ReactionStore {
    pool: SqlitePool,
}

impl ReactionStore {
    /// Create a new reaction store bound to a connection pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start tracking a message with an empty reactor set.
    ///
    /// Tracking an already tracked message leaves its reactors untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the insert fails.
    pub async fn track_message(&self, message_id: MessageId) -> Result<(), DbError> {
        sqlx::query("INSERT OR IGNORE INTO reaction_messages (message_id) VALUES (?)")
            .bind(message_id.into_inner())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the reactor set of a message, tracking it if necessary.
    ///
    /// Runs in one transaction; readers see either the old or the new set.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if any statement fails; nothing is
    /// committed in that case.
    pub async fn replace_reactors(
        &self,
        message_id: MessageId,
        reactors: &BTreeSet<ActorId>,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO reaction_messages (message_id) VALUES (?)")
            .bind(message_id.into_inner())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM message_reactors WHERE message_id = ?")
            .bind(message_id.into_inner())
            .execute(&mut *tx)
            .await?;

        for actor in reactors {
            sqlx::query("INSERT INTO message_reactors (message_id, actor_id) VALUES (?, ?)")
                .bind(message_id.into_inner())
                .bind(actor.into_inner())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            message_id = %message_id,
            reactors = reactors.len(),
            "Replaced reactor set"
        );
        Ok(())
    }

    /// Every tracked message id, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn message_ids(&self) -> Result<Vec<MessageId>, DbError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT message_id FROM reaction_messages ORDER BY message_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(MessageId).collect())
    }

    /// Every tracked message with its reactor set, ascending by message id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn records(&self) -> Result<Vec<ReactionRecord>, DbError> {
        let rows: Vec<(i64, Option<i64>)> = sqlx::query_as(
            r"SELECT m.message_id, r.actor_id
              FROM reaction_messages m
              LEFT JOIN message_reactors r ON r.message_id = m.message_id
              ORDER BY m.message_id, r.actor_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: BTreeMap<MessageId, BTreeSet<ActorId>> = BTreeMap::new();
        for (message_id, actor_id) in rows {
            let reactors = grouped.entry(MessageId(message_id)).or_default();
            if let Some(actor) = actor_id {
                reactors.insert(ActorId(actor));
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(message_id, reactors)| ReactionRecord {
                message_id,
                reactors,
            })
            .collect())
    }
}
