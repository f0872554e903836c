//! Event store operations on the append-only `events` table.
//!
//! Events are the source of truth for the door's history. Every status
//! transition produces an immutable row; the only permitted mutation is the
//! one-time reassignment of `actor_id` through
//! [`EventStore::update_actor_if_equals`].
//!
//! Reads are ordered by `(timestamp_ms, id)`, which the
//! `idx_events_timestamp` index serves directly.

use doorbell_types::{ActorId, Event, EventId, EventType, NewEvent};
use sqlx::SqlitePool;

use crate::error::DbError;

/// Column list shared by every `SELECT` on `events`.
const EVENT_COLUMNS: &str = "id, timestamp_ms, event_type, actor_id";

/// Operations on the `events` table.
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    /// Create a new event store bound to a connection pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one event and return the id the store assigned.
    ///
    /// The row is committed before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the insert fails.
    pub async fn append(&self, event: &NewEvent) -> Result<EventId, DbError> {
        let id = sqlx::query(
            r"INSERT INTO events (timestamp_ms, event_type, actor_id)
              VALUES (?, ?, ?)",
        )
        .bind(event.timestamp_ms)
        .bind(event.event_type.as_str())
        .bind(event.actor.into_inner())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::debug!(
            event_id = id,
            event_type = %event.event_type,
            actor = %event.actor,
            "Appended event"
        );
        Ok(EventId(id))
    }

    /// Events ordered by `(timestamp, id)`, optionally filtered.
    ///
    /// `from_ms` is inclusive and `to_ms` exclusive; `None` leaves that side
    /// unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails and
    /// [`DbError::Decode`] if a row holds an unknown event type.
    pub async fn query_range(
        &self,
        event_type: Option<EventType>,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<Vec<Event>, DbError> {
        // A negative LIMIT means no limit in SQLite.
        self.fetch_range(event_type, from_ms, to_ms, -1).await
    }

    /// Like [`query_range`](Self::query_range), but stops after the first
    /// `limit` events. The cut happens in SQL, not after loading the range.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or decoding fails.
    pub async fn query_range_limited(
        &self,
        event_type: Option<EventType>,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
        limit: u32,
    ) -> Result<Vec<Event>, DbError> {
        self.fetch_range(event_type, from_ms, to_ms, i64::from(limit))
            .await
    }

    async fn fetch_range(
        &self,
        event_type: Option<EventType>,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Event>, DbError> {
        let type_name = event_type.map(EventType::as_str);
        let sql = format!(
            r"SELECT {EVENT_COLUMNS}
              FROM events
              WHERE (? IS NULL OR event_type = ?)
                AND (? IS NULL OR timestamp_ms >= ?)
                AND (? IS NULL OR timestamp_ms < ?)
              ORDER BY timestamp_ms, id
              LIMIT ?"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(type_name)
            .bind(type_name)
            .bind(from_ms)
            .bind(from_ms)
            .bind(to_ms)
            .bind(to_ms)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    /// The whole log in `(timestamp, id)` order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or decoding fails.
    pub async fn all(&self) -> Result<Vec<Event>, DbError> {
        self.query_range(None, None, None).await
    }

    /// The `offset`-th most recent event, `0` being the newest.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or decoding fails.
    pub async fn latest(&self, offset: u32) -> Result<Option<Event>, DbError> {
        let sql = format!(
            r"SELECT {EVENT_COLUMNS}
              FROM events
              ORDER BY timestamp_ms DESC, id DESC
              LIMIT 1 OFFSET ?"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(i64::from(offset))
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// The most recent `OPEN` or `LOCK` event.
    ///
    /// Override events are skipped; they never start or end a session.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or decoding fails.
    pub async fn latest_boundary(&self) -> Result<Option<Event>, DbError> {
        let sql = format!(
            r"SELECT {EVENT_COLUMNS}
              FROM events
              WHERE event_type IN ('OPEN', 'LOCK')
              ORDER BY timestamp_ms DESC, id DESC
              LIMIT 1"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// Look up one event by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or decoding fails.
    pub async fn get_by_id(&self, id: EventId) -> Result<Option<Event>, DbError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// Set the actor of event `id` to `new_actor`, but only if it currently
    /// equals `expected`.
    ///
    /// Executed as a single conditional `UPDATE`, so of several concurrent
    /// callers at most one observes `true`. A missing id or a mismatched
    /// actor yields `false`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the update fails.
    pub async fn update_actor_if_equals(
        &self,
        id: EventId,
        new_actor: ActorId,
        expected: ActorId,
    ) -> Result<bool, DbError> {
        let affected = sqlx::query(
            r"UPDATE events
              SET actor_id = ?
              WHERE id = ? AND actor_id = ?",
        )
        .bind(new_actor.into_inner())
        .bind(id.into_inner())
        .bind(expected.into_inner())
        .execute(&self.pool)
        .await?
        .rows_affected();

        let swapped = affected == 1;
        tracing::debug!(
            event_id = %id,
            new_actor = %new_actor,
            swapped,
            "Conditional actor update"
        );
        Ok(swapped)
    }

    /// Total number of events.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn count(&self) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// A row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Auto-incremented event ID.
    pub id: i64,
    /// Epoch milliseconds.
    pub timestamp_ms: i64,
    /// Persisted event type name.
    pub event_type: String,
    /// Actor id, `-1` for the system.
    pub actor_id: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId(row.id),
            timestamp_ms: row.timestamp_ms,
            event_type: row.event_type.parse()?,
            actor: ActorId(row.actor_id),
        })
    }
}
