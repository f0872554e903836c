//! One-time claims of sensor-recorded events.
//!
//! An event recorded by the sensor carries the system sentinel as its actor.
//! Any member may claim it once, replacing the sentinel with their own id.
//! The store performs the check and the write in one conditional `UPDATE`,
//! so no lock is shared with the state machine and concurrent claimants
//! cannot both win.

use doorbell_db::{DbError, EventStore};
use doorbell_types::{ActorId, EventId};

/// Resolves claim requests against the event store.
#[derive(Debug, Clone)]
pub struct ClaimResolver {
    events: EventStore,
    system_actor: ActorId,
}

impl ClaimResolver {
    /// Create a resolver using the default system sentinel.
    pub const fn new(events: EventStore) -> Self {
        Self {
            events,
            system_actor: ActorId::SYSTEM,
        }
    }

    /// Use a different system sentinel.
    #[must_use]
    pub const fn with_system_actor(mut self, system_actor: ActorId) -> Self {
        self.system_actor = system_actor;
        self
    }

    /// Attribute event `event_id` to `actor`.
    ///
    /// Returns `true` only if this call changed the actor. A missing event,
    /// an event that is already attributed, a lost race, or an attempt to
    /// claim as the sentinel itself all return `false`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails.
    pub async fn claim(&self, event_id: EventId, actor: ActorId) -> Result<bool, DbError> {
        if actor == self.system_actor {
            tracing::debug!(event_id = %event_id, "Refusing claim by the system actor");
            return Ok(false);
        }

        let claimed = self
            .events
            .update_actor_if_equals(event_id, actor, self.system_actor)
            .await?;

        if claimed {
            tracing::info!(event_id = %event_id, actor = %actor, "Event claimed");
        } else {
            tracing::info!(event_id = %event_id, actor = %actor, "Claim rejected");
        }
        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use doorbell_db::Database;
    use doorbell_types::{EventType, NewEvent};

    use super::*;

    async fn setup() -> (Database, ClaimResolver) {
        let db = Database::connect_in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let resolver = ClaimResolver::new(db.events());
        (db, resolver)
    }

    async fn append(db: &Database, actor: ActorId) -> EventId {
        db.events()
            .append(&NewEvent::new(1_000, EventType::Open, actor))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn system_event_can_be_claimed_once() {
        let (db, resolver) = setup().await;
        let id = append(&db, ActorId::SYSTEM).await;

        assert!(resolver.claim(id, ActorId(11)).await.unwrap());
        assert!(!resolver.claim(id, ActorId(12)).await.unwrap());

        let event = db.events().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(event.actor, ActorId(11));
    }

    #[tokio::test]
    async fn human_event_cannot_be_claimed() {
        let (db, resolver) = setup().await;
        let id = append(&db, ActorId(4)).await;
        assert!(!resolver.claim(id, ActorId(5)).await.unwrap());
    }

    #[tokio::test]
    async fn missing_event_is_false() {
        let (_db, resolver) = setup().await;
        assert!(!resolver.claim(EventId(404), ActorId(5)).await.unwrap());
    }

    #[tokio::test]
    async fn claiming_as_the_sentinel_is_refused() {
        let (db, resolver) = setup().await;
        let id = append(&db, ActorId::SYSTEM).await;
        assert!(!resolver.claim(id, ActorId::SYSTEM).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let (db, resolver) = setup().await;
        let id = append(&db, ActorId::SYSTEM).await;
        let resolver = Arc::new(resolver);

        let a = {
            let r = Arc::clone(&resolver);
            tokio::spawn(async move { r.claim(id, ActorId(1)).await.unwrap() })
        };
        let b = {
            let r = Arc::clone(&resolver);
            tokio::spawn(async move { r.claim(id, ActorId(2)).await.unwrap() })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(a ^ b);
    }

    #[tokio::test]
    async fn storage_errors_propagate() {
        let (db, resolver) = setup().await;
        db.close().await;
        assert!(resolver.claim(EventId(1), ActorId(1)).await.is_err());
    }
}
