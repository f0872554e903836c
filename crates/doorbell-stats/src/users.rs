//! Per-actor leaderboards.

use std::collections::HashMap;

use doorbell_types::{ActorCount, ActorId, Event, EventType, UserStats};

/// Rank actors by `OPEN` and `LOCK` events, excluding `system_actor`.
///
/// Each leaderboard is sorted by count descending, then actor id ascending,
/// and truncated to `top_n` entries.
pub fn user_stats(events: &[Event], system_actor: ActorId, top_n: usize) -> UserStats {
    let mut opens: HashMap<ActorId, u64> = HashMap::new();
    let mut locks: HashMap<ActorId, u64> = HashMap::new();

    for event in events {
        if event.actor == system_actor {
            continue;
        }
        let table = match event.event_type {
            EventType::Open => &mut opens,
            EventType::Lock => &mut locks,
            _ => continue,
        };
        let count = table.entry(event.actor).or_insert(0);
        *count = count.saturating_add(1);
    }

    UserStats {
        opens: rank(opens, top_n),
        locks: rank(locks, top_n),
    }
}

/// Sort counts into a leaderboard of at most `top_n` entries.
pub(crate) fn rank(counts: HashMap<ActorId, u64>, top_n: usize) -> Vec<ActorCount> {
    let mut ranked: Vec<ActorCount> = counts
        .into_iter()
        .map(|(actor, count)| ActorCount { actor, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.actor.cmp(&b.actor)));
    ranked.truncate(top_n);
    ranked
}
