//! Reaction leaderboards.

use std::collections::HashMap;

use doorbell_types::{ActorId, MessageReactions, ReactionRecord, ReactionStats};

use crate::users::rank;

/// Top messages by distinct reactors and top actors by reactions given.
///
/// Messages are sorted by reactor count descending, then message id
/// ascending. Both lists are truncated to `top_n`.
pub fn reaction_stats(records: &[ReactionRecord], top_n: usize) -> ReactionStats {
    let mut messages: Vec<MessageReactions> = records
        .iter()
        .map(|r| MessageReactions {
            message_id: r.message_id,
            reactor_count: u64::try_from(r.reactor_count()).unwrap_or(u64::MAX),
        })
        .collect();
    messages.sort_by(|a, b| {
        b.reactor_count
            .cmp(&a.reactor_count)
            .then(a.message_id.cmp(&b.message_id))
    });
    messages.truncate(top_n);

    let mut per_actor: HashMap<ActorId, u64> = HashMap::new();
    for actor in records.iter().flat_map(|r| r.reactors.iter()) {
        let count = per_actor.entry(*actor).or_insert(0);
        *count = count.saturating_add(1);
    }

    ReactionStats {
        top_messages: messages,
        top_reactors: rank(per_actor, top_n),
    }
}

#[cfg(test)]
mod tests {
    use doorbell_types::MessageId;

    use super::*;

    fn record(message: i64, actors: &[i64]) -> ReactionRecord {
        ReactionRecord {
            message_id: MessageId(message),
            reactors: actors.iter().copied().map(ActorId).collect(),
        }
    }

    #[test]
    fn messages_ranked_by_reactor_count() {
        let records = [
            record(1, &[10]),
            record(2, &[10, 11, 12]),
            record(3, &[11, 12]),
            record(4, &[]),
        ];
        let stats = reaction_stats(&records, 2);
        let ids: Vec<i64> = stats
            .top_messages
            .iter()
            .map(|m| m.message_id.into_inner())
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn actors_ranked_by_reactions_given() {
        let records = [record(1, &[10, 11]), record(2, &[11]), record(3, &[11, 12])];
        let stats = reaction_stats(&records, 5);
        let first = stats.top_reactors.first().copied();
        assert_eq!(first.map(|c| (c.actor, c.count)), Some((ActorId(11), 3)));
        assert_eq!(stats.top_reactors.len(), 3);
    }

    #[test]
    fn message_ties_prefer_lower_ids() {
        let records = [record(9, &[1]), record(4, &[2])];
        let stats = reaction_stats(&records, 5);
        assert_eq!(
            stats.top_messages.first().map(|m| m.message_id),
            Some(MessageId(4))
        );
    }
}
