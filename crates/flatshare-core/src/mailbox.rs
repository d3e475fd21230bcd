//! Per-actor message mailboxes.
//!
//! Each roster member owns one ordered inbox. The arbiter's routing
//! decisions enqueue messages during a tick; an actor's inbox is drained
//! destructively at the start of its next turn, so a relay is visible to the
//! addressee exactly one tick after it was spoken.
//!
//! Routing is fail-open: a message addressed to a name outside the roster is
//! silently dropped, so a malformed relay target can never stall the
//! simulation.

use std::collections::BTreeMap;

use flatshare_types::Message;
use tracing::debug;

/// The set of all actor inboxes, created once from the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxRouter {
    inboxes: BTreeMap<String, Vec<Message>>,
}

impl MailboxRouter {
    /// Create one empty inbox per roster name.
    pub fn new<I, S>(roster: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inboxes: roster
                .into_iter()
                .map(|name| (name.into(), Vec::new()))
                .collect(),
        }
    }

    /// Append a message to the named actor's inbox.
    ///
    /// Messages addressed to unknown names are dropped with a debug log.
    pub fn enqueue(&mut self, actor: &str, message: Message) {
        let Some(inbox) = self.inboxes.get_mut(actor) else {
            debug!(actor, kind = ?message.kind, "message to unknown actor dropped");
            return;
        };
        inbox.push(message);
    }

    /// Return and clear the named actor's inbox.
    ///
    /// Ordering is insertion order. Draining an unknown name yields an
    /// empty sequence.
    pub fn drain(&mut self, actor: &str) -> Vec<Message> {
        self.inboxes
            .get_mut(actor)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Number of queued messages for an actor (0 for unknown names).
    pub fn pending(&self, actor: &str) -> usize {
        self.inboxes.get(actor).map_or(0, Vec::len)
    }

    /// Whether the name has an inbox (i.e. is a roster member).
    pub fn knows(&self, actor: &str) -> bool {
        self.inboxes.contains_key(actor)
    }
}

#[cfg(test)]
mod tests {
    use flatshare_types::MessageKind;

    use super::*;

    fn make_router() -> MailboxRouter {
        MailboxRouter::new(["Ming", "Li"])
    }

    #[test]
    fn enqueue_then_drain_preserves_order() {
        let mut router = make_router();
        router.enqueue("Li", Message::dialogue("Ming".to_owned(), "first".to_owned(), 1));
        router.enqueue("Li", Message::advisory("second".to_owned(), 1));

        let drained = router.drain("Li");
        assert_eq!(drained.len(), 2);
        assert_eq!(drained.first().map(|m| m.body.as_str()), Some("first"));
        assert_eq!(drained.get(1).map(|m| m.kind), Some(MessageKind::Advisory));
    }

    #[test]
    fn drain_is_destructive() {
        let mut router = make_router();
        router.enqueue("Ming", Message::perception("rain outside".to_owned(), 2));

        assert_eq!(router.drain("Ming").len(), 1);
        assert!(router.drain("Ming").is_empty());
    }

    #[test]
    fn unknown_target_is_dropped_silently() {
        let mut router = make_router();
        router.enqueue("Nobody", Message::advisory("lost".to_owned(), 1));
        assert_eq!(router.pending("Nobody"), 0);
        assert!(router.drain("Nobody").is_empty());
    }

    #[test]
    fn inboxes_are_independent() {
        let mut router = make_router();
        router.enqueue("Li", Message::advisory("for Li".to_owned(), 1));
        assert_eq!(router.pending("Li"), 1);
        assert_eq!(router.pending("Ming"), 0);
        let _ = router.drain("Ming");
        assert_eq!(router.pending("Li"), 1);
    }

    #[test]
    fn knows_reflects_the_roster() {
        let router = make_router();
        assert!(router.knows("Ming"));
        assert!(!router.knows("Nobody"));
    }
}
