//! Per-actor chat sessions with bounded history.
//!
//! Each actor (and the arbiter) holds an ongoing conversation with the LLM:
//! the persona as the system message, then alternating turn prompts and
//! replies. The backend APIs are stateless, so the session re-sends the
//! transcript on every call and evicts the oldest exchange once the
//! configured limit is reached.

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A prompt sent to the model.
    User,
    /// A reply received from the model.
    Assistant,
}

impl Role {
    /// Wire name used by both backend APIs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Who produced the entry.
    pub role: Role,
    /// The entry text.
    pub content: String,
}

/// An ongoing conversation with the LLM.
#[derive(Debug, Clone)]
pub struct ChatSession {
    system: String,
    history: Vec<ChatTurn>,
    history_limit: usize,
}

impl ChatSession {
    /// Create a session with the given system message.
    ///
    /// `history_limit` caps the number of retained exchanges (a prompt and
    /// its reply count as one); zero means unlimited.
    pub const fn new(system: String, history_limit: usize) -> Self {
        Self {
            system,
            history: Vec::new(),
            history_limit,
        }
    }

    /// The session's system message.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The retained transcript, oldest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Record a completed exchange, evicting the oldest one if the
    /// session is at its limit.
    pub fn record_exchange(&mut self, prompt: String, reply: String) {
        if self.history_limit > 0 {
            let max_entries = self.history_limit.saturating_mul(2);
            while self.history.len().saturating_add(2) > max_entries {
                // Oldest exchange first: a prompt and its reply.
                self.history.drain(..self.history.len().min(2));
            }
        }
        self.history.push(ChatTurn {
            role: Role::User,
            content: prompt,
        });
        self.history.push(ChatTurn {
            role: Role::Assistant,
            content: reply,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(session: &ChatSession) -> Vec<&str> {
        session
            .history()
            .iter()
            .map(|turn| turn.content.as_str())
            .collect()
    }

    #[test]
    fn exchanges_are_recorded_in_order() {
        let mut session = ChatSession::new("persona".to_owned(), 0);
        session.record_exchange("q1".to_owned(), "a1".to_owned());
        session.record_exchange("q2".to_owned(), "a2".to_owned());

        assert_eq!(contents(&session), vec!["q1", "a1", "q2", "a2"]);
        assert_eq!(session.history().first().map(|t| t.role), Some(Role::User));
        assert_eq!(
            session.history().last().map(|t| t.role),
            Some(Role::Assistant)
        );
    }

    #[test]
    fn limit_evicts_the_oldest_exchange() {
        let mut session = ChatSession::new(String::new(), 2);
        session.record_exchange("q1".to_owned(), "a1".to_owned());
        session.record_exchange("q2".to_owned(), "a2".to_owned());
        session.record_exchange("q3".to_owned(), "a3".to_owned());

        assert_eq!(contents(&session), vec!["q2", "a2", "q3", "a3"]);
    }

    #[test]
    fn zero_limit_keeps_everything() {
        let mut session = ChatSession::new(String::new(), 0);
        for i in 0..100 {
            session.record_exchange(format!("q{i}"), format!("a{i}"));
        }
        assert_eq!(session.history().len(), 200);
    }
}
