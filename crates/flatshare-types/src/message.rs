//! Inbox messages routed between actors.
//!
//! A [`Message`] is created by the arbiter's routing decision, queued in the
//! addressed actor's mailbox, and consumed (and discarded) when that actor's
//! inbox is drained at the start of its next turn. Messages are immutable
//! once created.

use serde::{Deserialize, Serialize};

/// The kind of an inbox message.
///
/// An actor's turn prompt renders each kind differently: dialogue is quoted
/// with its speaker, advisories come from the arbiter, and perceptions
/// describe the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Another actor's relayed speech.
    Dialogue,
    /// Guidance from the arbiter (e.g. "the bathroom is occupied, wait").
    Advisory,
    /// An environment observation generated by the arbiter for the actor.
    Perception,
}

/// Where a message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageOrigin {
    /// A named actor in the roster.
    Actor(String),
    /// The supervising arbiter.
    Arbiter,
    /// The simulated environment.
    Environment,
}

impl MessageOrigin {
    /// Display name used when rendering the message into a prompt.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Actor(name) => name,
            Self::Arbiter => "arbiter",
            Self::Environment => "environment",
        }
    }
}

/// A single inbox message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the content.
    pub origin: MessageOrigin,
    /// How the content should be presented to the recipient.
    pub kind: MessageKind,
    /// The message text.
    pub body: String,
    /// The tick on which the message was enqueued. It becomes visible to
    /// the recipient on the following tick.
    pub tick: u64,
}

impl Message {
    /// Build a dialogue message relayed from one actor to another.
    pub const fn dialogue(from: String, body: String, tick: u64) -> Self {
        Self {
            origin: MessageOrigin::Actor(from),
            kind: MessageKind::Dialogue,
            body,
            tick,
        }
    }

    /// Build an advisory message from the arbiter.
    pub const fn advisory(body: String, tick: u64) -> Self {
        Self {
            origin: MessageOrigin::Arbiter,
            kind: MessageKind::Advisory,
            body,
            tick,
        }
    }

    /// Build an environment perception message.
    pub const fn perception(body: String, tick: u64) -> Self {
        Self {
            origin: MessageOrigin::Environment,
            kind: MessageKind::Perception,
            body,
            tick,
        }
    }
}
