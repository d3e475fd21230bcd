//! Shared type definitions for the Flatshare simulation.
//!
//! This crate is the single source of truth for the payloads that cross the
//! boundary between the scheduler (`flatshare-core`) and the text-generation
//! collaborator (`flatshare-runner`): inbox messages, per-turn actor output,
//! and the arbiter's routing decision.
//!
//! # Modules
//!
//! - [`message`] -- Inbox messages routed between actors each tick
//! - [`turn`] -- Turn context, actor output, and arbiter decision payloads

pub mod message;
pub mod turn;

// Re-export all public types at crate root for convenience.
pub use message::{Message, MessageKind, MessageOrigin};
pub use turn::{ArbiterDecision, TurnContext, TurnOutput};
