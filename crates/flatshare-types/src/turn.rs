//! Turn context, actor output, and arbiter decision payloads.
//!
//! These three types carry the data flow of a single actor sub-step:
//! the scheduler hands a [`TurnContext`] to the actor collaborator, receives
//! a [`TurnOutput`], hands that plus the resource status to the arbiter
//! collaborator, and receives an [`ArbiterDecision`] that drives routing.
//!
//! `TurnOutput` and `ArbiterDecision` live for exactly one sub-step; they
//! are never retained across ticks (the external collaborator keeps its own
//! conversational memory).

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Separator accepted in a multi-recipient dialogue target list.
const TARGET_LIST_SEPARATOR: char = ',';

/// Everything an actor sees at the start of its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnContext {
    /// The current tick number.
    pub tick: u64,
    /// Human-readable simulated time (e.g. `"Morning 07:15"`).
    pub time_label: String,
    /// The actor's situational framing (e.g. `"Ming's room"`).
    pub scene: String,
    /// The actor's drained inbox, in arrival order.
    pub inbox: Vec<Message>,
}

/// The parsed result of one actor's turn.
///
/// Every field scraped from the collaborator's reply is optional: a missing
/// or malformed segment is a valid "said/thought nothing parseable" outcome,
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutput {
    /// The acting actor's name.
    pub actor: String,
    /// The time label the turn was taken at.
    pub time_label: String,
    /// The scene label the turn was taken in.
    pub scene: String,
    /// The actor's internal thought, if one parsed.
    pub thought: Option<String>,
    /// Raw dialogue target. May name several recipients separated by commas;
    /// see [`TurnOutput::dialogue_targets`].
    pub dialogue_target: Option<String>,
    /// What the actor said, if anything parsed.
    pub dialogue_text: Option<String>,
}

impl TurnOutput {
    /// A silent output: no thought, no dialogue.
    pub const fn silent(actor: String, time_label: String, scene: String) -> Self {
        Self {
            actor,
            time_label,
            scene,
            thought: None,
            dialogue_target: None,
            dialogue_text: None,
        }
    }

    /// Split the raw dialogue target into individual recipient names.
    ///
    /// Returns an empty vector when there is no target. Whitespace around
    /// each name is trimmed; empty entries are dropped.
    pub fn dialogue_targets(&self) -> Vec<&str> {
        self.dialogue_target
            .as_deref()
            .map(|raw| {
                raw.split(TARGET_LIST_SEPARATOR)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the actor produced a complete dialogue (target and text).
    pub const fn has_dialogue(&self) -> bool {
        self.dialogue_target.is_some() && self.dialogue_text.is_some()
    }
}

/// The arbiter's routing decision for one actor's turn.
///
/// The arbiter only gates whether dialogue is relayed; the relayed content is
/// always the actor's original target/text, never a rewording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbiterDecision {
    /// Whether the arbiter judged that intervention is required.
    pub intervene: bool,
    /// Recipient(s) of the relayed dialogue, if relay was approved.
    pub relay_target: Option<String>,
    /// The relayed dialogue text, if relay was approved.
    pub relay_text: Option<String>,
    /// Advisory text delivered to the acting actor next tick.
    pub advisory: Option<String>,
    /// Environment perception text delivered to the acting actor next tick.
    pub perception: Option<String>,
}

impl ArbiterDecision {
    /// The fail-open default: no intervention, relay whatever dialogue the
    /// actor supplied, no advisory, no perception.
    ///
    /// Used when the arbiter collaborator is unreachable or its reply does
    /// not parse at all.
    pub fn relay_passthrough(output: &TurnOutput) -> Self {
        Self {
            intervene: false,
            relay_target: output.dialogue_target.clone(),
            relay_text: output.dialogue_text.clone(),
            advisory: None,
            perception: None,
        }
    }

    /// A decision that routes nothing.
    pub const fn silent() -> Self {
        Self {
            intervene: false,
            relay_target: None,
            relay_text: None,
            advisory: None,
            perception: None,
        }
    }

    /// Whether this decision carries a complete dialogue relay.
    pub const fn has_relay(&self) -> bool {
        self.relay_target.is_some() && self.relay_text.is_some()
    }

    /// Split the relay target into individual recipient names.
    ///
    /// Same comma convention as [`TurnOutput::dialogue_targets`].
    pub fn relay_targets(&self) -> Vec<&str> {
        self.relay_target
            .as_deref()
            .map(|raw| {
                raw.split(TARGET_LIST_SEPARATOR)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
