//! LLM reply parsing into typed turn payloads.
//!
//! The model returns free text that should contain brace-delimited
//! segments. Actor replies carry `1-thought:{...}` and optionally
//! `2-say-to{target}{text}`; arbiter replies carry an intervention
//! verdict, a relay gate, and optional `2-advisory{...}` /
//! `3-environment{...}` segments.
//!
//! Every non-match is a valid null, never an error: an actor that rambles
//! off-format simply thought and said nothing parseable this turn, and an
//! off-format arbiter reply denies nothing (the caller falls back to relay
//! passthrough before this module is even reached on transport failure).

use flatshare_types::{ArbiterDecision, TurnOutput};
use tracing::debug;

/// Substring in an arbiter reply that flags an intervention.
const INTERVENTION_MARKER: &str = "intervention required";

/// Marker introducing an actor's thought segment.
const THOUGHT_MARKER: &str = "1-thought:";

/// Marker introducing an actor's dialogue segment.
const SAY_TO_MARKER: &str = "2-say-to";

/// Marker introducing an arbiter advisory segment.
const ADVISORY_MARKER: &str = "2-advisory";

/// Marker introducing an arbiter environment segment.
const ENVIRONMENT_MARKER: &str = "3-environment";

/// Infix of the arbiter's relay gate: `1-{target} says to me{text}`.
const RELAY_GATE_INFIX: &str = "says to me";

/// Parse an actor reply into a [`TurnOutput`].
///
/// Scrapes the thought and dialogue segments; each missing or malformed
/// segment becomes `None`.
pub fn parse_actor_reply(
    actor: &str,
    time_label: &str,
    scene: &str,
    raw: &str,
) -> TurnOutput {
    let thought = capture_one(raw, THOUGHT_MARKER);
    let (dialogue_target, dialogue_text) = capture_two(raw, SAY_TO_MARKER)
        .map_or((None, None), |(target, text)| (Some(target), Some(text)));

    if thought.is_none() && dialogue_target.is_none() {
        debug!(actor, raw, "actor reply had no parseable segments");
    }

    TurnOutput {
        actor: actor.to_owned(),
        time_label: time_label.to_owned(),
        scene: scene.to_owned(),
        thought,
        dialogue_target,
        dialogue_text,
    }
}

/// Parse an arbiter reply into an [`ArbiterDecision`].
///
/// The relay gate only opens or closes the relay: when the gate pattern
/// `1-{...} says to me{...}` is present, the relayed content is the
/// actor's ORIGINAL target and text from `output`, never the arbiter's
/// rewording. An actor that said nothing relays nothing regardless of
/// the gate.
pub fn parse_arbiter_reply(raw: &str, output: &TurnOutput) -> ArbiterDecision {
    let intervene = raw.to_lowercase().contains(INTERVENTION_MARKER);
    let gate_open = relay_gate_open(raw);

    let (relay_target, relay_text) = if gate_open && output.has_dialogue() {
        (output.dialogue_target.clone(), output.dialogue_text.clone())
    } else {
        (None, None)
    };

    ArbiterDecision {
        intervene,
        relay_target,
        relay_text,
        advisory: capture_one(raw, ADVISORY_MARKER),
        perception: capture_one(raw, ENVIRONMENT_MARKER),
    }
}

/// Whether the reply contains the relay gate pattern `1-{...} says to me{...}`.
fn relay_gate_open(raw: &str) -> bool {
    let Some(start) = raw.find("1-") else {
        return false;
    };
    let Some(after_marker) = raw.get(start..) else {
        return false;
    };
    let Some((_, rest)) = brace_group(after_marker) else {
        return false;
    };
    rest.trim_start().starts_with(RELAY_GATE_INFIX) && brace_group(rest).is_some()
}

/// Capture the single brace group following `marker`.
fn capture_one(raw: &str, marker: &str) -> Option<String> {
    let idx = raw.find(marker)?;
    let after = raw.get(idx.checked_add(marker.len())?..)?;
    let (content, _) = brace_group(after)?;
    let content = content.trim();
    (!content.is_empty()).then(|| content.to_owned())
}

/// Capture two consecutive brace groups following `marker`.
fn capture_two(raw: &str, marker: &str) -> Option<(String, String)> {
    let idx = raw.find(marker)?;
    let after = raw.get(idx.checked_add(marker.len())?..)?;
    let (first, rest) = brace_group(after)?;
    let (second, _) = brace_group(rest)?;
    let first = first.trim();
    let second = second.trim();
    (!first.is_empty() && !second.is_empty())
        .then(|| (first.to_owned(), second.to_owned()))
}

/// Extract the first `{...}` group in `text`, non-greedy.
///
/// Returns the group's content and the remainder after the closing brace.
/// Nested braces are not supported; the group ends at the first `}`.
fn brace_group(text: &str) -> Option<(&str, &str)> {
    let open = text.find('{')?;
    let after_open = text.get(open.checked_add(1)?..)?;
    let close = after_open.find('}')?;
    let content = after_open.get(..close)?;
    let rest = after_open.get(close.checked_add(1)?..)?;
    Some((content, rest))
}
