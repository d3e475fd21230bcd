//! Collaborator boundary traits, with stub and scripted implementations.
//!
//! During each actor sub-step the scheduler hands a [`TurnContext`] to an
//! [`ActorSource`] and the resulting [`TurnOutput`] (plus the live resource
//! status) to an [`ArbiterSource`]. The traits abstract the mechanism by
//! which those payloads are produced -- an LLM chat session, a scripted
//! test double, or a stub.
//!
//! Failures at this boundary are never fatal: the scheduler substitutes a
//! safe default for any `Err`, so a misbehaving collaborator can only ever
//! degrade one sub-step, not stop the run. The stub sources double as the
//! offline mode of the binary, letting the full loop be exercised without
//! an LLM backend.

use std::collections::VecDeque;

use flatshare_types::{ArbiterDecision, TurnContext, TurnOutput};

/// Sentinel thought substituted when an actor collaborator fails.
pub const FALLBACK_THOUGHT: &str = "(thinking...)";

/// Errors that can occur at the collaborator boundary.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The external service was unreachable or returned an error.
    #[error("collaborator transport failure: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// An internal error in the source implementation.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// A source of actor turns.
pub trait ActorSource {
    /// Produce one actor's turn from its drained inbox and framing.
    ///
    /// Implementations are expected to degrade internally (sentinel thought,
    /// no dialogue) rather than fail; if they do return an error, the
    /// scheduler substitutes [`fallback_turn_output`] and the tick
    /// completes anyway.
    fn take_turn(
        &mut self,
        actor: &str,
        ctx: &TurnContext,
    ) -> impl Future<Output = Result<TurnOutput, DecisionError>>;
}

/// A source of arbiter decisions.
pub trait ArbiterSource {
    /// Review one actor's turn against the live resource status.
    ///
    /// On error the scheduler substitutes
    /// [`ArbiterDecision::relay_passthrough`].
    fn review(
        &mut self,
        resource_status: &str,
        output: &TurnOutput,
        ctx: &TurnContext,
    ) -> impl Future<Output = Result<ArbiterDecision, DecisionError>>;
}

/// The safe default turn: sentinel thought, no dialogue.
pub fn fallback_turn_output(actor: &str, ctx: &TurnContext) -> TurnOutput {
    TurnOutput {
        actor: actor.to_owned(),
        time_label: ctx.time_label.clone(),
        scene: ctx.scene.clone(),
        thought: Some(FALLBACK_THOUGHT.to_owned()),
        dialogue_target: None,
        dialogue_text: None,
    }
}

/// A stub actor source: every actor thinks the sentinel thought and says
/// nothing. Used for offline runs and to exercise the tick cycle in tests.
#[derive(Debug, Clone, Default)]
pub struct StubActorSource;

impl StubActorSource {
    /// Create a new stub actor source.
    pub const fn new() -> Self {
        Self
    }
}

impl ActorSource for StubActorSource {
    async fn take_turn(
        &mut self,
        actor: &str,
        ctx: &TurnContext,
    ) -> Result<TurnOutput, DecisionError> {
        Ok(fallback_turn_output(actor, ctx))
    }
}

/// A stub arbiter source: never intervenes, relays whatever dialogue the
/// actor supplied, and offers no advisory or perception.
#[derive(Debug, Clone, Default)]
pub struct StubArbiterSource;

impl StubArbiterSource {
    /// Create a new stub arbiter source.
    pub const fn new() -> Self {
        Self
    }
}

impl ArbiterSource for StubArbiterSource {
    async fn review(
        &mut self,
        _resource_status: &str,
        output: &TurnOutput,
        _ctx: &TurnContext,
    ) -> Result<ArbiterDecision, DecisionError> {
        Ok(ArbiterDecision::relay_passthrough(output))
    }
}

/// A scripted actor source replaying a fixed queue of results.
///
/// Used by tests that need deterministic turns; an exhausted queue yields
/// the stub fallback.
#[derive(Debug, Default)]
pub struct ScriptedActorSource {
    queue: VecDeque<Result<TurnOutput, DecisionError>>,
}

impl ScriptedActorSource {
    /// Create an empty scripted source.
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Queue a turn output to be returned by the next call.
    pub fn push(&mut self, output: TurnOutput) {
        self.queue.push_back(Ok(output));
    }

    /// Queue a failure to be returned by the next call.
    pub fn push_failure(&mut self, message: &str) {
        self.queue.push_back(Err(DecisionError::Transport {
            message: message.to_owned(),
        }));
    }
}

impl ActorSource for ScriptedActorSource {
    async fn take_turn(
        &mut self,
        actor: &str,
        ctx: &TurnContext,
    ) -> Result<TurnOutput, DecisionError> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| Ok(fallback_turn_output(actor, ctx)))
    }
}

/// A scripted arbiter source replaying a fixed queue of results.
///
/// An exhausted queue yields the relay-passthrough default.
#[derive(Debug, Default)]
pub struct ScriptedArbiterSource {
    queue: VecDeque<Result<ArbiterDecision, DecisionError>>,
}

impl ScriptedArbiterSource {
    /// Create an empty scripted source.
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Queue a decision to be returned by the next call.
    pub fn push(&mut self, decision: ArbiterDecision) {
        self.queue.push_back(Ok(decision));
    }

    /// Queue a failure to be returned by the next call.
    pub fn push_failure(&mut self, message: &str) {
        self.queue.push_back(Err(DecisionError::Transport {
            message: message.to_owned(),
        }));
    }
}

impl ArbiterSource for ScriptedArbiterSource {
    async fn review(
        &mut self,
        _resource_status: &str,
        output: &TurnOutput,
        _ctx: &TurnContext,
    ) -> Result<ArbiterDecision, DecisionError> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| Ok(ArbiterDecision::relay_passthrough(output)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_ctx() -> TurnContext {
        TurnContext {
            tick: 1,
            time_label: "Morning 07:15".to_owned(),
            scene: "Ming's room".to_owned(),
            inbox: Vec::new(),
        }
    }

    #[tokio::test]
    async fn stub_actor_thinks_the_sentinel() {
        let mut source = StubActorSource::new();
        let out = source.take_turn("Ming", &make_ctx()).await.unwrap();
        assert_eq!(out.actor, "Ming");
        assert_eq!(out.thought.as_deref(), Some(FALLBACK_THOUGHT));
        assert!(!out.has_dialogue());
    }

    #[tokio::test]
    async fn stub_arbiter_relays_passthrough() {
        let mut arbiter = StubArbiterSource::new();
        let ctx = make_ctx();
        let output = TurnOutput {
            actor: "Ming".to_owned(),
            time_label: ctx.time_label.clone(),
            scene: ctx.scene.clone(),
            thought: None,
            dialogue_target: Some("Li".to_owned()),
            dialogue_text: Some("morning".to_owned()),
        };
        let decision = arbiter.review("- Bathroom: idle", &output, &ctx).await.unwrap();
        assert!(decision.has_relay());
        assert_eq!(decision.relay_target.as_deref(), Some("Li"));
    }

    #[tokio::test]
    async fn scripted_actor_replays_then_falls_back() {
        let mut source = ScriptedActorSource::new();
        let ctx = make_ctx();
        source.push(TurnOutput::silent(
            "Li".to_owned(),
            ctx.time_label.clone(),
            ctx.scene.clone(),
        ));
        source.push_failure("backend down");

        let first = source.take_turn("Li", &ctx).await.unwrap();
        assert!(first.thought.is_none());

        let second = source.take_turn("Li", &ctx).await;
        assert!(second.is_err());

        // Exhausted queue: stub fallback.
        let third = source.take_turn("Li", &ctx).await.unwrap();
        assert_eq!(third.thought.as_deref(), Some(FALLBACK_THOUGHT));
    }
}
