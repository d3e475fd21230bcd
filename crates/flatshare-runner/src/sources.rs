//! LLM-backed implementations of the engine's collaborator traits.
//!
//! [`LlmActorSource`] holds one [`ChatSession`] per roster member (the
//! persona as the system message) and [`LlmArbiterSource`] holds a single
//! session for the whole household. Both render their prompts with the
//! shared [`PromptEngine`], call the shared [`LlmBackend`], and scrape the
//! reply with `parse`.
//!
//! Failures never cross the engine boundary: a transport or render error
//! is logged and degraded to the safe default (sentinel thought for an
//! actor, relay passthrough for the arbiter), so one bad call costs one
//! sub-step, not the run.

use std::collections::BTreeMap;
use std::sync::Arc;

use flatshare_core::decision::{
    ActorSource, ArbiterSource, DecisionError, fallback_turn_output,
};
use flatshare_types::{ArbiterDecision, Message, TurnContext, TurnOutput};
use tracing::{debug, warn};

use crate::llm::LlmBackend;
use crate::parse;
use crate::prompt::{Persona, PromptEngine};
use crate::session::ChatSession;

/// Actor collaborator: one chat session per roster member.
pub struct LlmActorSource {
    backend: Arc<LlmBackend>,
    engine: Arc<PromptEngine>,
    sessions: BTreeMap<String, ChatSession>,
    reminders: BTreeMap<String, String>,
    history_limit: usize,
}

impl LlmActorSource {
    /// Create an actor source with no registered members.
    pub fn new(
        backend: Arc<LlmBackend>,
        engine: Arc<PromptEngine>,
        history_limit: usize,
    ) -> Self {
        Self {
            backend,
            engine,
            sessions: BTreeMap::new(),
            reminders: BTreeMap::new(),
            history_limit,
        }
    }

    /// Register a roster member with its persona.
    pub fn register_actor(&mut self, name: &str, persona: Persona) {
        self.sessions.insert(
            name.to_owned(),
            ChatSession::new(persona.system, self.history_limit),
        );
        if let Some(reminder) = persona.per_turn {
            self.reminders.insert(name.to_owned(), reminder);
        }
    }

    /// Build the turn prompt for one actor.
    fn build_prompt(&self, actor: &str, ctx: &TurnContext) -> Result<String, DecisionError> {
        let context = serde_json::json!({
            "actor": actor,
            "tick": ctx.tick,
            "time_label": ctx.time_label,
            "scene": ctx.scene,
            "inbox": ctx.inbox.iter().map(message_json).collect::<Vec<_>>(),
        });

        let mut prompt = self
            .engine
            .render_actor_turn(&context)
            .map_err(|e| DecisionError::Internal {
                message: e.to_string(),
            })?;

        if let Some(reminder) = self.reminders.get(actor) {
            prompt.push_str("\n\n");
            prompt.push_str(reminder);
        }
        Ok(prompt)
    }
}

impl ActorSource for LlmActorSource {
    async fn take_turn(
        &mut self,
        actor: &str,
        ctx: &TurnContext,
    ) -> Result<TurnOutput, DecisionError> {
        let prompt = match self.build_prompt(actor, ctx) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(actor, %err, "turn prompt render failed, using fallback");
                return Ok(fallback_turn_output(actor, ctx));
            }
        };

        let backend = Arc::clone(&self.backend);
        let history_limit = self.history_limit;
        let session = self
            .sessions
            .entry(actor.to_owned())
            .or_insert_with(|| {
                warn!(actor, "no persona registered, starting a bare session");
                ChatSession::new(format!("You are {actor}."), history_limit)
            });

        match backend.complete(session, &prompt).await {
            Ok(reply) => {
                debug!(actor, tick = ctx.tick, "actor reply received");
                let output =
                    parse::parse_actor_reply(actor, &ctx.time_label, &ctx.scene, &reply);
                session.record_exchange(prompt, reply);
                Ok(output)
            }
            Err(err) => {
                warn!(actor, tick = ctx.tick, %err, "actor LLM call failed, using fallback");
                Ok(fallback_turn_output(actor, ctx))
            }
        }
    }
}

/// Arbiter collaborator: a single chat session across the whole run.
pub struct LlmArbiterSource {
    backend: Arc<LlmBackend>,
    engine: Arc<PromptEngine>,
    session: ChatSession,
}

impl LlmArbiterSource {
    /// Create the arbiter source with its persona.
    pub fn new(
        backend: Arc<LlmBackend>,
        engine: Arc<PromptEngine>,
        persona: Persona,
        history_limit: usize,
    ) -> Self {
        Self {
            backend,
            engine,
            session: ChatSession::new(persona.system, history_limit),
        }
    }

    fn build_prompt(
        &self,
        resource_status: &str,
        output: &TurnOutput,
        ctx: &TurnContext,
    ) -> Result<String, DecisionError> {
        let context = serde_json::json!({
            "resource_status": resource_status,
            "actor": output.actor,
            "tick": ctx.tick,
            "time_label": ctx.time_label,
            "scene": ctx.scene,
            "thought": output.thought,
            "dialogue_target": output.dialogue_target,
            "dialogue_text": output.dialogue_text,
        });

        self.engine
            .render_arbiter_review(&context)
            .map_err(|e| DecisionError::Internal {
                message: e.to_string(),
            })
    }
}

impl ArbiterSource for LlmArbiterSource {
    async fn review(
        &mut self,
        resource_status: &str,
        output: &TurnOutput,
        ctx: &TurnContext,
    ) -> Result<ArbiterDecision, DecisionError> {
        let prompt = match self.build_prompt(resource_status, output, ctx) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(actor = %output.actor, %err, "review prompt render failed, relaying as-is");
                return Ok(ArbiterDecision::relay_passthrough(output));
            }
        };

        match self.backend.complete(&self.session, &prompt).await {
            Ok(reply) => {
                debug!(actor = %output.actor, tick = ctx.tick, "arbiter reply received");
                let decision = parse::parse_arbiter_reply(&reply, output);
                self.session.record_exchange(prompt, reply);
                Ok(decision)
            }
            Err(err) => {
                warn!(
                    actor = %output.actor,
                    tick = ctx.tick,
                    %err,
                    "arbiter LLM call failed, relaying as-is"
                );
                Ok(ArbiterDecision::relay_passthrough(output))
            }
        }
    }
}

/// Serialize an inbox message for template rendering.
fn message_json(message: &Message) -> serde_json::Value {
    serde_json::json!({
        "from": message.origin.display_name(),
        "kind": format!("{:?}", message.kind),
        "body": message.body,
        "tick": message.tick,
    })
}
