//! Tick cycle: the per-actor sub-step loop that drives the household.
//!
//! Each tick walks the roster in order. For every actor the scheduler runs
//! one sub-step:
//!
//! 1. **Drain** -- take the actor's queued inbox messages (destructive; they
//!    are presented exactly once).
//!
//! 2. **Act** -- hand the inbox plus tick framing to the [`ActorSource`] and
//!    receive the actor's thought and optional dialogue.
//!
//! 3. **Review** -- hand the actor's output plus the live resource status to
//!    the [`ArbiterSource`] and receive a routing decision.
//!
//! 4. **Route** -- enqueue relayed dialogue into each recipient's mailbox,
//!    and any advisory or perception into the actor's own mailbox. Messages
//!    enqueued here surface on the *next* tick.
//!
//! After every actor has had its sub-step, the clock advances. Any failure
//! at the collaborator boundary degrades that one sub-step to a safe
//! default; `run_tick` itself only fails on clock overflow.
//!
//! The end of a sub-step is the interrupt boundary: a raised [`StopFlag`]
//! ends the tick before the next actor starts, and an interrupted tick does
//! not advance the clock.
//!
//! [`StopFlag`]: crate::runner::StopFlag
//!
//! The cycle is deterministic given the same initial state and collaborator
//! outputs.

use flatshare_types::{ArbiterDecision, Message, TurnContext, TurnOutput};
use tracing::{debug, info, warn};

use crate::clock::HouseClock;
use crate::config::SimulationConfig;
use crate::decision::{self, ActorSource, ArbiterSource};
use crate::mailbox::MailboxRouter;
use crate::resources::ResourceRegistry;
use crate::runner::StopFlag;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::clock::ClockError,
    },
}

/// One roster member with its resolved scene framing.
#[derive(Debug, Clone)]
pub struct HouseholdMember {
    /// The actor's display name, unique within the roster.
    pub name: String,
    /// The actor's situational framing (e.g. `"Ming's room"`).
    pub scene: String,
}

/// The mutable household state threaded through the tick cycle.
#[derive(Debug)]
pub struct HouseholdState {
    /// The simulated wall clock.
    pub clock: HouseClock,
    /// Shared-facility occupancy.
    pub registry: ResourceRegistry,
    /// Per-actor message queues.
    pub mailboxes: MailboxRouter,
    /// The roster, in sub-step order.
    pub roster: Vec<HouseholdMember>,
}

impl HouseholdState {
    /// Build the initial state from configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, TickError> {
        let clock = HouseClock::new(&config.household)?;
        let registry = ResourceRegistry::from_config(&config.resources);
        let roster: Vec<HouseholdMember> = config
            .roster
            .iter()
            .map(|entry| HouseholdMember {
                name: entry.name.clone(),
                scene: entry.scene_label(),
            })
            .collect();
        let mailboxes = MailboxRouter::new(roster.iter().map(|m| m.name.clone()));

        Ok(Self {
            clock,
            registry,
            mailboxes,
            roster,
        })
    }
}

/// What happened in one actor's sub-step.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    /// The actor's parsed output.
    pub output: TurnOutput,
    /// The arbiter's routing decision.
    pub decision: ArbiterDecision,
    /// How many inbox messages the actor was shown.
    pub inbox_size: usize,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// The time label the tick ran at.
    pub time_label: String,
    /// One record per completed sub-step, in roster order.
    pub records: Vec<TurnRecord>,
    /// Whether the stop flag cut the roster short. An interrupted tick has
    /// fewer records than roster members and did not advance the clock.
    pub interrupted: bool,
}

/// Execute one tick of the household.
///
/// Walks the roster in order, running the drain/act/review/route sub-step
/// for each member, then advances the clock. A stop flag raised while the
/// roster is being walked ends the tick at the next sub-step boundary; the
/// clock only advances when every member had its sub-step. This is the main
/// entry point for the engine.
pub async fn run_tick<A, B>(
    state: &mut HouseholdState,
    actor_source: &mut A,
    arbiter_source: &mut B,
    stop: &StopFlag,
) -> Result<TickSummary, TickError>
where
    A: ActorSource,
    B: ArbiterSource,
{
    let tick = state.clock.tick();
    let time_label = state.clock.time_label();
    info!(tick, time = %time_label, "Tick started");

    let mut records = Vec::with_capacity(state.roster.len());
    let roster = state.roster.clone();
    let mut interrupted = false;

    for member in &roster {
        if stop.is_raised() {
            info!(tick, next = %member.name, "Stop requested, ending tick early");
            interrupted = true;
            break;
        }
        let record = run_sub_step(state, actor_source, arbiter_source, member, tick).await;
        records.push(record);
    }

    if !interrupted {
        state.clock.advance()?;
    }

    Ok(TickSummary {
        tick,
        time_label,
        records,
        interrupted,
    })
}

/// Run the drain/act/review/route cycle for one roster member.
async fn run_sub_step<A, B>(
    state: &mut HouseholdState,
    actor_source: &mut A,
    arbiter_source: &mut B,
    member: &HouseholdMember,
    tick: u64,
) -> TurnRecord
where
    A: ActorSource,
    B: ArbiterSource,
{
    let inbox = state.mailboxes.drain(&member.name);
    let inbox_size = inbox.len();
    let ctx = TurnContext {
        tick,
        time_label: state.clock.time_label(),
        scene: member.scene.clone(),
        inbox,
    };

    let output = match actor_source.take_turn(&member.name, &ctx).await {
        Ok(output) => output,
        Err(err) => {
            warn!(tick, actor = %member.name, %err, "Actor turn failed, using fallback");
            decision::fallback_turn_output(&member.name, &ctx)
        }
    };

    let resource_status = state.registry.status_text();
    let decision = match arbiter_source.review(&resource_status, &output, &ctx).await {
        Ok(decision) => decision,
        Err(err) => {
            warn!(tick, actor = %member.name, %err, "Arbiter review failed, relaying as-is");
            ArbiterDecision::relay_passthrough(&output)
        }
    };

    route_decision(state, member, &output, &decision, tick);

    debug!(
        tick,
        actor = %member.name,
        intervene = decision.intervene,
        relayed = decision.has_relay(),
        "Sub-step complete"
    );

    TurnRecord {
        output,
        decision,
        inbox_size,
    }
}

/// Enqueue the messages produced by one sub-step's routing decision.
///
/// Relayed dialogue goes to each named recipient; advisories and perceptions
/// go back to the acting actor. Unknown recipients are dropped by the
/// router. Everything enqueued here surfaces on the next tick.
fn route_decision(
    state: &mut HouseholdState,
    member: &HouseholdMember,
    output: &TurnOutput,
    decision: &ArbiterDecision,
    tick: u64,
) {
    if decision.has_relay() {
        let text = decision.relay_text.clone().unwrap_or_default();
        for target in decision.relay_targets() {
            state.mailboxes.enqueue(
                target,
                Message::dialogue(output.actor.clone(), text.clone(), tick),
            );
        }
    }

    if let Some(advisory) = &decision.advisory {
        state
            .mailboxes
            .enqueue(&member.name, Message::advisory(advisory.clone(), tick));
    }

    if let Some(perception) = &decision.perception {
        state
            .mailboxes
            .enqueue(&member.name, Message::perception(perception.clone(), tick));
    }
}
