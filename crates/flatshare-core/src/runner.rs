//! Simulation loop runner with operator controls.
//!
//! [`run_simulation`] is the top-level async function that drives the tick
//! loop with support for:
//!
//! - **Bounded runs**: stop after `max_ticks`
//! - **Paced ticks**: a configurable real-time interval between ticks
//! - **Clean stop**: a shared [`StopFlag`] (wired to ctrl-c by the binary)
//!   ends the run at the next tick boundary
//!
//! The runner wraps the single-tick [`run_tick`] function and adds the
//! control plane around it.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::decision::{ActorSource, ArbiterSource};
use crate::tick::{self, HouseholdState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// A shared flag used to request a clean stop from another task.
///
/// The binary arms this from a ctrl-c handler; the loop checks it before
/// every tick and the tick cycle checks it between sub-steps, so a raise
/// during a slow collaborator call takes effect as soon as that actor's
/// sub-step finishes. Once raised it stays raised.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
}

impl StopFlag {
    /// Create a new, unraised flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop at the next sub-step boundary.
    pub fn raise(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_raised(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Termination conditions for a simulation run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationBounds {
    /// Stop after this many ticks. Zero means unbounded.
    pub max_ticks: u64,
    /// Real-time pause between ticks, in milliseconds. Zero means no pause.
    pub tick_interval_ms: u64,
}

/// Why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// The configured tick limit was reached.
    MaxTicksReached,
    /// The stop flag was raised.
    Interrupted,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary produced, if any. A mid-tick interrupt leaves
    /// a partial summary here with its `interrupted` flag set.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Run the household loop until a termination condition is met.
///
/// Checks the stop flag before each tick and the tick limit after;
/// `max_ticks = 5` means exactly five completed ticks. A flag raised
/// mid-roster ends that tick at the sub-step boundary, and the partial
/// tick is not counted as completed.
///
/// # Errors
///
/// Returns [`RunError`] if a tick execution fails unrecoverably (clock
/// overflow); collaborator failures degrade within the tick and do not
/// surface here.
pub async fn run_simulation<A, B>(
    state: &mut HouseholdState,
    actor_source: &mut A,
    arbiter_source: &mut B,
    bounds: SimulationBounds,
    stop: &StopFlag,
) -> Result<SimulationResult, RunError>
where
    A: ActorSource,
    B: ArbiterSource,
{
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = bounds.max_ticks,
        tick_interval_ms = bounds.tick_interval_ms,
        roster = state.roster.len(),
        "Simulation starting"
    );

    loop {
        if stop.is_raised() {
            info!(total_ticks, "Stop requested");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::Interrupted,
                final_summary: last_summary,
                total_ticks,
            });
        }

        let summary = tick::run_tick(state, actor_source, arbiter_source, stop).await?;
        if summary.interrupted {
            info!(
                total_ticks,
                completed_sub_steps = summary.records.len(),
                "Stop requested mid-tick"
            );
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::Interrupted,
                final_summary: Some(summary),
                total_ticks,
            });
        }
        total_ticks = total_ticks.saturating_add(1);

        if bounds.max_ticks > 0 && total_ticks >= bounds.max_ticks {
            info!(total_ticks, max_ticks = bounds.max_ticks, "Tick limit reached");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::MaxTicksReached,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);

        if bounds.tick_interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(bounds.tick_interval_ms))
                .await;
        }
    }
}

/// Log the simulation end sequence.
///
/// Called by the binary after [`run_simulation`] returns.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if result.final_summary.is_none() && result.total_ticks == 0 {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::decision::{StubActorSource, StubArbiterSource};

    fn make_state() -> HouseholdState {
        let config = SimulationConfig::parse("{}").unwrap();
        HouseholdState::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut state = make_state();
        let mut actors = StubActorSource::new();
        let mut arbiter = StubArbiterSource::new();
        let bounds = SimulationBounds {
            max_ticks: 5,
            tick_interval_ms: 0,
        };

        let result = run_simulation(&mut state, &mut actors, &mut arbiter, bounds, &StopFlag::new())
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(state.clock.tick(), 5);
    }

    #[tokio::test]
    async fn raised_flag_stops_before_the_first_tick() {
        let mut state = make_state();
        let mut actors = StubActorSource::new();
        let mut arbiter = StubArbiterSource::new();
        let bounds = SimulationBounds {
            max_ticks: 0,
            tick_interval_ms: 0,
        };
        let stop = StopFlag::new();
        stop.raise();

        let result = run_simulation(&mut state, &mut actors, &mut arbiter, bounds, &stop)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::Interrupted);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn final_summary_reports_the_last_tick() {
        let mut state = make_state();
        let mut actors = StubActorSource::new();
        let mut arbiter = StubArbiterSource::new();
        let bounds = SimulationBounds {
            max_ticks: 3,
            tick_interval_ms: 0,
        };

        let result = run_simulation(&mut state, &mut actors, &mut arbiter, bounds, &StopFlag::new())
            .await
            .unwrap();

        let summary = result.final_summary.unwrap();
        // Ticks are zero-based; the third tick to run is tick 2.
        assert_eq!(summary.tick, 2);
        assert_eq!(summary.records.len(), 4);
    }

    #[tokio::test]
    async fn mid_tick_interrupt_does_not_count_the_partial_tick() {
        use flatshare_types::{TurnContext, TurnOutput};

        use crate::decision::{ActorSource, DecisionError};

        struct InterruptingActorSource {
            stop: StopFlag,
            inner: StubActorSource,
        }

        impl ActorSource for InterruptingActorSource {
            async fn take_turn(
                &mut self,
                actor: &str,
                ctx: &TurnContext,
            ) -> Result<TurnOutput, DecisionError> {
                self.stop.raise();
                self.inner.take_turn(actor, ctx).await
            }
        }

        let mut state = make_state();
        let stop = StopFlag::new();
        let mut actors = InterruptingActorSource {
            stop: stop.clone(),
            inner: StubActorSource::new(),
        };
        let mut arbiter = StubArbiterSource::new();
        let bounds = SimulationBounds {
            max_ticks: 3,
            tick_interval_ms: 0,
        };

        let result = run_simulation(&mut state, &mut actors, &mut arbiter, bounds, &stop)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::Interrupted);
        assert_eq!(result.total_ticks, 0);
        let summary = result.final_summary.unwrap();
        assert!(summary.interrupted);
        // Only the first flatmate got a sub-step before the flag took effect.
        assert_eq!(summary.records.len(), 1);
        assert_eq!(state.clock.tick(), 0);
    }

    #[test]
    fn stop_flag_clones_share_state() {
        let stop = StopFlag::new();
        let other = stop.clone();
        assert!(!other.is_raised());
        stop.raise();
        assert!(other.is_raised());
    }
}
