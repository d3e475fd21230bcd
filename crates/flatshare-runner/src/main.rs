//! Entry point for the flatshare simulation.
//!
//! Wires the household engine to the LLM runtime: loads the household YAML
//! and environment configuration, builds the initial state, selects the
//! collaborator sources (LLM-backed or offline stubs), and drives the
//! bounded tick loop until it ends or ctrl-c raises the stop flag.
//!
//! # Architecture
//!
//! ```text
//! inbox --> Prompt Engine --> LLM Backend --> Parser --> arbiter review --> mailboxes
//! ```
//!
//! Every actor gets one turn per tick. If an LLM call fails, the sub-step
//! degrades to a safe default so the household never misses a tick.

mod config;
mod error;
mod llm;
mod parse;
mod prompt;
mod session;
mod sources;

use std::path::Path;
use std::sync::Arc;

use flatshare_core::config::SimulationConfig;
use flatshare_core::decision::{StubActorSource, StubArbiterSource};
use flatshare_core::runner::{self, SimulationBounds, StopFlag};
use flatshare_core::tick::HouseholdState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::RuntimeConfig;
use crate::llm::create_backend;
use crate::prompt::{Persona, PromptEngine, load_persona};
use crate::sources::{LlmActorSource, LlmArbiterSource};

/// Persona file expected for the arbiter.
const ARBITER_PERSONA_FILE: &str = "arbiter.txt";

/// Application entry point.
///
/// Initializes logging, loads configuration, builds the household state,
/// then runs the bounded simulation loop.
///
/// # Errors
///
/// Returns an error if initialization fails; collaborator failures during
/// the run degrade per sub-step instead of surfacing here.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("flatshare starting");

    let runtime = RuntimeConfig::from_env()?;
    let household = SimulationConfig::from_file(Path::new(&runtime.household_config))?;
    info!(
        config = runtime.household_config,
        name = household.household.name,
        roster = household.roster.len(),
        resources = household.resources.len(),
        "household configuration loaded"
    );

    let mut state = HouseholdState::from_config(&household)?;
    let bounds = SimulationBounds {
        max_ticks: household.household.max_ticks,
        tick_interval_ms: household.household.tick_interval_ms,
    };

    let stop = StopFlag::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, stopping at the next tick boundary");
            ctrl_c_stop.raise();
        }
    });

    let result = match runtime.backend {
        Some(ref backend_config) => {
            let backend = Arc::new(create_backend(backend_config));
            info!(
                backend = backend.name(),
                model = backend_config.model,
                "LLM backend configured"
            );

            let engine = Arc::new(PromptEngine::new(&runtime.templates_dir)?);
            info!(
                templates_dir = runtime.templates_dir,
                "prompt templates loaded"
            );

            let mut actors = LlmActorSource::new(
                Arc::clone(&backend),
                Arc::clone(&engine),
                runtime.history_limit,
            );
            for entry in &household.roster {
                let persona = roster_persona(&runtime.personas_dir, &entry.name, entry.persona_file.as_deref());
                actors.register_actor(&entry.name, persona);
            }

            let arbiter_persona = load_persona(&runtime.personas_dir, ARBITER_PERSONA_FILE)
                .unwrap_or_else(|err| {
                    warn!(%err, "arbiter persona missing, using a built-in default");
                    Persona {
                        system: "You supervise a shared flat. Relay dialogue between \
                                 flatmates and intervene only when the house rules need it."
                            .to_owned(),
                        per_turn: None,
                    }
                });
            let mut arbiter = LlmArbiterSource::new(
                backend,
                engine,
                arbiter_persona,
                runtime.history_limit,
            );

            info!("entering tick loop with LLM collaborators");
            runner::run_simulation(&mut state, &mut actors, &mut arbiter, bounds, &stop)
                .await?
        }
        None => {
            info!("no LLM backend configured, entering tick loop with offline stubs");
            let mut actors = StubActorSource::new();
            let mut arbiter = StubArbiterSource::new();
            runner::run_simulation(&mut state, &mut actors, &mut arbiter, bounds, &stop)
                .await?
        }
    };

    runner::log_simulation_end(&result);
    Ok(())
}

/// Load a roster member's persona, falling back to a generated one.
fn roster_persona(personas_dir: &str, name: &str, persona_file: Option<&str>) -> Persona {
    let filename = persona_file.map_or_else(
        || format!("{}.txt", name.to_lowercase()),
        ToOwned::to_owned,
    );
    load_persona(personas_dir, &filename).unwrap_or_else(|err| {
        warn!(actor = name, %err, "persona missing, using a built-in default");
        Persona {
            system: format!("You are {name}, one of the flatmates sharing this apartment."),
            per_turn: None,
        }
    })
}
