//! House clock, tick cycle, and orchestration for the flatshare simulation.
//!
//! This crate owns the per-actor sub-step cycle that drives the household:
//! drain the actor's inbox, take its turn, pass the result through the
//! arbiter's review, and route the resulting messages.
//!
//! # Modules
//!
//! - [`clock`] -- Simulated wall clock with tick counter and time-of-day
//!   derivation.
//! - [`config`] -- Configuration loading from `flatshare.yaml` into
//!   strongly-typed structs.
//! - [`decision`] -- [`ActorSource`] / [`ArbiterSource`] traits with stub
//!   and scripted implementations.
//! - [`mailbox`] -- Per-actor message queues with drain-on-read semantics.
//! - [`resources`] -- Shared-facility occupancy registry.
//! - [`tick`] -- The per-actor sub-step loop.
//! - [`runner`] -- The bounded simulation loop around [`tick`].
//!
//! [`ActorSource`]: decision::ActorSource
//! [`ArbiterSource`]: decision::ArbiterSource

pub mod clock;
pub mod config;
pub mod decision;
pub mod mailbox;
pub mod resources;
pub mod runner;
pub mod tick;
