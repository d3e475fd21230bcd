//! Shared-resource occupancy registry.
//!
//! The registry is pure bookkeeping: it tracks who holds which resource and
//! renders a stable textual snapshot for the arbiter prompt. It never raises
//! a conflict itself; conflict *judgment* is delegated upstream to the
//! arbiter's reasoning. Unknown resource names are inert and unknown
//! holders are no-ops.
//!
//! # Invariants
//!
//! - An exclusive resource has at most one holder at all times.
//! - A shared resource never exceeds its configured capacity.
//! - Holder order is insertion order, so the status snapshot is stable.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{OccupancyMode, ResourceConfig};

/// Occupancy state of a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResourceState {
    /// Single- or multi-occupant.
    mode: OccupancyMode,
    /// Maximum simultaneous holders (1 for exclusive resources).
    capacity: usize,
    /// Current holders, in acquisition order.
    holders: Vec<String>,
}

/// Registry of all shared resources in the household.
///
/// Keyed by a `BTreeMap` so iteration, and therefore
/// [`ResourceRegistry::status_text`], is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, ResourceState>,
}

impl ResourceRegistry {
    /// Build a registry from resource configuration, applying any seeded
    /// holders through the normal [`acquire`] path so the capacity
    /// invariants hold from tick 0.
    ///
    /// [`acquire`]: ResourceRegistry::acquire
    pub fn from_config(configs: &BTreeMap<String, ResourceConfig>) -> Self {
        let mut registry = Self::default();
        for (name, config) in configs {
            let capacity = match config.mode {
                OccupancyMode::Exclusive => 1,
                OccupancyMode::Shared => config.capacity.max(1),
            };
            registry.resources.insert(
                name.clone(),
                ResourceState {
                    mode: config.mode,
                    capacity,
                    holders: Vec::new(),
                },
            );
        }
        for (name, config) in configs {
            for holder in &config.initial_holders {
                registry.acquire(name, holder);
            }
        }
        registry
    }

    /// Whether `resource` has room for another holder right now.
    ///
    /// Exclusive resources are available only while empty; shared resources
    /// while below capacity. The answer does not depend on who is asking:
    /// a current holder of a full resource sees it as unavailable too
    /// (re-acquiring stays a no-op regardless). Unknown resource names are
    /// always available (fail-open: unmodeled resources never block actors).
    pub fn is_available(&self, resource: &str, _actor: &str) -> bool {
        self.resources
            .get(resource)
            .is_none_or(|state| state.holders.len() < state.capacity)
    }

    /// Record `actor` as a holder of `resource`.
    ///
    /// Idempotent per holder. For exclusive resources a new holder silently
    /// replaces the current one; for shared resources at capacity the call
    /// is a no-op. Unknown resource names are ignored.
    pub fn acquire(&mut self, resource: &str, actor: &str) {
        let Some(state) = self.resources.get_mut(resource) else {
            debug!(resource, actor, "acquire on unknown resource ignored");
            return;
        };
        if state.holders.iter().any(|h| h == actor) {
            return;
        }
        match state.mode {
            OccupancyMode::Exclusive => {
                state.holders.clear();
                state.holders.push(actor.to_owned());
            }
            OccupancyMode::Shared => {
                if state.holders.len() < state.capacity {
                    state.holders.push(actor.to_owned());
                } else {
                    debug!(resource, actor, "acquire on full shared resource ignored");
                }
            }
        }
    }

    /// Remove `actor` from the holder set of `resource`, if present.
    pub fn release(&mut self, resource: &str, actor: &str) {
        if let Some(state) = self.resources.get_mut(resource) {
            state.holders.retain(|h| h != actor);
        }
    }

    /// Current holders of a resource (empty for unknown names).
    pub fn holders(&self, resource: &str) -> &[String] {
        self.resources
            .get(resource)
            .map_or(&[], |state| state.holders.as_slice())
    }

    /// Render the stable multi-line occupancy snapshot fed verbatim to the
    /// arbiter prompt.
    ///
    /// One line per resource in name order:
    ///
    /// ```text
    /// - Bathroom: idle
    /// - Kitchen: in use by Zhang
    /// - Living room: Li, Ming
    /// ```
    ///
    /// The wording is a contract boundary: the arbiter's reasoning treats
    /// this text as ground truth, so it must stay stable and unambiguous.
    pub fn status_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.resources.len());
        for (name, state) in &self.resources {
            let line = if state.holders.is_empty() {
                format!("- {name}: idle")
            } else {
                match state.mode {
                    OccupancyMode::Exclusive => {
                        let holder = state.holders.join(", ");
                        format!("- {name}: in use by {holder}")
                    }
                    OccupancyMode::Shared => {
                        format!("- {name}: {}", state.holders.join(", "))
                    }
                }
            };
            lines.push(line);
        }
        lines.join("\n")
    }
}
