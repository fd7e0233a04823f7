//! Engine status transitions.
//!
//! Lifecycle: Initialised → Active ↔ Idle → Error → Initialised.
//!
//! ```text
//!               Activate            Starved / AbortRequested
//! Initialised ───────────▶ Active ─────────────────────────▶ Idle
//!      │                    ▲  │                              │
//!      │ ActivationFailed   │  └──────── Fault ───────┐       │
//!      ▼                    └────── Resumed ──────────┼───────┘
//!    Error ◀──────────────────────────────────────────┘ Fault
//!      │
//!      └──── Reinitialise ───▶ Initialised
//! ```

use trajscan_common::engine::state::EngineStatus;

/// Result of a status transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, new status.
    Ok(EngineStatus),
    /// Transition rejected with a reason.
    Rejected(&'static str),
}

/// Events that drive the engine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Host activation with a valid axis selection.
    Activate,
    /// Host activation with an invalid axis selection.
    ActivationFailed,
    /// Current buffer exhausted with nothing fresh to swap in.
    Starved,
    /// Fresh data or abort release while idle.
    Resumed,
    /// Host raised `Abort`.
    AbortRequested,
    /// Zero move time or servo runtime/following error.
    Fault,
    /// Host re-initialisation. Allowed from every status.
    Reinitialise,
}

/// Holder of the current [`EngineStatus`].
#[derive(Debug, Clone)]
pub struct EngineStateMachine {
    status: EngineStatus,
}

impl EngineStateMachine {
    pub const fn new() -> Self {
        Self {
            status: EngineStatus::Initialised,
        }
    }

    #[inline]
    pub const fn status(&self) -> EngineStatus {
        self.status
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: EngineEvent) -> TransitionResult {
        use EngineEvent::*;
        use EngineStatus::*;

        let next = match (self.status, event) {
            (Initialised, Activate) => Active,
            (Initialised, ActivationFailed) => Error,

            (Active, Starved) => Idle,
            (Active, AbortRequested) => Idle,
            (Idle, Resumed) => Active,

            (Active | Idle, Fault) => Error,

            (_, Reinitialise) => Initialised,

            _ => {
                return TransitionResult::Rejected(invalid_transition_reason(self.status, event));
            }
        };

        self.status = next;
        TransitionResult::Ok(next)
    }
}

impl Default for EngineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_transition_reason(status: EngineStatus, event: EngineEvent) -> &'static str {
    use EngineEvent::*;
    use EngineStatus::*;
    match (status, event) {
        (Error, _) => "Error: only Reinitialise allowed",
        (_, Activate | ActivationFailed) => "activation only allowed from Initialised",
        (Initialised, _) => "Initialised: engine not activated",
        (Active, Resumed) => "Active: already consuming",
        (Idle, Starved | AbortRequested) => "Idle: already stopped",
        (Active | Idle, _) => "invalid event for current status",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
