//! Transition lifecycle notifications.
//!
//! Every transition that gets past the no-op check produces a `Start` event,
//! followed by exactly one of `Success` or `Error` unless it is prevented or
//! superseded. Events go to registered [`TransitionListener`]s first and then
//! to the broadcast channel returned by `Router::subscribe`.

use crate::error::ResolveError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use waymark_core::Params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    Start,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionEvent {
    /// Shared by every event of one transition.
    pub id: Uuid,
    pub phase: TransitionPhase,
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub from_params: Params,
    pub to: String,
    pub to_params: Params,
    /// Rendered failure reason for `Error` events.
    pub error: Option<String>,
}

/// Outcome of a start notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    Proceed,
    Prevent,
}

/// Synchronous lifecycle observer.
///
/// Listeners run on the task driving the transition. They may read the router
/// but must not block on another transition.
pub trait TransitionListener: Send + Sync {
    /// Any listener returning [`StartDecision::Prevent`] cancels the transition
    /// before resolution begins.
    fn on_start(&self, _event: &TransitionEvent) -> StartDecision {
        StartDecision::Proceed
    }

    fn on_success(&self, _event: &TransitionEvent) {}

    fn on_error(&self, _event: &TransitionEvent, _error: &ResolveError) {}
}
