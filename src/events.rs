//! Outbound controller events.
//!
//! The [`Controller`](crate::controller::Controller) emits these through the
//! [`EventSink`] seam. Adapters on the other side decide what to do with
//! them — log them, publish them to a status surface, feed a test
//! recorder. The core never pushes notifications anywhere else.

use crate::actuator::{ActuatorId, ActuatorState};
use crate::error::BusError;

/// Structured events emitted by the controller core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A binary actuator was commanded to a new state.
    StateChanged {
        id: ActuatorId,
        state: ActuatorState,
    },

    /// A state-machine actuator committed a named state.
    TransitionApplied { id: ActuatorId, state: String },

    /// A sweep animation began playing for the actuator.
    SweepStarted { id: ActuatorId },

    /// A sweep was requested but the actuator has fewer than two backing
    /// outputs — defined no-op, nothing changed.
    SweepSkipped { id: ActuatorId },

    /// A sweep applied its last frame and was removed.
    SweepFinished { id: ActuatorId },

    /// A bus transaction failed this tick. The affected device's pending
    /// bits are retried automatically on the next tick.
    BusFault(BusError),
}

/// Where controller events go.
pub trait EventSink {
    fn emit(&mut self, event: &ControllerEvent);
}

/// Sink that drops every event, for hosts that only poll state.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &ControllerEvent) {}
}
