//! Inbound commands to the controller.
//!
//! These represent actions requested by the outside world (a status/command
//! surface, a scheduler, a test harness) that the
//! [`Controller`](crate::controller::Controller) interprets and acts upon.

use crate::actuator::{ActuatorId, BinaryState};
use crate::animation::SweepConfig;

/// Commands external adapters can send into the controller core.
#[derive(Debug, Clone)]
pub enum Command {
    /// Drive a logical actuator to a binary state.
    SetState { id: ActuatorId, state: BinaryState },

    /// Transition a state-machine actuator to a named state.
    Transition { id: ActuatorId, state: String },

    /// Play a directional sweep across a logical actuator's outputs.
    StartSweep { id: ActuatorId, config: SweepConfig },

    /// Discard any animation currently running for the actuator.
    StopAnimations { id: ActuatorId },
}
