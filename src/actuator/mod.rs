//! Actuator layer: named abstractions over one or more ports.
//!
//! Two concrete kinds exist, held in a closed registry enum:
//!
//! - [`LogicalActuator`](logical::LogicalActuator) — one id fanning out to
//!   N output ports with a uniform on/off contract;
//! - [`StateMachineActuator`](state_machine::StateMachineActuator) — named
//!   states, each binding a full target pattern of ports and subordinate
//!   actuators.

pub mod logical;
pub mod state_machine;

pub use logical::LogicalActuator;
pub use state_machine::{StateDefinition, StateMachineActuator};

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::hw::Level;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Controller-unique actuator identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorId(String);

impl ActuatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActuatorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Commandable state of a binary actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryState {
    Off,
    On,
}

impl BinaryState {
    /// The port level this state drives (before per-port inversion).
    pub fn level(self) -> Level {
        match self {
            Self::On => Level::High,
            Self::Off => Level::Low,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl From<Level> for BinaryState {
    fn from(level: Level) -> Self {
        match level {
            Level::High => Self::On,
            Level::Low => Self::Off,
        }
    }
}

/// Observed state of a multi-output actuator.
///
/// `Mixed` is reported when the backing ports disagree — normal for a
/// multi-output actuator mid-transition or mid-animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Off,
    On,
    Mixed,
}

impl From<BinaryState> for ActuatorState {
    fn from(state: BinaryState) -> Self {
        match state {
            BinaryState::On => Self::On,
            BinaryState::Off => Self::Off,
        }
    }
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::On => f.write_str("on"),
            Self::Mixed => f.write_str("mixed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry entry
// ---------------------------------------------------------------------------

/// Closed registry variant: every actuator the controller can hold.
///
/// Configuration-driven construction maps a type tag to one of these at
/// startup; no runtime reflection.
#[derive(Debug)]
pub enum ActuatorKind {
    Logical(LogicalActuator),
    StateMachine(StateMachineActuator),
}

impl ActuatorKind {
    pub fn id(&self) -> &ActuatorId {
        match self {
            Self::Logical(a) => a.id(),
            Self::StateMachine(a) => a.id(),
        }
    }
}
