//! An actuator whose behaviour is a set of named target configurations.
//!
//! Each state binds two independent port groups — ports driven High and
//! ports driven Low — plus targets for subordinate actuators, resolved to
//! their backing ports at construction time. `transition_to` applies every
//! binding before the new name is considered current.
//!
//! Per-device atomicity comes from the bus flush batching all shadow writes
//! into one transaction. Across *different* devices no atomicity is
//! guaranteed; callers needing cross-device synchrony must not rely on it.

use log::info;

use crate::actuator::{ActuatorId, BinaryState};
use crate::error::{Error, Result};
use crate::hw::{Bus, BusTransport, Level, Port};

/// A subordinate actuator target, resolved to concrete ports at build time.
#[derive(Debug, Clone)]
pub struct SubordinateTarget {
    pub id: ActuatorId,
    pub target: BinaryState,
    /// The subordinate's backing ports, cloned when the reference was
    /// resolved. Driving them *is* setting the subordinate's state, since a
    /// logical actuator's state is a pure function of its ports.
    pub ports: Vec<Port>,
}

/// Everything one named state drives.
#[derive(Debug, Clone, Default)]
pub struct StateDefinition {
    high_ports: Vec<Port>,
    low_ports: Vec<Port>,
    subordinates: Vec<SubordinateTarget>,
}

impl StateDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a port driven High while this state is current.
    pub fn bind_high(&mut self, port: Port) -> &mut Self {
        self.high_ports.push(port);
        self
    }

    /// Bind a port driven Low while this state is current.
    pub fn bind_low(&mut self, port: Port) -> &mut Self {
        self.low_ports.push(port);
        self
    }

    /// Bind a subordinate actuator target.
    pub fn bind_subordinate(
        &mut self,
        id: ActuatorId,
        ports: Vec<Port>,
        target: BinaryState,
    ) -> &mut Self {
        self.subordinates.push(SubordinateTarget { id, target, ports });
        self
    }

    pub fn high_ports(&self) -> &[Port] {
        &self.high_ports
    }

    pub fn low_ports(&self) -> &[Port] {
        &self.low_ports
    }

    pub fn subordinates(&self) -> &[SubordinateTarget] {
        &self.subordinates
    }

    /// Every port this state touches (validation helper).
    pub fn all_ports(&self) -> impl Iterator<Item = &Port> {
        self.high_ports
            .iter()
            .chain(&self.low_ports)
            .chain(self.subordinates.iter().flat_map(|s| s.ports.iter()))
    }
}

/// A named-state actuator.
#[derive(Debug)]
pub struct StateMachineActuator {
    id: ActuatorId,
    /// Declaration order is preserved; names are unique.
    states: Vec<(String, StateDefinition)>,
    current: Option<String>,
}

impl StateMachineActuator {
    pub fn new(id: ActuatorId) -> Self {
        Self {
            id,
            states: Vec::new(),
            current: None,
        }
    }

    pub fn id(&self) -> &ActuatorId {
        &self.id
    }

    /// Declare a state and return its mutable definition to accumulate
    /// bindings. Re-declaring an existing name returns the existing
    /// definition.
    pub fn add_state(&mut self, name: &str) -> &mut StateDefinition {
        if let Some(idx) = self.states.iter().position(|(n, _)| n == name) {
            return &mut self.states[idx].1;
        }
        self.states.push((name.to_string(), StateDefinition::new()));
        &mut self.states.last_mut().unwrap().1
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.iter().any(|(n, _)| n == name)
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(n, _)| n.as_str())
    }

    pub fn state(&self, name: &str) -> Option<&StateDefinition> {
        self.states.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// The committed state name, `None` before the first transition.
    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Apply the named state as one logical unit: every high binding, every
    /// low binding, and every subordinate target, then commit the name.
    ///
    /// An undeclared name fails with [`Error::UnknownState`] and changes
    /// nothing — no port is written, the current name stays.
    pub fn transition_to<T: BusTransport>(&mut self, name: &str, bus: &mut Bus<T>) -> Result<()> {
        let Some((_, definition)) = self.states.iter().find(|(n, _)| n == name) else {
            return Err(Error::UnknownState {
                actuator: self.id.clone(),
                state: name.to_string(),
            });
        };

        for port in &definition.high_ports {
            bus.write_port(port, Level::High)?;
        }
        for port in &definition.low_ports {
            bus.write_port(port, Level::Low)?;
        }
        for sub in &definition.subordinates {
            for port in &sub.ports {
                bus.write_port(port, sub.target.level())?;
            }
        }

        info!(
            "state machine '{}': {} -> {name}",
            self.id,
            self.current.as_deref().unwrap_or("<none>"),
        );
        self.current = Some(name.to_string());
        Ok(())
    }
}
