//! A named actuator backed by one or more output ports.
//!
//! Hides how many physical bits an actuator controls: a single relay and a
//! five-channel LED strip expose the same set/get contract. Writes to ports
//! on the same device are coalesced by the bus flush, so a multi-port set
//! never exposes an intermediate pattern to that device.

use crate::actuator::{ActuatorId, ActuatorState, BinaryState};
use crate::error::Result;
use crate::hw::{Bus, BusTransport, Port};

/// One id, N backing output ports.
#[derive(Debug, Clone)]
pub struct LogicalActuator {
    id: ActuatorId,
    ports: Vec<Port>,
    /// Last commanded state, used as the aggregate answer while the backing
    /// ports agree with it.
    commanded: Option<BinaryState>,
}

impl LogicalActuator {
    pub fn new(id: ActuatorId, ports: Vec<Port>) -> Self {
        Self {
            id,
            ports,
            commanded: None,
        }
    }

    pub fn id(&self) -> &ActuatorId {
        &self.id
    }

    /// Backing ports in their configured (natural) order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn output_count(&self) -> usize {
        self.ports.len()
    }

    /// Drive every backing port to `state`. The hardware sees the change on
    /// the next bus flush.
    pub fn set_state<T: BusTransport>(&mut self, bus: &mut Bus<T>, state: BinaryState) -> Result<()> {
        for port in &self.ports {
            bus.write_port(port, state.level())?;
        }
        self.commanded = Some(state);
        Ok(())
    }

    /// Aggregated state, a pure function of the backing ports: the shared
    /// state when all ports agree, [`ActuatorState::Mixed`] otherwise.
    pub fn state<T: BusTransport>(&self, bus: &Bus<T>) -> Result<ActuatorState> {
        let mut ports = self.ports.iter();
        let Some(first) = ports.next() else {
            return Ok(ActuatorState::Off);
        };
        let reference = bus.read_port(first)?;
        for port in ports {
            if bus.read_port(port)? != reference {
                return Ok(ActuatorState::Mixed);
            }
        }
        Ok(BinaryState::from(reference).into())
    }

    /// The state last commanded through [`set_state`](Self::set_state), if
    /// any. Individual port writes (animation frames) can make the actual
    /// aggregate diverge from this.
    pub fn commanded_state(&self) -> Option<BinaryState> {
        self.commanded
    }
}
