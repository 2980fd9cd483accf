//! Declarative controller description and the builder that wires it.
//!
//! A [`ControllerConfig`] is plain serde data (JSON in deployments, literal
//! structs in tests) describing the bus devices and the actuators on top of
//! them. [`build`] turns a description plus a transport into a fully wired
//! [`Controller`], validating everything up front: unknown devices,
//! out-of-range bits, duplicate ids, and unresolved subordinate references
//! all fail construction instead of surfacing mid-tick.
//!
//! Declaration order matters in one place: a state machine's subordinate
//! binding can only reference a logical actuator declared before it.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actuator::{ActuatorId, BinaryState, LogicalActuator, StateMachineActuator};
use crate::controller::Controller;
use crate::error::{ConfigError, Result};
use crate::hw::{Bus, BusDevice, BusTransport, DeviceAddress, DeviceKind, Port};

fn default_tick_interval_ms() -> u64 {
    50
}

/// Top-level description of one controller instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Tick cadence the host loop should run at.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
}

/// One device on the bus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub address: DeviceAddress,
    pub kind: DeviceKind,
    /// Register width in bits: a non-zero multiple of 8, at most 32.
    pub width_bits: u8,
}

/// One output bit on a device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortConfig {
    pub device: DeviceAddress,
    pub bit: u8,
    /// Set for hardware that inverts polarity (e.g. active-low relay
    /// drivers): logical High transmits a cleared bit.
    #[serde(default)]
    pub inverted: bool,
}

impl PortConfig {
    fn output(self) -> Port {
        Port::output(self.device, self.bit, self.inverted)
    }
}

/// One actuator, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActuatorConfig {
    Logical {
        id: ActuatorId,
        /// Backing outputs in sweep (natural) order.
        ports: Vec<PortConfig>,
    },
    StateMachine {
        id: ActuatorId,
        /// States in declaration order; names must be meaningful to the
        /// commands that will be sent.
        states: Vec<StateConfig>,
    },
}

/// One named state of a state-machine actuator. The High and Low groups
/// are independent sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    pub name: String,
    #[serde(default)]
    pub high_ports: Vec<PortConfig>,
    #[serde(default)]
    pub low_ports: Vec<PortConfig>,
    #[serde(default)]
    pub subordinates: Vec<SubordinateConfig>,
}

/// A subordinate actuator driven to `target` when the state applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubordinateConfig {
    pub id: ActuatorId,
    pub target: BinaryState,
}

/// Wire a [`Controller`] from its description.
///
/// Fails fast with [`ConfigError`] on any structural problem; a controller
/// that builds successfully can only hit runtime bus faults afterwards.
pub fn build<T: BusTransport>(transport: T, config: &ControllerConfig) -> Result<Controller<T>> {
    let mut bus = Bus::new(transport);
    for dev in &config.devices {
        bus.add_device(BusDevice::new(dev.address, dev.kind, dev.width_bits)?)?;
    }

    let mut controller = Controller::new(bus);
    controller.set_tick_interval(Duration::from_millis(config.tick_interval_ms));

    // Logical actuators resolved so far, for subordinate references.
    let mut logical_ports: BTreeMap<ActuatorId, Vec<Port>> = BTreeMap::new();

    for actuator in &config.actuators {
        match actuator {
            ActuatorConfig::Logical { id, ports } => {
                let ports: Vec<Port> = ports.iter().map(|p| p.output()).collect();
                logical_ports.insert(id.clone(), ports.clone());
                controller.register_logical(LogicalActuator::new(id.clone(), ports))?;
            }
            ActuatorConfig::StateMachine { id, states } => {
                let mut sm = StateMachineActuator::new(id.clone());
                for state in states {
                    let definition = sm.add_state(&state.name);
                    for p in &state.high_ports {
                        definition.bind_high(p.output());
                    }
                    for p in &state.low_ports {
                        definition.bind_low(p.output());
                    }
                    for sub in &state.subordinates {
                        let ports = logical_ports
                            .get(&sub.id)
                            .ok_or_else(|| {
                                ConfigError::UnresolvedReference(sub.id.to_string())
                            })?
                            .clone();
                        definition.bind_subordinate(sub.id.clone(), ports, sub.target);
                    }
                }
                controller.register_state_machine(sm)?;
            }
        }
    }

    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BusError, Error};

    #[derive(Debug)]
    struct NullTransport;

    impl BusTransport for NullTransport {
        fn write(&mut self, _: DeviceAddress, _: &[u8]) -> core::result::Result<(), BusError> {
            Ok(())
        }
        fn read(&mut self, _: DeviceAddress, _: &mut [u8]) -> core::result::Result<(), BusError> {
            Ok(())
        }
    }

    const JSON: &str = r#"{
        "tick_interval_ms": 20,
        "devices": [
            { "address": 66, "kind": "output", "width_bits": 8 },
            { "address": 32, "kind": "input", "width_bits": 16 }
        ],
        "actuators": [
            {
                "type": "logical",
                "id": "hall-strip",
                "ports": [
                    { "device": 66, "bit": 0, "inverted": true },
                    { "device": 66, "bit": 1, "inverted": true }
                ]
            },
            {
                "type": "state_machine",
                "id": "ventilation",
                "states": [
                    {
                        "name": "off",
                        "low_ports": [
                            { "device": 66, "bit": 2 },
                            { "device": 66, "bit": 3 }
                        ]
                    },
                    {
                        "name": "level-1",
                        "high_ports": [{ "device": 66, "bit": 2 }],
                        "low_ports": [{ "device": 66, "bit": 3 }],
                        "subordinates": [
                            { "id": "hall-strip", "target": "off" }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn full_description_parses_and_builds() {
        let config: ControllerConfig = serde_json::from_str(JSON).unwrap();
        assert_eq!(config.tick_interval_ms, 20);

        let controller = build(NullTransport, &config).unwrap();
        assert_eq!(controller.tick_interval(), Duration::from_millis(20));
        assert_eq!(controller.actuator_ids().count(), 2);
        assert_eq!(
            controller
                .current_state_name(&ActuatorId::new("ventilation"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn tick_interval_defaults_when_omitted() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{ "devices": [] }"#).unwrap();
        assert_eq!(config.tick_interval_ms, 50);
    }

    fn minimal_devices() -> Vec<DeviceConfig> {
        vec![DeviceConfig {
            address: DeviceAddress(0x42),
            kind: DeviceKind::Output,
            width_bits: 8,
        }]
    }

    #[test]
    fn subordinate_must_reference_an_earlier_logical_actuator() {
        let config = ControllerConfig {
            tick_interval_ms: 50,
            devices: minimal_devices(),
            actuators: vec![ActuatorConfig::StateMachine {
                id: ActuatorId::new("scene"),
                states: vec![StateConfig {
                    name: "movie".into(),
                    high_ports: vec![],
                    low_ports: vec![],
                    subordinates: vec![SubordinateConfig {
                        id: ActuatorId::new("spots"),
                        target: BinaryState::Off,
                    }],
                }],
            }],
        };
        let err = build(NullTransport, &config).unwrap_err();
        assert_eq!(
            err,
            Error::Config(ConfigError::UnresolvedReference("spots".into()))
        );
    }

    #[test]
    fn duplicate_device_address_fails() {
        let mut devices = minimal_devices();
        devices.push(devices[0]);
        let config = ControllerConfig {
            tick_interval_ms: 50,
            devices,
            actuators: vec![],
        };
        let err = build(NullTransport, &config).unwrap_err();
        assert_eq!(
            err,
            Error::Config(ConfigError::DuplicateDevice(DeviceAddress(0x42)))
        );
    }

    #[test]
    fn invalid_width_fails() {
        let config = ControllerConfig {
            tick_interval_ms: 50,
            devices: vec![DeviceConfig {
                address: DeviceAddress(0x42),
                kind: DeviceKind::Output,
                width_bits: 12,
            }],
            actuators: vec![],
        };
        let err = build(NullTransport, &config).unwrap_err();
        assert_eq!(err, Error::Config(ConfigError::InvalidWidth(12)));
    }

    #[test]
    fn port_outside_device_register_fails() {
        let config = ControllerConfig {
            tick_interval_ms: 50,
            devices: minimal_devices(),
            actuators: vec![ActuatorConfig::Logical {
                id: ActuatorId::new("lamp"),
                ports: vec![PortConfig {
                    device: DeviceAddress(0x42),
                    bit: 8,
                    inverted: false,
                }],
            }],
        };
        let err = build(NullTransport, &config).unwrap_err();
        assert_eq!(
            err,
            Error::Config(ConfigError::BitOutOfRange {
                address: DeviceAddress(0x42),
                bit: 8,
            })
        );
    }
}
