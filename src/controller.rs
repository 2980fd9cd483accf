//! The controller core: actuator registry plus tick orchestration.
//!
//! [`Controller`] owns the bus, every registered actuator, and the
//! animation scheduler. It exposes a hardware-agnostic API driven from two
//! sides:
//!
//! - commands ([`handle_command`](Controller::handle_command)) from the
//!   outside world;
//! - the periodic tick ([`tick`](Controller::tick)), which runs one full
//!   cycle in a fixed order: poll inputs → apply due animation frames →
//!   flush outputs.
//!
//! The ordering guarantees that a command issued during a tick reaches the
//! hardware no later than the end of that tick, and that reads within a
//! tick reflect the previous tick's writes, never half-applied current
//! ones. A failing device is logged and reported per tick but never halts
//! the remaining work.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{info, warn};

use crate::actuator::{
    ActuatorId, ActuatorKind, ActuatorState, BinaryState, LogicalActuator, StateMachineActuator,
};
use crate::animation::{AnimationScheduler, FrameTarget, build_sweep};
use crate::command::Command;
use crate::error::{ConfigError, Error, Result};
use crate::events::{ControllerEvent, EventSink};
use crate::hw::{Bus, BusTransport, Level, PortDirection};

/// Reference tick granularity — fine enough to resolve the shortest
/// practical sweep spacing.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// The actuator-control core.
#[derive(Debug)]
pub struct Controller<T> {
    bus: Bus<T>,
    actuators: BTreeMap<ActuatorId, ActuatorKind>,
    animations: AnimationScheduler,
    tick_interval: Duration,
    tick_count: u64,
    last_now: Option<Duration>,
}

impl<T: BusTransport> Controller<T> {
    pub fn new(bus: Bus<T>) -> Self {
        Self {
            bus,
            actuators: BTreeMap::new(),
            animations: AnimationScheduler::new(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            tick_count: 0,
            last_now: None,
        }
    }

    // ── Registration (startup only) ───────────────────────────

    /// Register a logical actuator and initialise its outputs to logical
    /// Low, so the first flush transmits a known idle pattern.
    pub fn register_logical(&mut self, actuator: LogicalActuator) -> Result<()> {
        self.check_unique_id(actuator.id())?;
        for port in actuator.ports() {
            if port.direction != PortDirection::Output {
                return Err(ConfigError::UnsupportedElement(
                    "logical actuator ports must be outputs",
                )
                .into());
            }
            self.bus.validate_port(port)?;
        }
        for port in actuator.ports() {
            self.bus.write_port(port, Level::Low)?;
        }
        info!(
            "registered logical actuator '{}' ({} ports)",
            actuator.id(),
            actuator.output_count()
        );
        self.actuators
            .insert(actuator.id().clone(), ActuatorKind::Logical(actuator));
        Ok(())
    }

    /// Register a state-machine actuator. Every port bound by any of its
    /// states is validated and initialised to logical Low.
    pub fn register_state_machine(&mut self, actuator: StateMachineActuator) -> Result<()> {
        self.check_unique_id(actuator.id())?;
        let mut bound_ports = Vec::new();
        for name in actuator.state_names() {
            let Some(definition) = actuator.state(name) else {
                continue;
            };
            for port in definition.all_ports() {
                if port.direction != PortDirection::Output {
                    return Err(ConfigError::UnsupportedElement(
                        "state bindings must drive output ports",
                    )
                    .into());
                }
                self.bus.validate_port(port)?;
                bound_ports.push(*port);
            }
        }
        for port in &bound_ports {
            self.bus.write_port(port, Level::Low)?;
        }
        info!(
            "registered state machine '{}' ({} states)",
            actuator.id(),
            actuator.state_names().count()
        );
        self.actuators
            .insert(actuator.id().clone(), ActuatorKind::StateMachine(actuator));
        Ok(())
    }

    fn check_unique_id(&self, id: &ActuatorId) -> Result<()> {
        if self.actuators.contains_key(id) {
            return Err(ConfigError::DuplicateId(id.to_string()).into());
        }
        Ok(())
    }

    // ── Command surface ───────────────────────────────────────

    /// Process one external command, emitting the matching event on
    /// success.
    pub fn handle_command(&mut self, cmd: Command, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            Command::SetState { id, state } => {
                self.set_state(&id, state)?;
                sink.emit(&ControllerEvent::StateChanged {
                    id,
                    state: state.into(),
                });
            }
            Command::Transition { id, state } => {
                self.transition_to(&id, &state)?;
                sink.emit(&ControllerEvent::TransitionApplied { id, state });
            }
            Command::StartSweep { id, config } => {
                let started = self.start_sweep(&id, &config)?;
                if started {
                    sink.emit(&ControllerEvent::SweepStarted { id });
                } else {
                    sink.emit(&ControllerEvent::SweepSkipped { id });
                }
            }
            Command::StopAnimations { id } => {
                self.animations.stop(&id);
            }
        }
        Ok(())
    }

    /// Drive a logical actuator to a binary state. The hardware sees the
    /// change at this tick's flush.
    pub fn set_state(&mut self, id: &ActuatorId, state: BinaryState) -> Result<()> {
        let Self { bus, actuators, .. } = self;
        match actuators.get_mut(id) {
            Some(ActuatorKind::Logical(a)) => a.set_state(bus, state),
            Some(ActuatorKind::StateMachine(_)) => Err(Error::WrongActuatorKind {
                actuator: id.clone(),
                expected: "binary",
            }),
            None => Err(Error::UnknownActuator(id.clone())),
        }
    }

    /// Transition a state-machine actuator to a named state.
    pub fn transition_to(&mut self, id: &ActuatorId, state: &str) -> Result<()> {
        let Self { bus, actuators, .. } = self;
        match actuators.get_mut(id) {
            Some(ActuatorKind::StateMachine(a)) => a.transition_to(state, bus),
            Some(ActuatorKind::Logical(_)) => Err(Error::WrongActuatorKind {
                actuator: id.clone(),
                expected: "state-machine",
            }),
            None => Err(Error::UnknownActuator(id.clone())),
        }
    }

    /// Start a directional sweep for a logical actuator, preempting any
    /// animation already running for it.
    ///
    /// Returns `false` when the actuator has fewer than two backing
    /// outputs — the sweep is a defined no-op then and nothing changes.
    pub fn start_sweep(
        &mut self,
        id: &ActuatorId,
        config: &crate::animation::SweepConfig,
    ) -> Result<bool> {
        let actuator = match self.actuators.get(id) {
            Some(ActuatorKind::Logical(a)) => a,
            Some(ActuatorKind::StateMachine(_)) => {
                return Err(Error::WrongActuatorKind {
                    actuator: id.clone(),
                    expected: "binary",
                });
            }
            None => return Err(Error::UnknownActuator(id.clone())),
        };
        match build_sweep(actuator, config) {
            Some(animation) => {
                self.animations.start(id.clone(), animation);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Aggregated state of a logical actuator.
    pub fn actuator_state(&self, id: &ActuatorId) -> Result<ActuatorState> {
        match self.actuators.get(id) {
            Some(ActuatorKind::Logical(a)) => a.state(&self.bus),
            Some(ActuatorKind::StateMachine(_)) => Err(Error::WrongActuatorKind {
                actuator: id.clone(),
                expected: "binary",
            }),
            None => Err(Error::UnknownActuator(id.clone())),
        }
    }

    /// Committed state name of a state-machine actuator (`None` before the
    /// first transition).
    pub fn current_state_name(&self, id: &ActuatorId) -> Result<Option<&str>> {
        match self.actuators.get(id) {
            Some(ActuatorKind::StateMachine(a)) => Ok(a.current_state()),
            Some(ActuatorKind::Logical(_)) => Err(Error::WrongActuatorKind {
                actuator: id.clone(),
                expected: "state-machine",
            }),
            None => Err(Error::UnknownActuator(id.clone())),
        }
    }

    pub fn actuator_ids(&self) -> impl Iterator<Item = &ActuatorId> {
        self.actuators.keys()
    }

    pub fn is_animating(&self, id: &ActuatorId) -> bool {
        self.animations.is_animating(id)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn set_tick_interval(&mut self, interval: Duration) {
        self.tick_interval = interval;
    }

    /// The bus, for status surfaces and tests that inspect device bytes.
    pub fn bus(&self) -> &Bus<T> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus<T> {
        &mut self.bus
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle. `now` is the elapsed time since the
    /// tick source started (monotonic).
    ///
    /// Order within the tick: poll every input device, advance animations
    /// and apply their due frames, then flush every dirty output device.
    /// Transaction failures become [`ControllerEvent::BusFault`]s; one
    /// failing device never stops the rest of the tick.
    pub fn tick(&mut self, now: Duration, sink: &mut impl EventSink) {
        self.tick_count += 1;
        let delta = match self.last_now {
            Some(prev) => now.saturating_sub(prev),
            None => now,
        };
        self.last_now = Some(now);

        // 1. Poll inputs — reads reflect the previous tick's world.
        for fault in self.bus.poll_inputs() {
            sink.emit(&ControllerEvent::BusFault(fault));
        }

        // 2. Advance animations and push due frames into the shadow
        //    registers.
        let Self {
            bus,
            actuators,
            animations,
            ..
        } = self;
        let finished = animations.tick(delta, |id, target| {
            if let Err(e) = apply_frame_target(bus, actuators, target) {
                warn!("animation frame for '{id}' failed: {e}");
            }
        });
        for id in finished {
            sink.emit(&ControllerEvent::SweepFinished { id });
        }

        // 3. Flush — one coalesced transaction per dirty output device.
        for fault in self.bus.flush_outputs() {
            sink.emit(&ControllerEvent::BusFault(fault));
        }
    }
}

/// Apply one animation frame target against the registry and bus.
fn apply_frame_target<T: BusTransport>(
    bus: &mut Bus<T>,
    actuators: &mut BTreeMap<ActuatorId, ActuatorKind>,
    target: &FrameTarget,
) -> Result<()> {
    match target {
        FrameTarget::Port { port, state } => bus.write_port(port, state.level()),
        FrameTarget::Actuator { id, state } => match actuators.get_mut(id) {
            Some(ActuatorKind::Logical(a)) => a.set_state(bus, *state),
            Some(ActuatorKind::StateMachine(_)) => Err(Error::WrongActuatorKind {
                actuator: id.clone(),
                expected: "binary",
            }),
            None => Err(Error::UnknownActuator(id.clone())),
        },
    }
}
