//! Tick-driven actuator control core for relay and I/O expander boards on a
//! shared I2C bus.
//!
//! The crate is layered bottom-up:
//!
//! - [`hw`] — addressed bus devices, non-owning port descriptors with
//!   polarity inversion, shadow-register write coalescing, and the
//!   [`BusTransport`](hw::BusTransport) seam real hardware plugs into;
//! - [`actuator`] — named abstractions over ports: multi-output binary
//!   actuators and named-state machines;
//! - [`animation`] — timed frame playback (directional sweeps) polled from
//!   the tick loop;
//! - [`controller`] — the registry and the single cooperative tick:
//!   poll inputs, apply due animation frames, flush outputs.
//!
//! Everything hardware-facing is generic over [`hw::BusTransport`], so the
//! whole stack runs against recording mocks in tests and against an
//! `embedded-hal` I2C peripheral in deployments.
//!
//! ```no_run
//! use std::time::Duration;
//! use relayctl::{config, events::NullSink, hw::I2cTransport, tick::Ticker};
//!
//! # fn run(i2c: impl embedded_hal::i2c::I2c) -> relayctl::Result<()> {
//! let description: config::ControllerConfig =
//!     serde_json::from_str(include_str!("../demos/house.json")).unwrap();
//! let mut controller = config::build(I2cTransport(i2c), &description)?;
//!
//! let mut ticker = Ticker::new(controller.tick_interval());
//! let mut sink = NullSink;
//! loop {
//!     let now = ticker.wait_next();
//!     controller.tick(now, &mut sink);
//! }
//! # }
//! ```

pub mod actuator;
pub mod animation;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod hw;
pub mod tick;

pub use actuator::{ActuatorId, ActuatorState, BinaryState};
pub use command::Command;
pub use controller::Controller;
pub use error::{BusError, ConfigError, Error, Result};
pub use events::{ControllerEvent, EventSink};
