//! Unified error types for the controller core.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! tick loop's error handling uniform. Construction-time problems are
//! `ConfigError` and halt startup; runtime problems (`BusError`,
//! `UnknownState`) are reported to the caller and never stop the tick loop.

use core::fmt;

use crate::actuator::ActuatorId;
use crate::hw::DeviceAddress;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Construction-time configuration problem. Fatal to startup.
    Config(ConfigError),
    /// A bus transaction or port access failed.
    Bus(BusError),
    /// No actuator is registered under the given id.
    UnknownActuator(ActuatorId),
    /// `transition_to` was called with a state name never declared.
    UnknownState {
        actuator: ActuatorId,
        state: String,
    },
    /// A command targeted an actuator of the wrong kind (e.g. a binary
    /// set-state on a state-machine actuator).
    WrongActuatorKind {
        actuator: ActuatorId,
        expected: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::UnknownActuator(id) => write!(f, "unknown actuator '{id}'"),
            Self::UnknownState { actuator, state } => {
                write!(f, "actuator '{actuator}' has no state named '{state}'")
            }
            Self::WrongActuatorKind { actuator, expected } => {
                write!(f, "actuator '{actuator}' is not a {expected} actuator")
            }
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors (construction time)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A subordinate binding names an actuator id that was never registered.
    UnresolvedReference(String),
    /// Two actuators were registered under the same id.
    DuplicateId(String),
    /// Two devices were registered under the same bus address.
    DuplicateDevice(DeviceAddress),
    /// A port references a device address not present on the bus.
    UnknownDevice(DeviceAddress),
    /// A port's bit index is outside its device's register width.
    BitOutOfRange { address: DeviceAddress, bit: u8 },
    /// Device width must be a non-zero multiple of 8, at most 32.
    InvalidWidth(u8),
    /// A port's direction does not match the kind of device it lives on.
    DirectionMismatch { address: DeviceAddress, bit: u8 },
    /// The description contains an element the builder does not support.
    UnsupportedElement(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference(id) => write!(f, "unresolved actuator reference '{id}'"),
            Self::DuplicateId(id) => write!(f, "duplicate actuator id '{id}'"),
            Self::DuplicateDevice(addr) => write!(f, "duplicate device at {addr}"),
            Self::UnknownDevice(addr) => write!(f, "no device at {addr}"),
            Self::BitOutOfRange { address, bit } => {
                write!(f, "bit {bit} out of range for device at {address}")
            }
            Self::InvalidWidth(bits) => write!(f, "invalid device width: {bits} bits"),
            Self::DirectionMismatch { address, bit } => {
                write!(f, "port {address}/{bit} direction does not match its device")
            }
            Self::UnsupportedElement(what) => write!(f, "unsupported element: {what}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors (runtime)
// ---------------------------------------------------------------------------

/// A failed transaction leaves the device's committed/cached bytes stale, so
/// the shadow-register comparison naturally retries on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The device did not acknowledge the transaction.
    Nack(DeviceAddress),
    /// Transport-level failure (timeout, arbitration loss, wiring).
    Io(DeviceAddress),
    /// No device is registered at the address a port points to.
    UnknownDevice(DeviceAddress),
    /// Port bit index outside the device register.
    BitOutOfRange { address: DeviceAddress, bit: u8 },
    /// Write to an input port, or cached read of a port the device kind
    /// cannot serve.
    Direction { address: DeviceAddress, bit: u8 },
}

impl BusError {
    /// The device address involved in the failure.
    pub fn address(&self) -> DeviceAddress {
        match self {
            Self::Nack(a) | Self::Io(a) | Self::UnknownDevice(a) => *a,
            Self::BitOutOfRange { address, .. } | Self::Direction { address, .. } => *address,
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack(addr) => write!(f, "no acknowledge from {addr}"),
            Self::Io(addr) => write!(f, "transport failure at {addr}"),
            Self::UnknownDevice(addr) => write!(f, "no device at {addr}"),
            Self::BitOutOfRange { address, bit } => {
                write!(f, "bit {bit} out of range for {address}")
            }
            Self::Direction { address, bit } => {
                write!(f, "direction mismatch on {address}/{bit}")
            }
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
