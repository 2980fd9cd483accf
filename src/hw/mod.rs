//! Hardware layer: addressed-bus devices and the ports they expose.
//!
//! ```text
//!   Port ──(address, bit)──▶ BusDevice ──▶ Bus ──▶ BusTransport
//! ```
//!
//! Ports are cheap, non-owning descriptors; every [`BusDevice`](device::BusDevice)
//! is owned exclusively by the [`Bus`](bus::Bus) and addressed by key, so many
//! actuators can reference the same device without aliasing.

pub mod bus;
pub mod device;
pub mod port;

pub use bus::{Bus, BusTransport, I2cTransport};
pub use device::{BusDevice, DeviceKind, MAX_DEVICE_BYTES};
pub use port::Port;

use core::fmt;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// 7-bit address of one peripheral on the shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceAddress(pub u8);

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Logical level of a single port bit.
///
/// This is the level *after* polarity inversion; the raw wire bit for an
/// inverted port is the complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Raw bit representation.
    pub fn bit(self) -> bool {
        matches!(self, Self::High)
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::High } else { Self::Low }
    }

    /// The complementary level.
    pub fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

/// Signal direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}
