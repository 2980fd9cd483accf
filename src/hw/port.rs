//! A port is one bit of I/O on an expander device.
//!
//! Ports do not own any hardware state. They are (address, bit) descriptors
//! carrying direction and polarity; the owning [`Bus`](super::bus::Bus)
//! resolves the address to the actual device registers.

use super::{DeviceAddress, Level, PortDirection};

/// One logical bit of I/O, with optional polarity inversion.
///
/// For an inverted port the transmitted/received wire bit is the complement
/// of the logical level — common on relay boards with hardware inverters and
/// on input boards with pull-up resistors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub device: DeviceAddress,
    pub bit: u8,
    pub direction: PortDirection,
    pub inverted: bool,
}

impl Port {
    /// An output port (relay, open-collector driver, ...).
    pub fn output(device: DeviceAddress, bit: u8, inverted: bool) -> Self {
        Self {
            device,
            bit,
            direction: PortDirection::Output,
            inverted,
        }
    }

    /// An input port (switch, window contact, motion detector, ...).
    pub fn input(device: DeviceAddress, bit: u8, inverted: bool) -> Self {
        Self {
            device,
            bit,
            direction: PortDirection::Input,
            inverted,
        }
    }

    /// Map a logical level to the raw wire bit for this port.
    pub fn raw_bit(&self, level: Level) -> bool {
        level.bit() ^ self.inverted
    }

    /// Map a raw wire bit back to the logical level.
    pub fn logical_level(&self, raw: bool) -> Level {
        Level::from_bit(raw ^ self.inverted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_inverted_port_passes_levels_through() {
        let p = Port::output(DeviceAddress(0x20), 3, false);
        assert!(p.raw_bit(Level::High));
        assert!(!p.raw_bit(Level::Low));
        assert_eq!(p.logical_level(true), Level::High);
    }

    #[test]
    fn inverted_port_complements_raw_bit() {
        let p = Port::output(DeviceAddress(0x20), 3, true);
        assert!(!p.raw_bit(Level::High));
        assert!(p.raw_bit(Level::Low));
        assert_eq!(p.logical_level(false), Level::High);
        assert_eq!(p.logical_level(true), Level::Low);
    }

    #[test]
    fn inversion_round_trips() {
        for inverted in [false, true] {
            let p = Port::input(DeviceAddress(1), 0, inverted);
            for level in [Level::Low, Level::High] {
                assert_eq!(p.logical_level(p.raw_bit(level)), level);
            }
        }
    }
}
