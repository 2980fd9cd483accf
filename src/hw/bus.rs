//! The shared bus: transaction serialisation, polling, and coalesced flush.
//!
//! [`Bus`] owns every [`BusDevice`] and a [`BusTransport`]. All port reads
//! and writes go through it:
//!
//! - `write_port` only mutates a device's shadow register;
//! - `flush_outputs` issues at most one write transaction per device per
//!   tick, carrying every bit changed since the last flush — callers that
//!   set several ports on the same device between flushes never expose an
//!   intermediate pattern to the hardware;
//! - `poll_inputs` issues one read transaction per input device and
//!   refreshes the port caches.
//!
//! Failed transactions are logged, reported, and otherwise ignored: the
//! stale committed/cached bytes make the next tick's comparison retry the
//! operation. That implicit retry is the only retry mechanism.
//!
//! The core assumes a single cooperative tick loop. A host that adds a
//! second producer thread must wrap the whole `Bus` in a mutex; no internal
//! locking is provided.

use std::collections::BTreeMap;

use embedded_hal::i2c::{Error as I2cErrorTrait, ErrorKind, I2c};
use log::warn;

use crate::error::{BusError, ConfigError, Result};

use super::device::{BusDevice, DeviceKind, MAX_DEVICE_BYTES};
use super::port::Port;
use super::{DeviceAddress, Level, PortDirection};

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// The raw transaction interface the bus drives.
///
/// One implementation wraps a real I2C peripheral ([`I2cTransport`]); tests
/// substitute recording mocks.
pub trait BusTransport {
    /// Transmit `bytes` to the device at `address` in one transaction.
    fn write(&mut self, address: DeviceAddress, bytes: &[u8]) -> core::result::Result<(), BusError>;

    /// Fill `buf` from the device at `address` in one transaction.
    fn read(&mut self, address: DeviceAddress, buf: &mut [u8]) -> core::result::Result<(), BusError>;
}

/// Adapter from any `embedded-hal` I2C peripheral to [`BusTransport`].
pub struct I2cTransport<T>(pub T);

impl<T: I2c> BusTransport for I2cTransport<T> {
    fn write(&mut self, address: DeviceAddress, bytes: &[u8]) -> core::result::Result<(), BusError> {
        self.0.write(address.0, bytes).map_err(|e| match e.kind() {
            ErrorKind::NoAcknowledge(_) => BusError::Nack(address),
            _ => BusError::Io(address),
        })
    }

    fn read(&mut self, address: DeviceAddress, buf: &mut [u8]) -> core::result::Result<(), BusError> {
        self.0.read(address.0, buf).map_err(|e| match e.kind() {
            ErrorKind::NoAcknowledge(_) => BusError::Nack(address),
            _ => BusError::Io(address),
        })
    }
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// All devices sharing one physical channel, keyed by address.
#[derive(Debug)]
pub struct Bus<T> {
    transport: T,
    devices: BTreeMap<DeviceAddress, BusDevice>,
}

impl<T: BusTransport> Bus<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            devices: BTreeMap::new(),
        }
    }

    /// Register a device. Addresses must be unique on the bus.
    pub fn add_device(&mut self, device: BusDevice) -> core::result::Result<(), ConfigError> {
        let address = device.address();
        if self.devices.contains_key(&address) {
            return Err(ConfigError::DuplicateDevice(address));
        }
        self.devices.insert(address, device);
        Ok(())
    }

    pub fn device(&self, address: DeviceAddress) -> Option<&BusDevice> {
        self.devices.get(&address)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Construction-time check that a port fits its device: the device
    /// exists, the bit is inside the register, and the direction matches
    /// the device kind.
    pub fn validate_port(&self, port: &Port) -> core::result::Result<(), ConfigError> {
        let device = self
            .devices
            .get(&port.device)
            .ok_or(ConfigError::UnknownDevice(port.device))?;
        if !device.holds_bit(port.bit) {
            return Err(ConfigError::BitOutOfRange {
                address: port.device,
                bit: port.bit,
            });
        }
        let kind_matches = match port.direction {
            PortDirection::Output => device.kind() == DeviceKind::Output,
            PortDirection::Input => device.kind() == DeviceKind::Input,
        };
        if !kind_matches {
            return Err(ConfigError::DirectionMismatch {
                address: port.device,
                bit: port.bit,
            });
        }
        Ok(())
    }

    /// Set the logical level of an output port. The device's shadow bit
    /// becomes `level XOR inverted`; nothing is transmitted until the next
    /// flush.
    pub fn write_port(&mut self, port: &Port, level: Level) -> Result<()> {
        if port.direction != PortDirection::Output {
            return Err(BusError::Direction {
                address: port.device,
                bit: port.bit,
            }
            .into());
        }
        let device = self
            .devices
            .get_mut(&port.device)
            .ok_or(BusError::UnknownDevice(port.device))?;
        if !device.holds_bit(port.bit) {
            return Err(BusError::BitOutOfRange {
                address: port.device,
                bit: port.bit,
            }
            .into());
        }
        device.set_shadow_bit(port.bit, port.raw_bit(level));
        Ok(())
    }

    /// Last-observed logical level of a port.
    ///
    /// Output ports report the desired (shadow) level; input ports report
    /// the bit from the last successful poll. Both are XORed with the
    /// port's inversion flag.
    pub fn read_port(&self, port: &Port) -> Result<Level> {
        let device = self
            .devices
            .get(&port.device)
            .ok_or(BusError::UnknownDevice(port.device))?;
        if !device.holds_bit(port.bit) {
            return Err(BusError::BitOutOfRange {
                address: port.device,
                bit: port.bit,
            }
            .into());
        }
        let raw = match port.direction {
            PortDirection::Output => device.shadow_bit(port.bit),
            PortDirection::Input => device.input_bit(port.bit),
        };
        Ok(port.logical_level(raw))
    }

    /// Poll every input device once, refreshing the port caches.
    ///
    /// Returns the transactions that failed. A failed read leaves that
    /// device's cache stale and never aborts polling of the remaining
    /// devices.
    pub fn poll_inputs(&mut self) -> Vec<BusError> {
        let mut faults = Vec::new();
        for device in self.devices.values_mut() {
            if device.kind() != DeviceKind::Input {
                continue;
            }
            let mut buf = [0u8; MAX_DEVICE_BYTES];
            let len = device.width_bytes();
            match self.transport.read(device.address(), &mut buf[..len]) {
                Ok(()) => device.store_input(&buf[..len]),
                Err(e) => {
                    warn!("poll failed for device at {}: {e}", device.address());
                    faults.push(e);
                }
            }
        }
        faults
    }

    /// Flush every output device whose shadow register differs from the
    /// bytes last transmitted — at most one transaction per device.
    ///
    /// On success the device commits (committed ← shadow); on failure the
    /// committed bytes stay stale, so the same pending bits are retried on
    /// the next flush. One failing device never blocks the others.
    pub fn flush_outputs(&mut self) -> Vec<BusError> {
        let mut faults = Vec::new();
        for device in self.devices.values_mut() {
            if device.kind() != DeviceKind::Output || !device.is_dirty() {
                continue;
            }
            match self.transport.write(device.address(), device.shadow_bytes()) {
                Ok(()) => device.commit(),
                Err(e) => {
                    warn!("flush failed for device at {}: {e}", device.address());
                    faults.push(e);
                }
            }
        }
        faults
    }

    /// Access the transport (tests inspect recorded transactions).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Recording transport: remembers every transaction, serves canned
    /// read bytes, and fails addresses on demand.
    pub(crate) struct MockTransport {
        pub writes: Vec<(DeviceAddress, Vec<u8>)>,
        pub reads: Vec<DeviceAddress>,
        pub next_read: BTreeMap<DeviceAddress, Vec<u8>>,
        pub failing: Vec<DeviceAddress>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                writes: Vec::new(),
                reads: Vec::new(),
                next_read: BTreeMap::new(),
                failing: Vec::new(),
            }
        }

        pub fn last_write(&self) -> Option<&(DeviceAddress, Vec<u8>)> {
            self.writes.last()
        }
    }

    impl BusTransport for MockTransport {
        fn write(
            &mut self,
            address: DeviceAddress,
            bytes: &[u8],
        ) -> core::result::Result<(), BusError> {
            if self.failing.contains(&address) {
                return Err(BusError::Nack(address));
            }
            self.writes.push((address, bytes.to_vec()));
            Ok(())
        }

        fn read(
            &mut self,
            address: DeviceAddress,
            buf: &mut [u8],
        ) -> core::result::Result<(), BusError> {
            if self.failing.contains(&address) {
                return Err(BusError::Nack(address));
            }
            self.reads.push(address);
            if let Some(bytes) = self.next_read.get(&address) {
                buf.copy_from_slice(bytes);
            }
            Ok(())
        }
    }

    const OUT: DeviceAddress = DeviceAddress(0x42);
    const IN: DeviceAddress = DeviceAddress(0x20);

    fn bus_with_devices() -> Bus<MockTransport> {
        let mut bus = Bus::new(MockTransport::new());
        bus.add_device(BusDevice::new(OUT, DeviceKind::Output, 8).unwrap())
            .unwrap();
        bus.add_device(BusDevice::new(IN, DeviceKind::Input, 16).unwrap())
            .unwrap();
        bus
    }

    #[test]
    fn duplicate_address_rejected() {
        let mut bus = bus_with_devices();
        let dup = BusDevice::new(OUT, DeviceKind::Output, 8).unwrap();
        assert_eq!(bus.add_device(dup), Err(ConfigError::DuplicateDevice(OUT)));
    }

    #[test]
    fn write_then_flush_transmits_coalesced_byte() {
        let mut bus = bus_with_devices();
        bus.write_port(&Port::output(OUT, 0, false), Level::High).unwrap();
        bus.write_port(&Port::output(OUT, 3, false), Level::High).unwrap();

        let faults = bus.flush_outputs();
        assert!(faults.is_empty());
        // Two port writes, exactly one transaction.
        assert_eq!(bus.transport().writes.len(), 1);
        assert_eq!(bus.transport().last_write().unwrap().1, vec![0b0000_1001]);
    }

    #[test]
    fn clean_device_is_not_flushed_again() {
        let mut bus = bus_with_devices();
        bus.write_port(&Port::output(OUT, 0, false), Level::High).unwrap();
        bus.flush_outputs();
        bus.flush_outputs();
        assert_eq!(bus.transport().writes.len(), 1);
    }

    #[test]
    fn failed_flush_is_retried_with_same_bytes() {
        let mut bus = bus_with_devices();
        bus.write_port(&Port::output(OUT, 5, false), Level::High).unwrap();

        bus.transport_mut().failing.push(OUT);
        let faults = bus.flush_outputs();
        assert_eq!(faults, vec![BusError::Nack(OUT)]);
        assert!(bus.device(OUT).unwrap().is_dirty());

        bus.transport_mut().failing.clear();
        let faults = bus.flush_outputs();
        assert!(faults.is_empty());
        assert_eq!(bus.transport().last_write().unwrap().1, vec![0b0010_0000]);
        assert!(!bus.device(OUT).unwrap().is_dirty());
    }

    #[test]
    fn inverted_write_read_round_trip() {
        let mut bus = bus_with_devices();
        let port = Port::output(OUT, 2, true);
        bus.write_port(&port, Level::High).unwrap();
        // Logical read yields High while the raw shadow bit is low.
        assert_eq!(bus.read_port(&port).unwrap(), Level::High);
        assert!(!bus.device(OUT).unwrap().shadow_bit(2));
    }

    #[test]
    fn poll_refreshes_input_cache() {
        let mut bus = bus_with_devices();
        bus.transport_mut().next_read.insert(IN, vec![0x01, 0x80]);
        let faults = bus.poll_inputs();
        assert!(faults.is_empty());
        assert_eq!(bus.transport().reads, vec![IN]);

        assert_eq!(bus.read_port(&Port::input(IN, 0, false)).unwrap(), Level::High);
        assert_eq!(bus.read_port(&Port::input(IN, 15, false)).unwrap(), Level::High);
        assert_eq!(bus.read_port(&Port::input(IN, 7, false)).unwrap(), Level::Low);
    }

    #[test]
    fn failed_poll_keeps_previous_cache() {
        let mut bus = bus_with_devices();
        bus.transport_mut().next_read.insert(IN, vec![0xff, 0x00]);
        bus.poll_inputs();

        bus.transport_mut().next_read.insert(IN, vec![0x00, 0x00]);
        bus.transport_mut().failing.push(IN);
        let faults = bus.poll_inputs();
        assert_eq!(faults, vec![BusError::Nack(IN)]);
        // Cache still reflects the last successful poll.
        assert_eq!(bus.read_port(&Port::input(IN, 0, false)).unwrap(), Level::High);
    }

    #[test]
    fn writing_an_input_port_is_rejected() {
        let mut bus = bus_with_devices();
        let err = bus
            .write_port(&Port::input(IN, 0, false), Level::High)
            .unwrap_err();
        assert_eq!(
            err,
            Error::Bus(BusError::Direction { address: IN, bit: 0 })
        );
    }

    #[test]
    fn unknown_device_and_bad_bit_are_reported() {
        let mut bus = bus_with_devices();
        let ghost = DeviceAddress(0x7f);
        assert_eq!(
            bus.write_port(&Port::output(ghost, 0, false), Level::High),
            Err(Error::Bus(BusError::UnknownDevice(ghost)))
        );
        assert_eq!(
            bus.write_port(&Port::output(OUT, 8, false), Level::High),
            Err(Error::Bus(BusError::BitOutOfRange { address: OUT, bit: 8 }))
        );
    }

    #[test]
    fn validate_port_checks_direction_and_range() {
        let bus = bus_with_devices();
        assert!(bus.validate_port(&Port::output(OUT, 7, true)).is_ok());
        assert!(bus.validate_port(&Port::input(IN, 15, true)).is_ok());
        assert_eq!(
            bus.validate_port(&Port::output(IN, 0, false)),
            Err(ConfigError::DirectionMismatch { address: IN, bit: 0 })
        );
        assert_eq!(
            bus.validate_port(&Port::input(IN, 16, false)),
            Err(ConfigError::BitOutOfRange { address: IN, bit: 16 })
        );
    }
}
