//! Shared test transport: records every transaction, serves canned read
//! bytes, and fails selected addresses on demand.

use std::collections::{BTreeMap, BTreeSet};

use relayctl::error::BusError;
use relayctl::hw::{BusTransport, DeviceAddress};

pub struct MockTransport {
    pub writes: Vec<(DeviceAddress, Vec<u8>)>,
    pub reads: Vec<DeviceAddress>,
    pub next_read: BTreeMap<DeviceAddress, Vec<u8>>,
    pub failing: BTreeSet<DeviceAddress>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            reads: Vec::new(),
            next_read: BTreeMap::new(),
            failing: BTreeSet::new(),
        }
    }

    /// Bytes of every write transaction sent to `address`, in order.
    pub fn writes_to(&self, address: DeviceAddress) -> Vec<Vec<u8>> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, bytes)| bytes.clone())
            .collect()
    }
}

impl BusTransport for MockTransport {
    fn write(&mut self, address: DeviceAddress, bytes: &[u8]) -> Result<(), BusError> {
        if self.failing.contains(&address) {
            return Err(BusError::Nack(address));
        }
        self.writes.push((address, bytes.to_vec()));
        Ok(())
    }

    fn read(&mut self, address: DeviceAddress, buf: &mut [u8]) -> Result<(), BusError> {
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
