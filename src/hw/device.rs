//! One addressed peripheral on the shared bus.
//!
//! Output expanders keep a *shadow register* (the desired bits) next to the
//! bytes last actually transmitted. A flush is needed exactly when the two
//! differ; a failed flush leaves the committed bytes untouched so the
//! discrepancy persists and the next tick retries it. Input expanders keep a
//! cache of the bytes last received from a poll.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::DeviceAddress;

/// Largest supported expander register: 32 bits.
pub const MAX_DEVICE_BYTES: usize = 4;

/// Whether a device drives outputs or senses inputs.
///
/// Expander chips are one or the other; mixed-mode boards are modelled as
/// two devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Output,
    Input,
}

/// One addressed expander with its register images.
#[derive(Debug, Clone)]
pub struct BusDevice {
    address: DeviceAddress,
    kind: DeviceKind,
    width_bits: u8,
    /// Desired output bits (raw, post-inversion).
    shadow: Vec<u8, MAX_DEVICE_BYTES>,
    /// Bytes last successfully transmitted.
    committed: Vec<u8, MAX_DEVICE_BYTES>,
    /// Bytes last successfully received (input devices).
    input_cache: Vec<u8, MAX_DEVICE_BYTES>,
    /// Whether any output transaction has succeeded yet. The first flush
    /// must always transmit so the hardware reaches a known pattern.
    ever_committed: bool,
}

impl BusDevice {
    /// Create a device. `width_bits` must be a non-zero multiple of 8, at
    /// most 32 (8- and 16-bit expanders in practice).
    pub fn new(address: DeviceAddress, kind: DeviceKind, width_bits: u8) -> Result<Self, ConfigError> {
        if width_bits == 0 || width_bits % 8 != 0 || width_bits as usize > MAX_DEVICE_BYTES * 8 {
            return Err(ConfigError::InvalidWidth(width_bits));
        }
        let bytes = width_bits as usize / 8;
        let zeroed = Vec::from_slice(&[0u8; MAX_DEVICE_BYTES][..bytes]).unwrap();
        Ok(Self {
            address,
            kind,
            width_bits,
            shadow: zeroed.clone(),
            committed: zeroed.clone(),
            input_cache: zeroed,
            ever_committed: false,
        })
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn width_bits(&self) -> u8 {
        self.width_bits
    }

    pub fn width_bytes(&self) -> usize {
        self.width_bits as usize / 8
    }

    /// Whether `bit` addresses a valid position in the register.
    pub fn holds_bit(&self, bit: u8) -> bool {
        bit < self.width_bits
    }

    // ── Output side ───────────────────────────────────────────

    /// Set one raw bit in the shadow register. No transaction is issued;
    /// the change becomes visible to hardware on the next flush.
    pub fn set_shadow_bit(&mut self, bit: u8, raw: bool) {
        debug_assert!(self.holds_bit(bit));
        let byte = (bit / 8) as usize;
        let mask = 1u8 << (bit % 8);
        if raw {
            self.shadow[byte] |= mask;
        } else {
            self.shadow[byte] &= !mask;
        }
    }

    /// Current raw bit from the shadow register (the desired output).
    pub fn shadow_bit(&self, bit: u8) -> bool {
        debug_assert!(self.holds_bit(bit));
        self.shadow[(bit / 8) as usize] & (1 << (bit % 8)) != 0
    }

    /// Whether a flush transaction is needed.
    pub fn is_dirty(&self) -> bool {
        !self.ever_committed || self.shadow != self.committed
    }

    /// The bytes a flush would transmit.
    pub fn shadow_bytes(&self) -> &[u8] {
        &self.shadow
    }

    /// The bytes last successfully transmitted.
    pub fn committed_bytes(&self) -> &[u8] {
        &self.committed
    }

    /// Record a successful write transaction: committed ← shadow.
    pub fn commit(&mut self) {
        self.committed = self.shadow.clone();
        self.ever_committed = true;
    }

    // ── Input side ────────────────────────────────────────────

    /// Raw bit from the last successful poll.
    pub fn input_bit(&self, bit: u8) -> bool {
        debug_assert!(self.holds_bit(bit));
        self.input_cache[(bit / 8) as usize] & (1 << (bit % 8)) != 0
    }

    /// Record a successful read transaction.
    pub fn store_input(&mut self, bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), self.width_bytes());
        self.input_cache = Vec::from_slice(bytes).unwrap();
    }

    /// The bytes last successfully received.
    pub fn input_bytes(&self) -> &[u8] {
        &self.input_cache
    }
}
