//! Directional sweep: sequence activation across the backing outputs of a
//! multi-output actuator (chase / wave effects on LED strips, staged relay
//! banks).
//!
//! The sweep emits one single-port frame per backing output, evenly spaced
//! over the configured duration, then one convergence frame at the full
//! duration that forces *every* output to the target state — so even if an
//! individual per-output write is lost (bus failure), the terminal pattern
//! is guaranteed.

use core::time::Duration;

use crate::actuator::{BinaryState, LogicalActuator};

use super::{Animation, Frame, FrameTarget};

/// Sweep traversal order over the backing outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// Natural backing order.
    Forward,
    /// Backing order inverted.
    Reversed,
}

/// Complete sweep description, passed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time from the first to the last frame.
    pub duration: Duration,
    /// State every output ends up in.
    pub target: BinaryState,
    pub direction: SweepDirection,
}

/// Build the sweep animation for `actuator`.
///
/// Returns `None` when the actuator has fewer than two backing outputs — a
/// sweep cannot meaningfully sequence fewer than two elements, so starting
/// one is a defined no-op rather than an error.
///
/// With `n` outputs the per-step spacing is `duration / (n - 1)`: output
/// `i` (0-indexed in the chosen direction) gets a frame at `spacing × i`,
/// and the convergence frame sits at `duration`.
pub fn build_sweep(actuator: &LogicalActuator, config: &SweepConfig) -> Option<Animation> {
    let ports = actuator.ports();
    if ports.len() < 2 {
        return None;
    }

    let mut ordered: Vec<_> = ports.to_vec();
    if config.direction == SweepDirection::Reversed {
        ordered.reverse();
    }

    let spacing = config.duration / (ordered.len() as u32 - 1);
    let mut frames: Vec<Frame> = ordered
        .iter()
        .enumerate()
        .map(|(i, port)| {
            Frame::new(
                spacing * i as u32,
                vec![FrameTarget::Port {
                    port: *port,
                    state: config.target,
                }],
            )
        })
        .collect();

    // Convergence frame: all outputs, natural order, full duration.
    frames.push(Frame::new(
        config.duration,
        ports
            .iter()
            .map(|port| FrameTarget::Port {
                port: *port,
                state: config.target,
            })
            .collect(),
    ));

    Some(Animation::new(frames))
}
