//! Timed frame playback against the tick source.
//!
//! An [`Animation`] is an ordered list of [`Frame`]s, each carrying an
//! offset from animation start and the target-state changes due at that
//! offset. The [`AnimationScheduler`] owns every in-flight animation and is
//! polled once per tick: due frames are handed to an apply callback and
//! finished entries are dropped — no timer subscription or callback
//! lifetime management.
//!
//! Animations are transient. They hold no ownership over the actuators and
//! ports they target, only pending write requests; cancellation is
//! replacement (starting another animation for the same actuator) or an
//! explicit stop.

pub mod sweep;

pub use sweep::{SweepConfig, SweepDirection, build_sweep};

use core::ops::Range;
use core::time::Duration;

use log::debug;

use crate::actuator::{ActuatorId, BinaryState};
use crate::hw::Port;

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One target-state change within a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTarget {
    /// Drive a whole registered actuator.
    Actuator { id: ActuatorId, state: BinaryState },
    /// Drive a single backing port (used by sweeps to sequence the outputs
    /// of one multi-output actuator individually).
    Port { port: Port, state: BinaryState },
}

/// One scheduled change: every target listed becomes due `offset` after the
/// animation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub offset: Duration,
    pub targets: Vec<FrameTarget>,
}

impl Frame {
    pub fn new(offset: Duration, targets: Vec<FrameTarget>) -> Self {
        Self { offset, targets }
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// An ordered playback of frames.
///
/// Frames need not arrive pre-sorted; `start()` sorts ascending by offset
/// with a stable sort, so ties keep their list order.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Frame>,
    /// Frames before this index have been applied in the current run.
    next: usize,
    elapsed: Duration,
    running: bool,
}

impl Animation {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            next: 0,
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    /// Begin (or restart) playback: elapsed time resets to zero and every
    /// frame becomes eligible again. Restarting while running discards
    /// in-flight progress — last writer wins.
    pub fn start(&mut self) {
        self.frames.sort_by_key(|f| f.offset);
        self.next = 0;
        self.elapsed = Duration::ZERO;
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Finished means started and every frame applied.
    pub fn is_finished(&self) -> bool {
        !self.running && self.next == self.frames.len() && !self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Advance playback by `delta` and return the index range of frames
    /// that became due (offset ≤ elapsed, not yet applied). When the last
    /// frame is consumed the animation stops running.
    pub fn advance(&mut self, delta: Duration) -> Range<usize> {
        if !self.running {
            return 0..0;
        }
        self.elapsed += delta;
        let start = self.next;
        while self.next < self.frames.len() && self.frames[self.next].offset <= self.elapsed {
            self.next += 1;
        }
        if self.next == self.frames.len() {
            self.running = false;
        }
        start..self.next
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ActiveAnimation {
    /// The actuator this animation drives — the replacement key.
    id: ActuatorId,
    animation: Animation,
}

/// Explicit list of in-flight animations, polled once per tick.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    active: Vec<ActiveAnimation>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `animation` for `id`, preempting any animation already running
    /// for the same actuator (the un-applied frames of the old run are
    /// discarded; frames already applied stay applied).
    pub fn start(&mut self, id: ActuatorId, mut animation: Animation) {
        self.active.retain(|a| a.id != id);
        animation.start();
        debug!(
            "animation started for '{id}' ({} frames)",
            animation.frames().len()
        );
        self.active.push(ActiveAnimation { id, animation });
    }

    /// Drop the animation running for `id`, if any. Returns whether one was
    /// removed.
    pub fn stop(&mut self, id: &ActuatorId) -> bool {
        let before = self.active.len();
        self.active.retain(|a| &a.id != id);
        before != self.active.len()
    }

    pub fn is_animating(&self, id: &ActuatorId) -> bool {
        self.active.iter().any(|a| &a.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Advance every animation by `delta`, invoking `apply` for each due
    /// frame target in offset order. Finished animations are removed and
    /// their ids returned.
    pub fn tick(
        &mut self,
        delta: Duration,
        mut apply: impl FnMut(&ActuatorId, &FrameTarget),
    ) -> Vec<ActuatorId> {
        let mut finished = Vec::new();
        for entry in &mut self.active {
            let due = entry.animation.advance(delta);
            for frame in &entry.animation.frames()[due] {
                for target in &frame.targets {
                    apply(&entry.id, target);
                }
            }
            if !entry.animation.is_running() {
                finished.push(entry.id.clone());
            }
        }
        self.active.retain(|a| a.animation.is_running());
        finished
    }
}
