//! Fixed-cadence tick source for hosts that drive the controller from a
//! plain thread loop.
//!
//! ```no_run
//! use std::time::Duration;
//! # use relayctl::tick::Ticker;
//! let mut ticker = Ticker::new(Duration::from_millis(50));
//! loop {
//!     let now = ticker.wait_next();
//!     // controller.tick(now, &mut sink);
//!     # let _ = now; break;
//! }
//! ```

use std::thread;
use std::time::{Duration, Instant};

/// Sleeps to fixed boundaries of a monotonic clock.
///
/// Boundaries are whole multiples of the period measured from construction,
/// so one slow tick never shifts the boundaries that follow; the loop
/// catches up instead of drifting.
pub struct Ticker {
    period: Duration,
    started: Instant,
    ticks: u32,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            started: Instant::now(),
            ticks: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next tick boundary and return the elapsed time since
    /// construction at that boundary. If the boundary has already passed
    /// (the previous tick overran), returns immediately.
    pub fn wait_next(&mut self) -> Duration {
        self.ticks = self.ticks.saturating_add(1);
        let target = self.period.saturating_mul(self.ticks);
        let elapsed = self.started.elapsed();
        if target > elapsed {
            thread::sleep(target - elapsed);
        }
        target
    }
}
