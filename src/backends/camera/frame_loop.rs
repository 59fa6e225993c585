// SPDX-License-Identifier: GPL-3.0-only

//! Frame scheduling for the detection loop
//!
//! The detection loop is a chain of discrete ticks. Between ticks it yields
//! to the runtime and asks a [`FrameClock`] for the next repaint, so the
//! work done scales with the display rate instead of a fixed timer.

use crate::constants::timing;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::debug;

/// Action returned by a loop step to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Schedule exactly one more tick
    Continue,
    /// Stop the loop; no further tick is scheduled
    Stop,
}

/// Per-frame scheduling primitive ("run once before the next repaint")
///
/// Dropping the returned future cancels the pending request.
pub trait FrameClock: Send + Sync {
    fn request_frame(&self) -> BoxFuture<'static, ()>;
}

/// Frame clock ticking at a fixed display refresh rate
#[derive(Debug, Clone, Copy)]
pub struct DisplayClock {
    period: Duration,
}

impl DisplayClock {
    /// Create a clock for the given refresh rate in frames per second
    ///
    /// The rate is clamped to 1..=240 fps.
    pub fn new(frame_rate: u32) -> Self {
        let fps = frame_rate.clamp(1, timing::MAX_FRAME_RATE);
        let period = Duration::from_secs_f64(1.0 / fps as f64);
        debug!(fps, period_us = period.as_micros() as u64, "Created display clock");
        Self { period }
    }

    /// Time between repaints
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for DisplayClock {
    fn default() -> Self {
        Self::new(timing::DEFAULT_FRAME_RATE)
    }
}

impl FrameClock for DisplayClock {
    fn request_frame(&self) -> BoxFuture<'static, ()> {
        tokio::time::sleep(self.period).boxed()
    }
}

/// Frame clock that only yields to the runtime
///
/// Useful for replaying recorded frames as fast as they can be decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateClock;

impl FrameClock for ImmediateClock {
    fn request_frame(&self) -> BoxFuture<'static, ()> {
        tokio::task::yield_now().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_clock_period() {
        let clock = DisplayClock::new(50);
        assert_eq!(clock.period(), Duration::from_millis(20));
    }

    #[test]
    fn test_display_clock_clamps_rate() {
        assert_eq!(DisplayClock::new(0).period(), Duration::from_secs(1));
        assert!(DisplayClock::new(10_000).period() >= Duration::from_secs_f64(1.0 / 240.0));
    }

    #[tokio::test]
    async fn test_immediate_clock_resolves() {
        let clock = ImmediateClock;
        for _ in 0..3 {
            clock.request_frame().await;
        }
    }
}
