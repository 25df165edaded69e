//! Frame timing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of recent intervals averaged into a rate.
const RATE_WINDOW: usize = 10;
/// Below this much remaining time the clock spins instead of sleeping.
const SPIN_THRESHOLD: Duration = Duration::from_millis(2);

/// Rolling average of how often something happens.
#[derive(Debug, Clone, Default)]
pub struct RateCounter {
    last: Option<Instant>,
    intervals: VecDeque<Duration>,
}

impl RateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence at `at`, returning the interval since the
    /// previous one.
    pub fn record_at(&mut self, at: Instant) -> Duration {
        let delta = self
            .last
            .map(|last| at.saturating_duration_since(last))
            .unwrap_or_default();
        if self.last.is_some() {
            if self.intervals.len() == RATE_WINDOW {
                self.intervals.pop_front();
            }
            self.intervals.push_back(delta);
        }
        self.last = Some(at);
        delta
    }

    /// Occurrences per second over the last `RATE_WINDOW` intervals.
    /// Zero until two occurrences have been recorded.
    pub fn rate(&self) -> f64 {
        let total: Duration = self.intervals.iter().sum();
        if total.is_zero() {
            return 0.0;
        }
        self.intervals.len() as f64 / total.as_secs_f64()
    }
}

/// Client-side frame clock. Owned by the main loop, read by the HUD.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    rate: RateCounter,
    frame_time: Duration,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a frame. With `framerate` set, busy-waits until at
    /// least `1 / framerate` seconds have passed since the previous call.
    pub fn tick(&mut self, framerate: Option<u32>) -> Duration {
        if let (Some(fps), Some(last)) = (framerate.filter(|&f| f > 0), self.rate.last) {
            let frame_budget = Duration::from_secs_f64(1.0 / fps as f64);
            loop {
                let elapsed = last.elapsed();
                if elapsed >= frame_budget {
                    break;
                }
                let remaining = frame_budget - elapsed;
                if remaining > SPIN_THRESHOLD {
                    std::thread::sleep(remaining - SPIN_THRESHOLD);
                } else {
                    std::hint::spin_loop();
                }
            }
        }
        self.tick_at(Instant::now())
    }

    /// Mark the start of a frame at an explicit instant without waiting.
    pub fn tick_at(&mut self, now: Instant) -> Duration {
        self.frame_time = self.rate.record_at(now);
        self.frames += 1;
        self.frame_time
    }

    /// Achieved frames per second.
    pub fn fps(&self) -> f64 {
        self.rate.rate()
    }

    /// Duration of the most recent frame.
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_zero_until_two_samples() {
        let mut rate = RateCounter::new();
        assert_eq!(rate.rate(), 0.0);
        rate.record_at(Instant::now());
        assert_eq!(rate.rate(), 0.0);
    }

    #[test]
    fn rate_averages_recent_intervals() {
        let start = Instant::now();
        let mut rate = RateCounter::new();
        for i in 0..5 {
            rate.record_at(start + Duration::from_millis(50 * i));
        }
        assert!((rate.rate() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn rate_window_drops_old_intervals() {
        let start = Instant::now();
        let mut rate = RateCounter::new();
        let mut t = start;
        rate.record_at(t);
        // Slow intervals first, then a full window of fast ones.
        for _ in 0..5 {
            t += Duration::from_millis(500);
            rate.record_at(t);
        }
        for _ in 0..RATE_WINDOW {
            t += Duration::from_millis(10);
            rate.record_at(t);
        }
        assert!((rate.rate() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn clock_reports_frame_time_and_count() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick_at(start), Duration::ZERO);
        assert_eq!(
            clock.tick_at(start + Duration::from_millis(16)),
            Duration::from_millis(16)
        );
        assert_eq!(clock.frames(), 2);
        assert_eq!(clock.frame_time(), Duration::from_millis(16));
        assert!((clock.fps() - 62.5).abs() < 1e-6);
    }

    #[test]
    fn capped_tick_waits_for_frame_budget() {
        let mut clock = FrameClock::new();
        clock.tick(Some(100));
        let frame = clock.tick(Some(100));
        assert!(frame >= Duration::from_millis(10), "frame took {frame:?}");
    }
}
