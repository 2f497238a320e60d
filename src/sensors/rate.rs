use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// Events-per-second counter over fixed windows of monotonic time.
///
/// `rate` reports the last completed window; an in-progress window is not
/// visible until it closes.
#[derive(Debug, Clone)]
pub struct RateCounter {
    window: Duration,
    window_start: Instant,
    window_events: u32,
    total_events: u64,
    rate: f32,
}

impl Default for RateCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateCounter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), DEFAULT_WINDOW)
    }

    pub fn starting_at(start: Instant, window: Duration) -> Self {
        Self {
            window,
            window_start: start,
            window_events: 0,
            total_events: 0,
            rate: 0.0,
        }
    }

    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    pub fn update_at(&mut self, now: Instant) {
        self.roll(now);
        self.window_events += 1;
        self.total_events += 1;
    }

    pub fn rate(&mut self) -> f32 {
        self.rate_at(Instant::now())
    }

    pub fn rate_at(&mut self, now: Instant) -> f32 {
        self.roll(now);
        self.rate
    }

    /// Lifetime event count
    pub fn events(&self) -> u64 {
        self.total_events
    }

    fn roll(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return;
        }
        self.rate = self.window_events as f32 / elapsed.as_secs_f32();
        self.window_events = 0;
        self.window_start = now;
    }
}
