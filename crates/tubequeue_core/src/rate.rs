/// Dispatch caps for the two fixed windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub per_second: u32,
    pub per_minute: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_second: 5,
            per_minute: 60,
        }
    }
}

/// Fixed-window counters, reset by independent wall-clock timers.
///
/// A burst of up to the full per-second cap is possible right after each
/// reset; the windows do not slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateWindowCounters {
    per_second: u32,
    per_minute: u32,
}

impl RateWindowCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when both counters are strictly below their caps.
    pub fn has_budget(&self, limits: &RateLimits) -> bool {
        self.per_second < limits.per_second && self.per_minute < limits.per_minute
    }

    /// Counts one dispatch against both windows.
    pub fn record_dispatch(&mut self) {
        self.per_second = self.per_second.saturating_add(1);
        self.per_minute = self.per_minute.saturating_add(1);
    }

    pub fn reset_second(&mut self) {
        self.per_second = 0;
    }

    pub fn reset_minute(&mut self) {
        self.per_minute = 0;
    }

    pub fn per_second(&self) -> u32 {
        self.per_second
    }

    pub fn per_minute(&self) -> u32 {
        self.per_minute
    }
}
