/// Render activity tracking: stop redrawing after a quiet period
use std::time::{Duration, Instant};
use tracing::trace;

/// Whether the viewer should keep redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Active,
    Idle,
}

/// Two-state machine: `Active` until no input or geometry event has been
/// seen for longer than `timeout`, then `Idle` until the next event.
#[derive(Debug, Clone)]
pub struct RenderActivity {
    state: ActivityState,
    last_activity: Instant,
    timeout: Duration,
}

impl RenderActivity {
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            state: ActivityState::Active,
            last_activity: now,
            timeout,
        }
    }

    /// Record an event; always leaves the machine `Active`.
    pub fn touch(&mut self, now: Instant) {
        if self.state == ActivityState::Idle {
            trace!("render activity resumed");
        }
        self.state = ActivityState::Active;
        self.last_activity = now;
    }

    /// Advance the clock and return the resulting state.
    pub fn poll(&mut self, now: Instant) -> ActivityState {
        if self.state == ActivityState::Active
            && now.saturating_duration_since(self.last_activity) > self.timeout
        {
            trace!(timeout_ms = self.timeout.as_millis() as u64, "render activity idle");
            self.state = ActivityState::Idle;
        }
        self.state
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ActivityState::Idle
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_active_within_timeout() {
        let start = Instant::now();
        let mut activity = RenderActivity::new(Duration::from_secs(1), start);
        assert_eq!(activity.poll(start + Duration::from_millis(1000)), ActivityState::Active);
    }

    #[test]
    fn test_goes_idle_after_timeout() {
        let start = Instant::now();
        let mut activity = RenderActivity::new(Duration::from_secs(1), start);
        assert_eq!(activity.poll(start + Duration::from_millis(1001)), ActivityState::Idle);
        assert!(activity.is_idle());
        // Time alone never reactivates.
        assert_eq!(activity.poll(start + Duration::from_secs(5)), ActivityState::Idle);
    }

    #[test]
    fn test_touch_reactivates_and_restarts_clock() {
        let start = Instant::now();
        let mut activity = RenderActivity::new(Duration::from_millis(100), start);
        activity.poll(start + Duration::from_millis(200));
        assert!(activity.is_idle());

        let resumed = start + Duration::from_millis(300);
        activity.touch(resumed);
        assert_eq!(activity.state(), ActivityState::Active);
        assert_eq!(activity.poll(resumed + Duration::from_millis(50)), ActivityState::Active);
        assert_eq!(activity.poll(resumed + Duration::from_millis(150)), ActivityState::Idle);
    }
}
