/// Viewer settings
use std::time::Duration;

use crate::placement::Footprint;

/// Tunables shared by the viewer shell and its render service.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Quiet period after which frames stop being drawn.
    pub idle_timeout: Duration,
    /// Area the placed assembly is fitted into.
    pub footprint: Footprint,
    /// Target frames per second while active.
    pub frame_rate: u32,
    /// Wheel units forwarded per scroll line.
    pub wheel_step: i32,
}

impl ViewerConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(1),
            footprint: Footprint::default(),
            frame_rate: 30,
            wheel_step: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_interval() {
        let config = ViewerConfig::default();
        assert_eq!(config.frame_interval(), Duration::from_nanos(33_333_333));

        let stalled = ViewerConfig { frame_rate: 0, ..ViewerConfig::default() };
        assert_eq!(stalled.frame_interval(), Duration::from_secs(1));
    }
}
