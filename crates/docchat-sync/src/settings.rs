use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_STALE_TIME;

/// Timing knobs of the synchronization layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Wait after a stream closes before the server history is trusted again
    pub settle_ms: u64,
    pub poll_secs: u64,
    pub search_debounce_ms: u64,
    pub stale_secs: u64,
}

impl SyncSettings {
    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            poll_secs: 30,
            search_debounce_ms: 300,
            stale_secs: DEFAULT_STALE_TIME.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: SyncSettings = serde_json::from_str(r#"{"settle_ms": 50}"#).unwrap();
        assert_eq!(settings.settle_window(), Duration::from_millis(50));
        assert_eq!(settings.poll_interval(), Duration::from_secs(30));
        assert_eq!(settings.search_debounce(), Duration::from_millis(300));
    }
}
