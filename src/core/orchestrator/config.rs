//! Orchestrator tunables.

use tokio::time::Duration;

/// Shortest debounce pause the dispatcher will accept, in milliseconds.
/// Anything lower fragments utterances faster than people speak.
pub const MIN_PAUSE_MS: u64 = 100;

/// Timing configuration for the orchestration core.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Silence the dispatcher waits for before treating a trainee turn as
    /// finished.
    pub user_pause_ms: u64,
    /// Window in which an identical finalized text is treated as a
    /// duplicate delivery and dropped.
    pub dedup_window_ms: u64,
    /// Grace period a synthesis stream gets to stop cooperatively before
    /// it is cancelled outright.
    pub interrupt_timeout_ms: u64,
}

impl OrchestratorConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.user_pause_ms.max(MIN_PAUSE_MS))
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    pub fn interrupt_timeout(&self) -> Duration {
        Duration::from_millis(self.interrupt_timeout_ms)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            user_pause_ms: 700,
            dedup_window_ms: 500,
            interrupt_timeout_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_is_clamped_to_minimum() {
        let config = OrchestratorConfig {
            user_pause_ms: 10,
            ..Default::default()
        };
        assert_eq!(config.pause(), Duration::from_millis(MIN_PAUSE_MS));

        let config = OrchestratorConfig {
            user_pause_ms: 900,
            ..Default::default()
        };
        assert_eq!(config.pause(), Duration::from_millis(900));
    }
}
