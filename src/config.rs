//! Hub and registry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-hub settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Keep at most this many history entries per record. `None` keeps all.
    #[serde(default)]
    pub history_limit: Option<usize>,
}

impl HubConfig {
    /// Bound the per-record history.
    #[must_use]
    pub const fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }
}

/// Registry settings, including the defaults used by [`crate::SweepWorker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Settings applied to every hub the registry creates.
    #[serde(default)]
    pub hub: HubConfig,
    /// Session hubs idle for longer than this are evicted by a sweep.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: Duration,
    /// How often the sweep worker runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: Duration,
}

const fn default_idle_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

const fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            hub: HubConfig::default(),
            idle_timeout: default_idle_timeout(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn with_hub(mut self, hub: HubConfig) -> Self {
        self.hub = hub;
        self
    }

    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    #[must_use]
    pub const fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = RegistryConfig::default();
        assert_eq!(cfg.idle_timeout, Duration::from_secs(1800));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(60));
        assert!(cfg.hub.history_limit.is_none());
    }

    #[test]
    fn deserialize_partial() {
        let cfg: RegistryConfig =
            serde_json::from_str(r#"{"hub": {"history_limit": 8}}"#).unwrap();
        assert_eq!(cfg.hub.history_limit, Some(8));
        assert_eq!(cfg.idle_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn builders() {
        let cfg = RegistryConfig::default()
            .with_hub(HubConfig::default().with_history_limit(3))
            .with_idle_timeout(Duration::from_secs(5))
            .with_sweep_interval(Duration::from_millis(250));
        assert_eq!(cfg.hub.history_limit, Some(3));
        assert_eq!(cfg.idle_timeout, Duration::from_secs(5));
        assert_eq!(cfg.sweep_interval, Duration::from_millis(250));
    }
}
