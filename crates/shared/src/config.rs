use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::WatchOptions;
use crate::models::{Coordinate, ZoomLevel};

/// Zoom level at and above which listings render clustered.
pub const DEFAULT_CLUSTER_THRESHOLD: ZoomLevel = 4;
/// Level reported before a map surface is attached.
pub const DEFAULT_ZOOM_LEVEL: ZoomLevel = 3;
/// Level used when jumping to the device position.
pub const CURRENT_LOCATION_ZOOM_LEVEL: ZoomLevel = 3;
/// Seoul City Hall, as (lat, lng).
pub const DEFAULT_CENTER: (f64, f64) = (37.5665, 126.9780);

/// Readings less accurate than this trigger a resubscription.
pub const ACCURACY_THRESHOLD_M: f64 = 50.0;
pub const RETRY_DELAY_MS: u64 = 3000;
/// Per-attempt sensor acquisition timeout.
pub const ACQUISITION_TIMEOUT_MS: u64 = 15_000;

/// How long to wait before resubscribing after the `attempt`-th failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    Fixed {
        delay_ms: u64,
    },
    Exponential {
        initial_ms: u64,
        factor: f64,
        max_ms: u64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed {
            delay_ms: RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            RetryPolicy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            RetryPolicy::Exponential {
                initial_ms,
                factor,
                max_ms,
            } => {
                let scaled = initial_ms as f64 * factor.powi(attempt.min(64) as i32);
                let capped = if scaled.is_finite() {
                    scaled.min(max_ms as f64)
                } else {
                    max_ms as f64
                };
                Duration::from_millis(capped as u64)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub accuracy_threshold_m: f64,
    pub retry: RetryPolicy,
    /// `None` retries until deactivated.
    pub max_attempts: Option<u32>,
    pub acquisition_timeout_ms: u64,
    pub enable_high_accuracy: bool,
    pub maximum_age_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold_m: ACCURACY_THRESHOLD_M,
            retry: RetryPolicy::default(),
            max_attempts: None,
            acquisition_timeout_ms: ACQUISITION_TIMEOUT_MS,
            enable_high_accuracy: true,
            maximum_age_ms: 0,
        }
    }
}

impl TrackerConfig {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: Duration::from_millis(self.acquisition_timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}

/// Look of one cluster bucket. Tiers apply from `min_members` upwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStyleTier {
    pub min_members: usize,
    pub size_px: u32,
    pub background: String,
    pub font_size_px: u32,
}

impl ClusterStyleTier {
    fn new(min_members: usize, size_px: u32, background: &str, font_size_px: u32) -> Self {
        Self {
            min_members,
            size_px,
            background: background.to_string(),
            font_size_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub grid_size_px: u32,
    pub average_center: bool,
    /// 1 renders even a lone marker through a cluster visual.
    pub min_cluster_size: usize,
    pub styles: Vec<ClusterStyleTier>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            grid_size_px: 60,
            average_center: true,
            min_cluster_size: 1,
            styles: vec![
                ClusterStyleTier::new(1, 50, "rgba(59, 130, 246, 0.8)", 14),
                ClusterStyleTier::new(10, 60, "rgba(37, 99, 235, 0.85)", 16),
                ClusterStyleTier::new(100, 70, "rgba(29, 78, 216, 0.9)", 18),
            ],
        }
    }
}

impl ClusterConfig {
    /// Index of the style tier used for a cluster of `members` markers.
    pub fn tier_for(&self, members: usize) -> usize {
        self.styles
            .iter()
            .rposition(|t| members >= t.min_members)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub cluster_threshold: ZoomLevel,
    /// Initial map center before any position is known.
    pub default_center: Coordinate,
    pub default_zoom_level: ZoomLevel,
    pub current_location_zoom_level: ZoomLevel,
    pub tracker: TrackerConfig,
    pub cluster: ClusterConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            cluster_threshold: DEFAULT_CLUSTER_THRESHOLD,
            default_center: Coordinate::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            default_zoom_level: DEFAULT_ZOOM_LEVEL,
            current_location_zoom_level: CURRENT_LOCATION_ZOOM_LEVEL,
            tracker: TrackerConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

impl MapConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.tracker.accuracy_threshold_m;
        if threshold.is_nan() || threshold <= 0.0 {
            return Err(ConfigError::AccuracyThreshold(threshold));
        }
        match self.tracker.retry {
            RetryPolicy::Fixed { delay_ms: 0 } => return Err(ConfigError::ZeroRetryDelay),
            RetryPolicy::Exponential { initial_ms: 0, .. } => {
                return Err(ConfigError::ZeroRetryDelay)
            }
            RetryPolicy::Exponential { factor, .. } if factor.is_nan() || factor < 1.0 => {
                return Err(ConfigError::BackoffFactor(factor))
            }
            RetryPolicy::Exponential {
                initial_ms, max_ms, ..
            } if max_ms < initial_ms => {
                return Err(ConfigError::BackoffCap { initial_ms, max_ms })
            }
            _ => {}
        }
        let styles = &self.cluster.styles;
        if styles.is_empty()
            || styles
                .windows(2)
                .any(|w| w[0].min_members >= w[1].min_members)
        {
            return Err(ConfigError::ClusterStyles);
        }
        Ok(())
    }
}
