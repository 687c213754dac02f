use thiserror::Error;

use crate::host::MarkerHandle;

/// W3C `GeolocationPositionError.PERMISSION_DENIED`.
pub const CODE_PERMISSION_DENIED: u16 = 1;
/// W3C `GeolocationPositionError.POSITION_UNAVAILABLE`.
pub const CODE_POSITION_UNAVAILABLE: u16 = 2;
/// W3C `GeolocationPositionError.TIMEOUT`.
pub const CODE_TIMEOUT: u16 = 3;

/// Failures reported by the device location sensor.
///
/// All of them are recoverable: the tracker turns them into a message and
/// schedules a resubscription, except `Unsupported` where there is nothing
/// to resubscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("position acquisition timed out")]
    Timeout,
    #[error("geolocation is not supported in this environment")]
    Unsupported,
    #[error("sensor error: {0}")]
    Other(String),
}

impl SensorError {
    /// Map a W3C geolocation error code to a sensor error.
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            CODE_PERMISSION_DENIED => SensorError::PermissionDenied,
            CODE_POSITION_UNAVAILABLE => SensorError::PositionUnavailable,
            CODE_TIMEOUT => SensorError::Timeout,
            _ => SensorError::Other(message.into()),
        }
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            SensorError::PermissionDenied => "위치 접근 권한이 거부되었습니다.".to_string(),
            SensorError::PositionUnavailable => "위치 정보를 사용할 수 없습니다.".to_string(),
            SensorError::Timeout => "위치 요청 시간이 초과되었습니다.".to_string(),
            SensorError::Unsupported => {
                "이 환경에서는 위치 정보가 지원되지 않습니다.".to_string()
            }
            SensorError::Other(msg) => msg.clone(),
        }
    }

    /// Whether resubscribing can ever help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SensorError::Unsupported)
    }
}

/// Failures raised by the host map surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("map surface is not ready")]
    NotReady,
    #[error("unknown marker handle {0:?}")]
    UnknownHandle(MarkerHandle),
    #[error("map host error: {0}")]
    Host(String),
}

/// Invalid map configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("accuracy threshold must be positive, got {0}")]
    AccuracyThreshold(f64),
    #[error("retry delay must be non-zero")]
    ZeroRetryDelay,
    #[error("backoff factor must be at least 1.0, got {0}")]
    BackoffFactor(f64),
    #[error("backoff cap {max_ms} ms is below the initial delay {initial_ms} ms")]
    BackoffCap { initial_ms: u64, max_ms: u64 },
    #[error("cluster style tiers must be non-empty and ordered by member count")]
    ClusterStyles,
    #[error("failed to parse map config: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
