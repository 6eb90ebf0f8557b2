//! Classification thresholds and registry policy.

use thiserror::Error;

/// Default angular threshold (degrees) separating noise from rotation.
pub const DEFAULT_ROTATION_THRESHOLD_DEG: f32 = 0.3;

/// Default displacement (meters) separating noise from a drag.
pub const DEFAULT_DRAG_DISTANCE_M: f32 = 0.05;

/// How a repeated attach of the same caller to the same source is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateAttach {
    /// Caller interest is a set; re-attaching is a no-op.
    Ignore,
    /// Every attach counts; each needs its own detach.
    Count,
}

impl DuplicateAttach {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Count => "count",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ignore" => Some(Self::Ignore),
            "count" => Some(Self::Count),
            _ => None,
        }
    }
}

/// Rejected gesture configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("rotation threshold must be a finite, non-negative angle (got {0} deg)")]
    RotationThreshold(f32),
    #[error("drag distance must be a finite, non-negative length (got {0} m)")]
    DragDistance(f32),
}

/// Configuration for gesture classification.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Enable per-tick classification.
    pub enabled: bool,
    /// Per-axis rotation (degrees) that must be exceeded to count an axis.
    pub rotation_threshold_deg: f32,
    /// Displacement from baseline (meters) that must be exceeded for a drag.
    pub drag_distance_m: f32,
    /// Policy for attaching a caller that is already attached.
    pub duplicate_attach: DuplicateAttach,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rotation_threshold_deg: DEFAULT_ROTATION_THRESHOLD_DEG,
            drag_distance_m: DEFAULT_DRAG_DISTANCE_M,
            duplicate_attach: DuplicateAttach::Ignore,
        }
    }
}

impl GestureConfig {
    /// Check thresholds.  Called whenever a registry takes a config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.rotation_threshold_deg;
        if !t.is_finite() || t < 0.0 {
            return Err(ConfigError::RotationThreshold(t));
        }
        let d = self.drag_distance_m;
        if !d.is_finite() || d < 0.0 {
            return Err(ConfigError::DragDistance(d));
        }
        Ok(())
    }

    /// Generate s-expression for IPC config.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:enabled {} :rotation-threshold-deg {:.2} :drag-distance-m {:.3} :duplicate-attach :{})",
            if self.enabled { "t" } else { "nil" },
            self.rotation_threshold_deg,
            self.drag_distance_m,
            self.duplicate_attach.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GestureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.duplicate_attach, DuplicateAttach::Ignore);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = GestureConfig {
            rotation_threshold_deg: -0.1,
            ..GestureConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::RotationThreshold(-0.1)));
    }

    #[test]
    fn test_nan_drag_rejected() {
        let config = GestureConfig {
            drag_distance_m: f32::NAN,
            ..GestureConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DragDistance(_))));
    }

    #[test]
    fn test_zero_thresholds_allowed() {
        let config = GestureConfig {
            rotation_threshold_deg: 0.0,
            drag_distance_m: 0.0,
            ..GestureConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_sexp() {
        let sexp = GestureConfig::default().to_sexp();
        assert!(sexp.contains(":enabled t"));
        assert!(sexp.contains(":rotation-threshold-deg 0.30"));
        assert!(sexp.contains(":drag-distance-m 0.050"));
        assert!(sexp.contains(":duplicate-attach :ignore"));
    }

    #[test]
    fn test_duplicate_attach_from_str() {
        assert_eq!(DuplicateAttach::from_str("count"), Some(DuplicateAttach::Count));
        assert_eq!(DuplicateAttach::from_str("ignore"), Some(DuplicateAttach::Ignore));
        assert_eq!(DuplicateAttach::from_str("twice"), None);
    }
}
