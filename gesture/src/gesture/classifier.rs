//! Gesture classification from baseline and current pose.
//!
//! Each rotation axis is tested against the angular threshold; the number
//! of axes above it selects single-axis or free rotation.  Translation is
//! displacement from the baseline position against the drag distance.
//! Which tests run, and in what order, depends on the current category.
//! Pure logic: no state beyond thresholds.

use super::config::GestureConfig;
use crate::pose::{delta_angle, Pose};

// ── Categories ─────────────────────────────────────────────

/// Mutually exclusive gesture category of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureCategory {
    /// No committed gesture.
    #[default]
    None,
    /// Source is being dragged (translated).
    DragTranslation,
    /// Rotation about exactly one local axis.
    SingleAxisRotation,
    /// Rotation about two or three local axes.
    FreeRotation,
}

impl GestureCategory {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DragTranslation => "drag-translation",
            Self::SingleAxisRotation => "single-axis-rotation",
            Self::FreeRotation => "free-rotation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "drag-translation" => Some(Self::DragTranslation),
            "single-axis-rotation" => Some(Self::SingleAxisRotation),
            "free-rotation" => Some(Self::FreeRotation),
            _ => None,
        }
    }

    /// Haptic pattern a feedback sink is expected to play for this category.
    pub fn haptic_pattern(&self) -> HapticPattern {
        match self {
            Self::None => HapticPattern::Off,
            Self::DragTranslation => HapticPattern::Steady,
            Self::SingleAxisRotation => HapticPattern::SharpPulse,
            Self::FreeRotation => HapticPattern::GradualPulse,
        }
    }
}

/// Feedback pattern label consumed by haptic sinks.  Waveforms are the
/// sink's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPattern {
    Off,
    Steady,
    SharpPulse,
    GradualPulse,
}

impl HapticPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Steady => "steady",
            Self::SharpPulse => "sharp-pulse",
            Self::GradualPulse => "gradual-pulse",
        }
    }
}

// ── Axes ───────────────────────────────────────────────────

/// Local rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index into an Euler triple.
    pub fn index(&self) -> usize {
        *self as usize
    }

    fn bit(&self) -> u8 {
        1 << self.index()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// Axes found above threshold during one classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisMask(u8);

impl AxisMask {
    pub fn insert(&mut self, axis: Axis) {
        self.0 |= axis.bit();
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The only axis in the mask, if exactly one is set.
    pub fn single(&self) -> Option<Axis> {
        if self.count() != 1 {
            return None;
        }
        Axis::ALL.into_iter().find(|a| self.contains(*a))
    }
}

// ── Verdict ────────────────────────────────────────────────

/// Outcome of a test that fired: the category to switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub category: GestureCategory,
    /// Axes above threshold when the verdict was reached (empty for drags).
    pub axes: AxisMask,
}

/// The individual tests, tried in category-dependent order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    SingleAxis,
    FreeRotation,
    Translating,
}

/// Order in which tests are tried from a given category.
fn probe_order(category: GestureCategory) -> &'static [Probe] {
    match category {
        GestureCategory::None => &[Probe::SingleAxis, Probe::FreeRotation, Probe::Translating],
        GestureCategory::DragTranslation => &[Probe::SingleAxis, Probe::FreeRotation],
        GestureCategory::SingleAxisRotation => &[Probe::Translating, Probe::FreeRotation],
        GestureCategory::FreeRotation => &[Probe::Translating, Probe::SingleAxis],
    }
}

// ── Classifier ─────────────────────────────────────────────

/// Threshold-based gesture classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    rotation_threshold_deg: f32,
    drag_distance_m: f32,
}

impl Classifier {
    /// Thresholds are taken as-is; validate the config first.
    pub(crate) fn new(rotation_threshold_deg: f32, drag_distance_m: f32) -> Self {
        Self {
            rotation_threshold_deg,
            drag_distance_m,
        }
    }

    /// Build from a config that has passed `GestureConfig::validate`.
    pub(crate) fn from_config(config: &GestureConfig) -> Self {
        Self::new(config.rotation_threshold_deg, config.drag_distance_m)
    }

    pub fn rotation_threshold_deg(&self) -> f32 {
        self.rotation_threshold_deg
    }

    pub fn drag_distance_m(&self) -> f32 {
        self.drag_distance_m
    }

    /// Run the tests for `current_category` in priority order.
    ///
    /// Returns the first test that fires, or `None` when the category
    /// should stay as it is.
    pub fn classify(
        &self,
        current_category: GestureCategory,
        baseline: &Pose,
        current: &Pose,
    ) -> Option<Verdict> {
        let baseline_euler = baseline.euler_deg();
        let current_euler = current.euler_deg();
        let mut axes: Option<AxisMask> = None;

        for &probe in probe_order(current_category) {
            let fired = match probe {
                Probe::Translating => {
                    if self.is_translating(baseline, current) {
                        Some(GestureCategory::DragTranslation)
                    } else {
                        None
                    }
                }
                Probe::SingleAxis | Probe::FreeRotation => {
                    let mask = *axes.get_or_insert_with(|| {
                        self.scan_axes(&baseline_euler, &current_euler)
                    });
                    match (probe, mask.count()) {
                        (Probe::SingleAxis, 1) => Some(GestureCategory::SingleAxisRotation),
                        (Probe::FreeRotation, n) if n >= 2 => Some(GestureCategory::FreeRotation),
                        _ => None,
                    }
                }
            };

            if let Some(category) = fired {
                let axes = match category {
                    GestureCategory::DragTranslation => AxisMask::default(),
                    _ => axes.unwrap_or_default(),
                };
                return Some(Verdict { category, axes });
            }
        }

        None
    }

    /// Mark the axes whose rotation exceeds the threshold.
    ///
    /// X and Y are always tested; Z only while fewer than two axes are
    /// already above threshold, since the result is free rotation either way.
    pub fn scan_axes(&self, baseline_euler: &[f32; 3], current_euler: &[f32; 3]) -> AxisMask {
        let mut mask = AxisMask::default();
        for axis in [Axis::X, Axis::Y] {
            if self.axis_above_threshold(axis, baseline_euler, current_euler) {
                mask.insert(axis);
            }
        }
        if mask.count() < 2 && self.axis_above_threshold(Axis::Z, baseline_euler, current_euler) {
            mask.insert(Axis::Z);
        }
        mask
    }

    fn axis_above_threshold(&self, axis: Axis, baseline: &[f32; 3], current: &[f32; 3]) -> bool {
        let i = axis.index();
        delta_angle(baseline[i], current[i]).abs() > self.rotation_threshold_deg
    }

    /// Displacement from the baseline position exceeds the drag distance.
    pub fn is_translating(&self, baseline: &Pose, current: &Pose) -> bool {
        baseline.distance_to(current) > self.drag_distance_m
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&GestureConfig::default())
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
fn rotated(euler_deg: [f32; 3]) -> Pose {
    Pose::from_euler_deg([0.0; 3], euler_deg)
}

#[cfg(test)]
fn moved(position: [f32; 3]) -> Pose {
    Pose::from_euler_deg(position, [0.0; 3])
}
