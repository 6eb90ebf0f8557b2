//! Per-source gesture record.
//!
//! Holds the baseline pose, the current category, and the callers
//! interested in the source.  Only the registry mutates records; everyone
//! else reads them through the accessors below.

use super::classifier::{Axis, GestureCategory, Verdict};
use super::config::DuplicateAttach;
use crate::pose::{delta_angle, Pose};
use crate::source::{Caller, SourceKey};

/// Classification state of one tracked source.
#[derive(Debug, Clone)]
pub struct GestureRecord<C> {
    source: SourceKey,
    /// Reference pose for deltas; written at creation and on transitions.
    baseline: Pose,
    category: GestureCategory,
    /// Set on the evaluation that changed `category`.
    changed_this_tick: bool,
    /// Axis of the current single-axis rotation.
    active_axis: Option<Axis>,
    callers: Vec<C>,
}

impl<C: Caller> GestureRecord<C> {
    pub(crate) fn new(source: SourceKey, baseline: Pose, caller: C) -> Self {
        Self {
            source,
            baseline,
            category: GestureCategory::None,
            changed_this_tick: false,
            active_axis: None,
            callers: vec![caller],
        }
    }

    pub fn source(&self) -> &SourceKey {
        &self.source
    }

    pub fn baseline(&self) -> &Pose {
        &self.baseline
    }

    pub fn category(&self) -> GestureCategory {
        self.category
    }

    /// Whether the last evaluation changed the category.
    pub fn changed_this_tick(&self) -> bool {
        self.changed_this_tick
    }

    /// Axis of the current single-axis rotation, if that is the category.
    pub fn active_axis(&self) -> Option<Axis> {
        match self.category {
            GestureCategory::SingleAxisRotation => self.active_axis,
            _ => None,
        }
    }

    pub fn callers(&self) -> &[C] {
        &self.callers
    }

    /// Number of attachments (duplicates included under `Count`).
    pub fn caller_count(&self) -> usize {
        self.callers.len()
    }

    /// Number of attachments whose caller is currently polling.
    pub fn polling_count(&self) -> usize {
        self.callers.iter().filter(|c| c.is_polling()).count()
    }

    pub fn is_polled(&self) -> bool {
        self.callers.iter().any(|c| c.is_polling())
    }

    // ── Derived metrics ───────────────────────────────────

    /// Signed per-axis rotation (degrees) from baseline to `current`.
    pub fn rotation_delta(&self, current: &Pose) -> [f32; 3] {
        let b = self.baseline.euler_deg();
        let c = current.euler_deg();
        [
            delta_angle(b[0], c[0]),
            delta_angle(b[1], c[1]),
            delta_angle(b[2], c[2]),
        ]
    }

    /// Signed rotation (degrees) along the active axis.  `None` unless the
    /// source is in single-axis rotation.
    pub fn axis_delta(&self, current: &Pose) -> Option<f32> {
        self.active_axis()
            .map(|axis| self.rotation_delta(current)[axis.index()])
    }

    /// Total rotation (degrees) from baseline, regardless of axis.
    pub fn rotation_angle(&self, current: &Pose) -> f32 {
        self.baseline.angle_to_deg(current)
    }

    /// Distance (meters) moved since the baseline was taken.
    pub fn drag_distance(&self, current: &Pose) -> f32 {
        self.baseline.distance_to(current)
    }

    // ── Registry-side mutation ────────────────────────────

    /// Add a caller.  Returns false when the policy ignored a duplicate.
    pub(crate) fn add_caller(&mut self, caller: C, policy: DuplicateAttach) -> bool {
        if policy == DuplicateAttach::Ignore && self.callers.contains(&caller) {
            return false;
        }
        self.callers.push(caller);
        true
    }

    /// Remove one attachment of `caller`.  Returns false if it was not attached.
    pub(crate) fn remove_caller(&mut self, caller: &C) -> bool {
        match self.callers.iter().position(|c| c == caller) {
            Some(index) => {
                self.callers.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn has_callers(&self) -> bool {
        !self.callers.is_empty()
    }

    /// Consume the change flag.  Returns true if it was set.
    pub(crate) fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed_this_tick)
    }

    /// Apply a classifier verdict observed at `pose`: switch category,
    /// re-baseline, and flag the change.
    pub(crate) fn apply(&mut self, verdict: Verdict, pose: Pose) {
        self.category = verdict.category;
        self.active_axis = verdict.axes.single();
        self.baseline = pose;
        self.changed_this_tick = true;
    }

    /// Drop to `None` without touching the baseline.  Returns true if the
    /// category changed.
    pub(crate) fn force_idle(&mut self) -> bool {
        if self.category == GestureCategory::None {
            return false;
        }
        self.category = GestureCategory::None;
        self.active_axis = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::classifier::AxisMask;
    use crate::source::PollHandle;

    fn record() -> GestureRecord<PollHandle> {
        GestureRecord::new("left".into(), Pose::default(), PollHandle::new(1))
    }

    fn single_x() -> Verdict {
        let mut axes = AxisMask::default();
        axes.insert(Axis::X);
        Verdict {
            category: GestureCategory::SingleAxisRotation,
            axes,
        }
    }

    #[test]
    fn test_new_record_is_idle() {
        let r = record();
        assert_eq!(r.category(), GestureCategory::None);
        assert!(!r.changed_this_tick());
        assert_eq!(r.caller_count(), 1);
        assert_eq!(r.source().as_str(), "left");
    }

    #[test]
    fn test_duplicate_ignored_under_set_policy() {
        let mut r = record();
        assert!(!r.add_caller(PollHandle::new(1), DuplicateAttach::Ignore));
        assert_eq!(r.caller_count(), 1);
        assert!(r.add_caller(PollHandle::new(2), DuplicateAttach::Ignore));
        assert_eq!(r.caller_count(), 2);
    }

    #[test]
    fn test_duplicate_counted_under_count_policy() {
        let mut r = record();
        assert!(r.add_caller(PollHandle::new(1), DuplicateAttach::Count));
        assert_eq!(r.caller_count(), 2);
        assert!(r.remove_caller(&PollHandle::new(1)));
        assert!(r.has_callers());
        assert!(r.remove_caller(&PollHandle::new(1)));
        assert!(!r.has_callers());
    }

    #[test]
    fn test_remove_unknown_caller() {
        let mut r = record();
        assert!(!r.remove_caller(&PollHandle::new(9)));
        assert_eq!(r.caller_count(), 1);
    }

    #[test]
    fn test_apply_rebaselines_and_flags() {
        let mut r = record();
        let pose = Pose::from_euler_deg([0.1, 0.0, 0.0], [1.0, 0.0, 0.0]);
        r.apply(single_x(), pose);
        assert_eq!(r.category(), GestureCategory::SingleAxisRotation);
        assert_eq!(r.baseline(), &pose);
        assert_eq!(r.active_axis(), Some(Axis::X));
        assert!(r.take_changed());
        assert!(!r.take_changed());
    }

    #[test]
    fn test_force_idle_keeps_baseline() {
        let mut r = record();
        let pose = Pose::from_euler_deg([0.0; 3], [1.0, 0.0, 0.0]);
        r.apply(single_x(), pose);
        assert!(r.force_idle());
        assert_eq!(r.category(), GestureCategory::None);
        assert_eq!(r.baseline(), &pose);
        assert_eq!(r.active_axis(), None);
        assert!(!r.force_idle());
    }

    #[test]
    fn test_axis_delta_is_signed() {
        let mut r = record();
        r.apply(single_x(), Pose::default());
        let current = Pose::from_euler_deg([0.0; 3], [-2.0, 0.0, 0.0]);
        let delta = r.axis_delta(&current).expect("single-axis record has an axis");
        assert!((delta + 2.0).abs() < 1e-2, "got {}", delta);
    }

    #[test]
    fn test_axis_delta_none_when_idle() {
        let r = record();
        assert_eq!(r.axis_delta(&Pose::default()), None);
    }

    #[test]
    fn test_drag_distance() {
        let r = record();
        let current = Pose::new([0.0, 0.0, 0.2], crate::pose::IDENTITY_ROTATION);
        assert!((r.drag_distance(&current) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_polling_count() {
        let mut r = record();
        let polling = PollHandle::new(2);
        polling.set_polling(true);
        r.add_caller(polling, DuplicateAttach::Ignore);
        assert_eq!(r.polling_count(), 1);
        assert!(r.is_polled());
    }
}
