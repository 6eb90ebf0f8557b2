//! Tracked sources, pose providers, and the callers that watch them.
//!
//! The host environment implements [`PoseProvider`]; consumers implement
//! [`Caller`] (or use [`PollHandle`]).  [`SimPoseProvider`] is an in-memory
//! provider for headless runs and tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::pose::{quat_from_euler_deg, Pose};

// ── Source key ─────────────────────────────────────────────

/// Stable identifier of a tracked input source (e.g. "left", "right").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SourceKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Pose provider ──────────────────────────────────────────

/// Supplies the current pose of a source.  Must resolve any source that
/// has been attached.
pub trait PoseProvider {
    fn pose(&self, source: &SourceKey) -> Pose;
}

/// In-memory pose provider.  Unknown sources resolve to the identity pose.
#[derive(Debug, Clone, Default)]
pub struct SimPoseProvider {
    poses: HashMap<SourceKey, Pose>,
}

impl SimPoseProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full pose of a source.
    pub fn set_pose(&mut self, source: impl Into<SourceKey>, pose: Pose) {
        self.poses.insert(source.into(), pose);
    }

    /// Set only the rotation, from local Euler angles in degrees.
    pub fn set_euler(&mut self, source: impl Into<SourceKey>, euler_deg: [f32; 3]) {
        let pose = self.poses.entry(source.into()).or_default();
        pose.rotation = quat_from_euler_deg(euler_deg);
    }

    /// Set only the position.
    pub fn set_position(&mut self, source: impl Into<SourceKey>, position: [f32; 3]) {
        let pose = self.poses.entry(source.into()).or_default();
        pose.position = position;
    }

    /// Move a source by `delta` meters.
    pub fn translate(&mut self, source: impl Into<SourceKey>, delta: [f32; 3]) {
        let pose = self.poses.entry(source.into()).or_default();
        for (p, d) in pose.position.iter_mut().zip(delta) {
            *p += d;
        }
    }

    /// Number of sources with an explicit pose.
    pub fn source_count(&self) -> usize {
        self.poses.len()
    }
}

impl PoseProvider for SimPoseProvider {
    fn pose(&self, source: &SourceKey) -> Pose {
        self.poses.get(source).copied().unwrap_or_default()
    }
}

// ── Callers ────────────────────────────────────────────────

/// A consumer interested in a source's gesture state.
///
/// Equality is caller identity.  `is_polling` is queried once per tick for
/// every record the caller is attached to.
pub trait Caller: PartialEq {
    fn is_polling(&self) -> bool;
}

/// Shared caller handle.  Clones share the polling flag, so the owner keeps
/// one clone and hands another to the registry.
#[derive(Debug, Clone)]
pub struct PollHandle {
    id: u64,
    polling: Rc<Cell<bool>>,
}

impl PollHandle {
    /// New handle, not polling.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            polling: Rc::new(Cell::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_polling(&self, polling: bool) {
        if self.polling.replace(polling) != polling {
            debug!("Caller {} polling={}", self.id, polling);
        }
    }
}

impl PartialEq for PollHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PollHandle {}

impl Caller for PollHandle {
    fn is_polling(&self) -> bool {
        self.polling.get()
    }
}
