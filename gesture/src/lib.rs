//! EWWM gesture — spatial gesture classification for tracked VR controllers.
//!
//! Part of the EXWM-VR project.  Classifies the pose stream of each tracked
//! source into idle, drag, single-axis rotation or free rotation, and shares
//! that state between every caller interested in the source.

pub mod backend;
pub mod gesture;
pub mod pose;
pub mod source;

pub use gesture::{
    GestureCategory, GestureConfig, GestureRecord, GestureRegistry, GestureTransition,
};
pub use pose::Pose;
pub use source::{Caller, PollHandle, PoseProvider, SimPoseProvider, SourceKey};
