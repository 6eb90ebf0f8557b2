//! Spatial gesture classification — per-source records, threshold
//! classifier, and the multi-caller registry that drives them.

pub mod classifier;
pub mod config;
pub mod record;
pub mod registry;

pub use classifier::{Axis, AxisMask, Classifier, GestureCategory, HapticPattern, Verdict};
pub use config::{ConfigError, DuplicateAttach, GestureConfig};
pub use record::GestureRecord;
pub use registry::{GestureRegistry, GestureTransition, TransitionCause};
