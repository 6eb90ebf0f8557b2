//! Drivers that own a gesture registry and tick it.

pub mod headless;
pub mod script;

pub use headless::{HeadlessConfig, RunSummary, TickEvent};
pub use script::{Script, ScriptError, ScriptStep, MAX_TICK};
