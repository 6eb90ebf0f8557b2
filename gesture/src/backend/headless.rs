//! Headless backend — replays a pose script through a gesture registry.
//!
//! Drives the registry the way a frame loop would: apply the script's
//! steps for the tick, call `tick()`, repeat.  Supports a fixed tick
//! interval, periodic status logging, and graceful signal handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::script::Script;
use crate::gesture::{GestureConfig, GestureRegistry, GestureTransition};
use crate::source::{PollHandle, SimPoseProvider, SourceKey};

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Ticks run after the last scripted step so the final motion settles.
pub const SETTLE_TICKS: u64 = 3;

/// Headless run configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Total ticks to run (default: last scripted tick + settle ticks).
    pub ticks: Option<u64>,
    /// Delay between ticks in milliseconds (0 = as fast as possible).
    pub tick_interval_ms: u64,
    /// Log registry status every N ticks (0 = never).
    pub status_every: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            ticks: None,
            tick_interval_ms: 0,
            status_every: 0,
        }
    }
}

impl HeadlessConfig {
    /// Number of ticks to run for `script`.
    pub fn total_ticks(&self, script: &Script) -> u64 {
        self.ticks
            .unwrap_or_else(|| script.last_tick().saturating_add(1 + SETTLE_TICKS))
    }
}

/// A transition and the tick it happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvent {
    pub tick: u64,
    pub transition: GestureTransition,
}

impl TickEvent {
    pub fn to_sexp(&self) -> String {
        // splice :tick into the transition plist
        let body = self.transition.to_sexp();
        let inner = body.strip_suffix(')').unwrap_or(&body);
        format!("{} :tick {})", inner, self.tick)
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Ticks actually executed.
    pub ticks: u64,
    /// Every category edge, in tick order.
    pub events: Vec<TickEvent>,
    /// Registry status just before callers detached.
    pub final_status: String,
    /// Whether the run was cut short by a signal.
    pub interrupted: bool,
}

/// Replay `script` through a fresh registry.
///
/// Each scripted source gets one polling caller, attached before tick 0
/// and detached after the last tick.
pub fn run(
    script: &Script,
    gesture_config: GestureConfig,
    config: HeadlessConfig,
) -> anyhow::Result<RunSummary> {
    let mut registry: GestureRegistry<PollHandle, SimPoseProvider> =
        GestureRegistry::new(gesture_config, SimPoseProvider::new())?;

    let callers: Vec<(SourceKey, PollHandle)> = script
        .sources()
        .into_iter()
        .enumerate()
        .map(|(i, source)| {
            let handle = PollHandle::new(i as u64 + 1);
            handle.set_polling(true);
            registry.attach(handle.clone(), source.clone());
            (source, handle)
        })
        .collect();

    SHUTDOWN_REQUESTED.store(false, Ordering::SeqCst);

    let total = config.total_ticks(script);
    let interval = Duration::from_millis(config.tick_interval_ms);
    info!(
        "Headless replay: {} step(s), {} source(s), {} tick(s) at {}ms",
        script.steps().len(),
        callers.len(),
        total,
        config.tick_interval_ms
    );

    let mut events = Vec::new();
    let mut executed = 0;
    let mut interrupted = false;

    for tick in 0..total {
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("Shutdown signal received, stopping at tick {}", tick);
            interrupted = true;
            break;
        }

        for step in script.steps_at(tick) {
            let provider = registry.provider_mut();
            if let Some(euler) = step.euler_deg {
                provider.set_euler(step.source.clone(), euler);
            }
            if let Some(position) = step.position {
                provider.set_position(step.source.clone(), position);
            }
            if let Some(poll) = step.poll {
                match callers.iter().find(|(s, _)| *s == step.source) {
                    Some((_, handle)) => handle.set_polling(poll),
                    None => warn!("tick {}: no caller for source {}", tick, step.source),
                }
            }
            debug!("tick {}: applied step for {}", tick, step.source);
        }

        for transition in registry.tick() {
            info!(
                "tick {}: {} {} -> {}",
                tick,
                transition.source,
                transition.from.as_str(),
                transition.to.as_str()
            );
            events.push(TickEvent { tick, transition });
        }
        executed = tick + 1;

        if config.status_every > 0 && executed % config.status_every == 0 {
            info!("Gesture status: {}", registry.status_sexp());
        }

        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }

    let final_status = registry.status_sexp();
    for (source, handle) in &callers {
        registry.detach(handle, source.clone());
    }

    info!(
        "Headless replay finished after {} tick(s), {} transition(s), {} source(s) still tracked",
        executed,
        events.len(),
        registry.len()
    );

    Ok(RunSummary {
        ticks: executed,
        events,
        final_status,
        interrupted,
    })
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
///
/// A signal stops the current `run` at the next tick boundary.
pub fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}
