//! Gesture registry — one record per source, shared by many callers.
//!
//! Callers attach interest in a source; the first attach creates the record
//! and the last detach destroys it.  The host calls [`GestureRegistry::tick`]
//! once per frame to re-classify every polled record.
//!
//! Single-threaded: attach, detach and tick must be serialized by the host.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::classifier::{Classifier, GestureCategory};
use super::config::{ConfigError, GestureConfig};
use super::record::GestureRecord;
use crate::pose::Pose;
use crate::source::{Caller, PoseProvider, SourceKey};

// ── Transitions ────────────────────────────────────────────

/// Why a record's category changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    /// The classifier detected a new gesture.
    Classified,
    /// No attached caller is polling any more.
    PollingStopped,
}

impl TransitionCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::PollingStopped => "polling-stopped",
        }
    }
}

/// A category edge produced by a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTransition {
    pub source: SourceKey,
    pub from: GestureCategory,
    pub to: GestureCategory,
    pub cause: TransitionCause,
}

impl GestureTransition {
    /// Format as an IPC event s-expression.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:type :event :event :gesture :source \"{}\" :from :{} :to :{} :cause :{} :haptic :{})",
            escape_string(self.source.as_str()),
            self.from.as_str(),
            self.to.as_str(),
            self.cause.as_str(),
            self.to.haptic_pattern().as_str(),
        )
    }
}

// ── Registry ───────────────────────────────────────────────

/// Owner of all gesture records.
pub struct GestureRegistry<C, P> {
    config: GestureConfig,
    classifier: Classifier,
    provider: P,
    records: HashMap<SourceKey, GestureRecord<C>>,
}

impl<C: Caller, P: PoseProvider> GestureRegistry<C, P> {
    /// Create a registry; rejects invalid thresholds up front.
    pub fn new(config: GestureConfig, provider: P) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Gesture registry created (rotation threshold {:.2} deg, drag distance {:.3} m)",
            config.rotation_threshold_deg, config.drag_distance_m
        );
        Ok(Self {
            classifier: Classifier::from_config(&config),
            config,
            provider,
            records: HashMap::new(),
        })
    }

    /// Create a registry with the default configuration.
    pub fn with_default_config(provider: P) -> Self {
        let config = GestureConfig::default();
        Self {
            classifier: Classifier::from_config(&config),
            config,
            provider,
            records: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Replace the configuration.  Invalid configs are rejected and the
    /// current one is kept.  Existing records keep their state.
    pub fn set_config(&mut self, config: GestureConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!("Rejected gesture config: {}", e);
            return Err(e);
        }
        self.classifier = Classifier::from_config(&config);
        self.config = config;
        Ok(())
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    // ── Attachment lifecycle ──────────────────────────────

    /// Register `caller`'s interest in `source`.
    ///
    /// The first attach for a source creates its record with the current
    /// pose as baseline.  Re-attaching the same caller follows
    /// [`GestureConfig::duplicate_attach`].
    pub fn attach(&mut self, caller: C, source: impl Into<SourceKey>) {
        let source = source.into();
        match self.records.get_mut(&source) {
            Some(record) => {
                if record.add_caller(caller, self.config.duplicate_attach) {
                    debug!(
                        "Caller attached to {} ({} caller(s))",
                        source,
                        record.caller_count()
                    );
                } else {
                    debug!("Duplicate attach to {} ignored", source);
                }
            }
            None => {
                let baseline = self.provider.pose(&source);
                info!("Tracking gesture source {}", source);
                self.records
                    .insert(source.clone(), GestureRecord::new(source, baseline, caller));
            }
        }
    }

    /// Remove one attachment of `caller` from `source`.
    ///
    /// Returns true while any interest in the source remains.  The record is
    /// dropped as soon as its last caller detaches.  Unknown sources are a
    /// no-op returning false.
    pub fn detach(&mut self, caller: &C, source: impl Into<SourceKey>) -> bool {
        let source = source.into();
        let Some(record) = self.records.get_mut(&source) else {
            return false;
        };

        if !record.remove_caller(caller) {
            debug!("Detach from {}: caller was not attached", source);
        }

        if record.has_callers() {
            return true;
        }

        self.records.remove(&source);
        info!("Stopped tracking gesture source {}", source);
        false
    }

    /// The live record for `source`, if any caller is attached to it.
    pub fn lookup(&self, source: impl Into<SourceKey>) -> Option<&GestureRecord<C>> {
        self.records.get(&source.into())
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            info!("Releasing {} gesture source(s)", self.records.len());
        }
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tracked sources, sorted.
    pub fn sources(&self) -> Vec<SourceKey> {
        let mut sources: Vec<SourceKey> = self.records.keys().cloned().collect();
        sources.sort();
        sources
    }

    // ── Live metrics ──────────────────────────────────────

    /// Current pose of a tracked source, read from the provider.
    pub fn current_pose(&self, source: impl Into<SourceKey>) -> Option<Pose> {
        let source = source.into();
        self.records
            .contains_key(&source)
            .then(|| self.provider.pose(&source))
    }

    /// Per-axis rotation (degrees) of a tracked source since its baseline.
    pub fn rotation_delta(&self, source: impl Into<SourceKey>) -> Option<[f32; 3]> {
        let source = source.into();
        let record = self.records.get(&source)?;
        Some(record.rotation_delta(&self.provider.pose(&source)))
    }

    /// Signed rotation (degrees) along the active axis of a single-axis
    /// rotation.
    pub fn axis_delta(&self, source: impl Into<SourceKey>) -> Option<f32> {
        let source = source.into();
        let record = self.records.get(&source)?;
        record.axis_delta(&self.provider.pose(&source))
    }

    /// Distance (meters) a tracked source has moved since its baseline.
    pub fn drag_distance(&self, source: impl Into<SourceKey>) -> Option<f32> {
        let source = source.into();
        let record = self.records.get(&source)?;
        Some(record.drag_distance(&self.provider.pose(&source)))
    }

    // ── Per-tick update ───────────────────────────────────

    /// Re-evaluate every record once and return the category edges.
    ///
    /// - No polling caller: forced to `None`, baseline kept.
    /// - Changed on its previous evaluation: skipped this tick.
    /// - Otherwise classified from its current category; a fired test
    ///   switches category and re-baselines at this tick's pose.
    ///
    /// With `enabled = false` only the first rule runs.
    pub fn tick(&mut self) -> Vec<GestureTransition> {
        let mut transitions = Vec::new();

        for record in self.records.values_mut() {
            let from = record.category();

            if !record.is_polled() {
                if record.force_idle() {
                    debug!("Gesture {} -> none on {} (not polled)", from.as_str(), record.source());
                    transitions.push(GestureTransition {
                        source: record.source().clone(),
                        from,
                        to: GestureCategory::None,
                        cause: TransitionCause::PollingStopped,
                    });
                }
                continue;
            }

            if !self.config.enabled {
                continue;
            }

            if record.take_changed() {
                continue;
            }

            let current = self.provider.pose(record.source());
            if let Some(verdict) = self.classifier.classify(from, record.baseline(), &current) {
                record.apply(verdict, current);
                debug!(
                    "Gesture {} -> {} on {}",
                    from.as_str(),
                    verdict.category.as_str(),
                    record.source()
                );
                transitions.push(GestureTransition {
                    source: record.source().clone(),
                    from,
                    to: verdict.category,
                    cause: TransitionCause::Classified,
                });
            }
        }

        transitions.sort_by(|a, b| a.source.cmp(&b.source));
        transitions
    }

    // ── IPC ───────────────────────────────────────────────

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        let mut sources = String::new();
        for source in self.sources() {
            let Some(record) = self.records.get(&source) else {
                continue;
            };
            if !sources.is_empty() {
                sources.push(' ');
            }
            sources.push_str(&format!(
                "(:source \"{}\" :category :{} :axis {} :callers {} :polling {})",
                escape_string(source.as_str()),
                record.category().as_str(),
                record
                    .active_axis()
                    .map(|a| format!(":{}", a.as_str()))
                    .unwrap_or_else(|| "nil".to_string()),
                record.caller_count(),
                record.polling_count(),
            ));
        }
        format!(
            "(:enabled {} :sources {} :records ({}))",
            if self.config.enabled { "t" } else { "nil" },
            self.records.len(),
            sources,
        )
    }

    /// Generate s-expression for IPC config.
    pub fn config_sexp(&self) -> String {
        self.config.to_sexp()
    }
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Tests ──────────────────────────────────────────────────
