//! Synchronous differ bound to one presented list.
use crate::config::ReconcilerConfig;
use crate::diff_engine::{DiffEngine, DiffSummary};
use crate::errors::Result;
use crate::mirror::Mirror;
use crate::sink::{ImmediateSink, OperationSink, Presentation};
use crate::types::SequenceSource;
use crate::updater::{self, ListChange};
use log::debug;

/// Owns the mirror of a presented list and keeps it current.
///
/// Call [`Differ::diff_presentation`] after swapping in a new collection, or
/// [`Differ::notify`] when the list was changed directly.
#[derive(Debug, Clone)]
pub struct Differ {
    mirror: Mirror,
    config: ReconcilerConfig,
    animations_enabled: bool,
}

impl Differ {
    pub fn new(config: ReconcilerConfig) -> Self {
        Differ {
            mirror: Mirror::new(config.growth),
            config,
            animations_enabled: true,
        }
    }

    /// Starts from a list that is already presented.
    pub fn with_current<S: SequenceSource + ?Sized>(config: ReconcilerConfig, current: &S) -> Self {
        Differ {
            mirror: Mirror::from_source(current, config.growth),
            config,
            animations_enabled: true,
        }
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Reconciles against `new`, emitting into `sink`.
    pub fn diff<S, K>(&mut self, new: &S, sink: &mut K) -> Result<DiffSummary>
    where
        S: SequenceSource + ?Sized,
        K: OperationSink + ?Sized,
    {
        DiffEngine::new(&mut self.mirror, sink, &self.config).reconcile(new)
    }

    /// Reconciles against `new` and applies each operation to `presentation`
    /// as it is emitted.
    ///
    /// With animations disabled the presentation gets a single reset instead.
    pub fn diff_presentation<S, P>(&mut self, new: &S, presentation: &mut P) -> Result<DiffSummary>
    where
        S: SequenceSource + ?Sized,
        P: Presentation + ?Sized,
    {
        if !self.animations_enabled {
            debug!("Differ: animations disabled, resetting {} item(s)", new.count());
            updater::rebuild(&mut self.mirror, new);
            presentation.on_reset();
            return Ok(DiffSummary::default());
        }
        let mut sink = ImmediateSink::new(presentation);
        self.diff(new, &mut sink)
    }

    /// Records a change the consumer applied directly to the presented list.
    pub fn notify<S: SequenceSource + ?Sized>(&mut self, change: ListChange, current: &S) {
        updater::apply_change(&mut self.mirror, change, current);
    }

    pub fn animations_enabled(&self) -> bool {
        self.animations_enabled
    }

    /// Toggles animated diffs. Re-enabling resyncs the mirror from `current`.
    pub fn set_animations_enabled<S: SequenceSource + ?Sized>(&mut self, enabled: bool, current: &S) {
        if self.animations_enabled == enabled {
            return;
        }
        self.animations_enabled = enabled;
        if enabled {
            updater::rebuild(&mut self.mirror, current);
        }
        debug!("Differ: animations {}", if enabled { "enabled" } else { "disabled" });
    }
}

impl Default for Differ {
    fn default() -> Self {
        Self::new(ReconcilerConfig::default())
    }
}
