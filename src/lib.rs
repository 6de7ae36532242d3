//! Keyed sequence reconciliation for animated list presentations.
//!
//! Given the sequence a list is currently showing and the sequence it should
//! show next, the engine emits a compact, ordered script of `Remove`,
//! `Insert`, `Move` and `Change` operations. Applying them one after another,
//! each against the list as left by the previous one, turns the old sequence
//! into the new one, so a presentation layer can animate the transition
//! instead of redrawing everything.
//!
//! - [`Differ`] reconciles synchronously on the calling thread.
//! - [`AsyncDiffer`] computes on a worker thread, collapses requests that
//!   were superseded before they started, and applies results in order.
//! - [`op_calculator::calculate`] emits per-item operations for arbitrary
//!   comparable ids.
mod async_differ;
mod config;
mod diff_engine;
mod differ;
mod errors;
mod locator;
mod mirror;
pub mod op_calculator;
mod sink;
mod types;
mod updater;

pub use async_differ::{AsyncDiffer, CoordinatorState, CoordinatorStats};
pub use config::{GrowthPolicy, ReconcilerConfig};
pub use diff_engine::{DiffEngine, DiffSummary, reconcile};
pub use differ::Differ;
pub use errors::{ReconcileError, Result};
pub use locator::{index_of, locate};
pub use mirror::Mirror;
pub use sink::{BufferingSink, ImmediateSink, OperationSink, Presentation};
pub use types::{ContentHash, Item, ItemId, Operation, RequestId, SequenceSource, next_request_id};
pub use updater::{ListChange, apply_change, rebuild};
