// /src/errors.rs
//! Error type shared by the reconciler, the differs and the config loader
use crate::types::ItemId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Duplicate id {id} in new sequence at positions {first} and {second}")]
    DuplicateId { id: ItemId, first: usize, second: usize },

    #[error("Mirror is in use by {running} background diff(s)")]
    MirrorBusy { running: usize },

    #[error("Id and hash lists differ in length: {ids} ids, {hashes} hashes")]
    LengthMismatch { ids: usize, hashes: usize },

    #[error("Failed to start diff worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("Diff worker disconnected with completions still pending")]
    WorkerDisconnected,

    #[error("Mirror lock poisoned by a panicking diff")]
    MirrorPoisoned,

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl<T> From<std::sync::PoisonError<T>> for ReconcileError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ReconcileError::MirrorPoisoned
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
