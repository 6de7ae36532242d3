//! Tunables for the mirror growth policy, id validation and the diff worker
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Capacity policy used when the mirror overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthPolicy {
    pub min_capacity: usize,
    pub growth_divisor: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy {
            min_capacity: 10,
            growth_divisor: 2,
        }
    }
}

impl GrowthPolicy {
    /// Capacity to grow to once `len` slots are full.
    pub fn next_capacity(&self, len: usize) -> usize {
        let step = len / self.growth_divisor.max(1);
        self.min_capacity.max(len + step.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub growth: GrowthPolicy,
    /// Reject new sequences containing the same id twice.
    pub check_unique_ids: bool,
    pub worker_thread_name: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            growth: GrowthPolicy::default(),
            check_unique_ids: true,
            worker_thread_name: "seq-reconciler-worker".to_string(),
        }
    }
}

impl ReconcilerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
