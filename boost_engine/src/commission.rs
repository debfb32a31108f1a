//! # Commission resolution
//!
//! Pure decision logic for splitting an order total between the worker that claims it and the platform.
//!
//! Resolution uses a strict precedence, and the first match wins:
//! 1. A valid per-worker override percentage.
//! 2. The single enabled global [`CommissionConfig`].
//! 3. A provisioned default of 70% to the worker and 30% to the platform.
//!
//! Provisioning the default row is a database concern and lives with the backends. This module only decides.
//!
//! The platform share is *always* the complement of the worker share. Stored platform percentages are never trusted,
//! so the two shares of a split sum to exactly 1.0 even when the stored configuration is corrupt.
use boost_common::Cents;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::db_types::CommissionConfig;

pub const DEFAULT_WORKER_PERCENTAGE: f64 = 0.70;
pub const DEFAULT_PLATFORM_PERCENTAGE: f64 = 0.30;

/// Stored percentages that disagree by more than this are reported as corrupt.
const SPLIT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSource {
    WorkerOverride,
    GlobalConfig,
    ProvisionedDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub worker_percentage: f64,
    pub platform_percentage: f64,
    pub source: SplitSource,
}

/// The money side of a split. `commission + revenue == order_total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAmounts {
    pub commission: Cents,
    pub revenue: Cents,
}

pub fn is_valid_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

impl CommissionSplit {
    /// Builds a split from a worker percentage, clamping it into `[0, 1]`. NaN is treated as zero.
    pub fn from_worker_percentage(worker_percentage: f64, source: SplitSource) -> Self {
        let worker_percentage = if worker_percentage.is_nan() { 0.0 } else { worker_percentage.clamp(0.0, 1.0) };
        Self { worker_percentage, platform_percentage: 1.0 - worker_percentage, source }
    }

    pub fn provisioned_default() -> Self {
        Self::from_worker_percentage(DEFAULT_WORKER_PERCENTAGE, SplitSource::ProvisionedDefault)
    }

    pub fn from_config(config: &CommissionConfig) -> Self {
        let stored_sum = config.worker_percentage + config.platform_percentage;
        if !is_valid_percentage(config.worker_percentage) {
            warn!(
                "💸️ Commission config #{} has an out-of-range worker percentage ({}). It will be clamped.",
                config.id, config.worker_percentage
            );
        } else if (stored_sum - 1.0).abs() > SPLIT_EPSILON {
            warn!(
                "💸️ Commission config #{} percentages sum to {stored_sum}, not 1.0. The platform share is derived from \
                 the worker share instead.",
                config.id
            );
        }
        Self::from_worker_percentage(config.worker_percentage, SplitSource::GlobalConfig)
    }

    /// Applies the split to `total`. The commission is rounded to the nearest cent and the revenue gets the remainder.
    pub fn split_amount(&self, total: Cents) -> SplitAmounts {
        let commission = total.scale(self.worker_percentage);
        SplitAmounts { commission, revenue: total - commission }
    }
}

/// Chooses a split from a worker override and the enabled global configuration, if there are any.
///
/// Returns `None` when neither source applies. The caller must then provision the default configuration and use
/// [`CommissionSplit::provisioned_default`] (or the row that won the provisioning race).
pub fn choose_split(worker_override: Option<f64>, config: Option<&CommissionConfig>) -> Option<CommissionSplit> {
    match worker_override {
        Some(pct) if is_valid_percentage(pct) => {
            return Some(CommissionSplit::from_worker_percentage(pct, SplitSource::WorkerOverride));
        },
        Some(pct) => warn!("💸️ Ignoring out-of-range worker commission override ({pct})."),
        None => {},
    }
    config.map(CommissionSplit::from_config)
}
