use crate::{
    commission::CommissionSplit,
    db_types::{CommissionConfig, WorkerProfile},
    traits::LedgerError,
};

/// Commission configuration and split resolution.
#[allow(async_fn_in_trait)]
pub trait CommissionManagement {
    /// Fetches the enabled global configuration, provisioning the default one if there is none.
    ///
    /// Provisioning is an idempotent create, so concurrent first-time callers all end up with the same row.
    async fn fetch_commission_config(&self) -> Result<CommissionConfig, LedgerError>;

    /// Replaces the worker percentage of the enabled configuration. The platform percentage is stored as its
    /// complement.
    async fn update_commission_config(&self, worker_percentage: f64) -> Result<CommissionConfig, LedgerError>;

    async fn fetch_worker_profile(&self, worker_id: &str) -> Result<Option<WorkerProfile>, LedgerError>;

    /// Sets (or clears, with `None`) the worker's commission override.
    async fn set_worker_override(
        &self,
        worker_id: &str,
        percentage: Option<f64>,
    ) -> Result<WorkerProfile, LedgerError>;

    /// Resolves the split for `worker_id`: the worker's override, else the global configuration, else the
    /// provisioned default.
    async fn resolve_split(&self, worker_id: &str) -> Result<CommissionSplit, LedgerError>;
}
