use std::fmt::Debug;

use boost_common::Cents;

use crate::{
    commission::{is_valid_percentage, CommissionSplit, SplitAmounts},
    db_types::{CommissionConfig, WorkerProfile},
    engine_api::errors::CommissionError,
    traits::CommissionManagement,
};

/// Administrative access to the commission configuration, and split resolution for quotes.
pub struct CommissionApi<B> {
    db: B,
}

impl<B> Debug for CommissionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CommissionApi")
    }
}

impl<B> CommissionApi<B>
where B: CommissionManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_config(&self) -> Result<CommissionConfig, CommissionError> {
        Ok(self.db.fetch_commission_config().await?)
    }

    pub async fn update_config(&self, worker_percentage: f64) -> Result<CommissionConfig, CommissionError> {
        if !is_valid_percentage(worker_percentage) {
            return Err(CommissionError::InvalidPercentage(worker_percentage));
        }
        Ok(self.db.update_commission_config(worker_percentage).await?)
    }

    pub async fn worker_profile(&self, worker_id: &str) -> Result<Option<WorkerProfile>, CommissionError> {
        Ok(self.db.fetch_worker_profile(worker_id).await?)
    }

    pub async fn set_worker_override(
        &self,
        worker_id: &str,
        percentage: Option<f64>,
    ) -> Result<WorkerProfile, CommissionError> {
        if let Some(pct) = percentage.filter(|p| !is_valid_percentage(*p)) {
            return Err(CommissionError::InvalidPercentage(pct));
        }
        Ok(self.db.set_worker_override(worker_id, percentage).await?)
    }

    /// The split `worker_id` would get on an order worth `order_total`, and the resulting amounts.
    pub async fn resolve_split(
        &self,
        worker_id: &str,
        order_total: Cents,
    ) -> Result<(CommissionSplit, SplitAmounts), CommissionError> {
        let split = self.db.resolve_split(worker_id).await?;
        Ok((split, split.split_amount(order_total)))
    }
}
