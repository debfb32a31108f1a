//! The claim coordinator.
//!
//! A claim is decided by the backend's conditional update, never by the read this API does first. That read only
//! lets obviously hopeless claims fail fast without touching the write path.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderId, OrderStatusType},
    engine_api::errors::{ClaimError, ClaimOutcome},
    events::{EventProducers, OrderClaimedEvent},
    traits::{ClaimAttempt, ClaimedOrder, OrderManagement, SettlementDatabase},
};

pub struct ClaimApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ClaimApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClaimApi")
    }
}

impl<B> ClaimApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ClaimApi<B>
where B: SettlementDatabase + OrderManagement
{
    /// Claims the order for `worker_id`.
    ///
    /// Exactly one of any number of concurrent claimants for the same order succeeds. The others receive
    /// [`ClaimError::AlreadyAssigned`] (or [`ClaimError::NotPayable`] if the order changed state in the meantime).
    /// A successful claim has already committed the commission and revenue records when this returns.
    ///
    /// After a [`ClaimError::Transient`] error the outcome is unknown to the caller. Read the order again before
    /// retrying.
    pub async fn claim(&self, order_id: &OrderId, worker_id: &str) -> Result<ClaimedOrder, ClaimError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await
            .map_err(|e| ClaimError::from_ledger(order_id, e))?
            .ok_or_else(|| ClaimError::OrderNotFound(order_id.clone()))?;
        check_claimable(&order)?;
        trace!("🤝️ Order {order_id} looks claimable. Trying the conditional claim for {worker_id}");
        let attempt =
            self.db.try_claim_order(order_id, worker_id).await.map_err(|e| ClaimError::from_ledger(order_id, e))?;
        match attempt {
            ClaimAttempt::Won(claimed) => {
                info!("🤝️ Order {order_id} claimed by {worker_id}");
                let event = OrderClaimedEvent::new(claimed.order.clone(), claimed.commission.clone());
                self.producers.publish_order_claimed(event).await;
                Ok(claimed)
            },
            ClaimAttempt::Lost(current) => {
                // Losing a race is business as usual, not an error
                debug!("🤝️ {worker_id} lost the claim race for {order_id}");
                check_claimable(&current)?;
                // The conditional update matched nothing, yet the order reads as claimable
                Err(ClaimError::Transient(format!("The claim on {order_id} did not apply. Read the order and retry.")))
            },
        }
    }

    /// [`Self::claim`], flattened into its exit contract.
    pub async fn claim_outcome(&self, order_id: &OrderId, worker_id: &str) -> ClaimOutcome {
        let result = self.claim(order_id, worker_id).await;
        if let Err(e) = &result {
            if e.is_transient() {
                warn!("🤝️ Claim of {order_id} by {worker_id} failed: {e}");
            }
        }
        ClaimOutcome::from(result)
    }
}

fn check_claimable(order: &Order) -> Result<(), ClaimError> {
    if order.worker_id.is_some() {
        return Err(ClaimError::AlreadyAssigned(order.order_id.clone()));
    }
    if order.status != OrderStatusType::Paid {
        return Err(ClaimError::NotPayable { order_id: order.order_id.clone(), status: order.status });
    }
    Ok(())
}
