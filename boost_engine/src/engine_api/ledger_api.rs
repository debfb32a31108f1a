use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, NewPayment, Notification, Order, OrderId, OrderStatusType, Payment},
    events::{EventProducers, OrderAnnulledEvent},
    traits::{LedgerError, OrderManagement, Settlement, SettlementDatabase},
};

/// `LedgerApi` handles order intake and every order lifecycle step other than the claim itself.
pub struct LedgerApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: SettlementDatabase + OrderManagement
{
    /// Records a new order. Repeating the call with the same order id returns the stored order.
    pub async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), LedgerError> {
        let (order, inserted) = self.db.insert_order(order).await?;
        if inserted {
            debug!("🔄️ New order {} for {} ({})", order.order_id, order.owner_id, order.total_price);
        }
        Ok((order, inserted))
    }

    /// Records a new pending payment for an existing order. Repeating the call with the same provider id returns the
    /// stored payment.
    pub async fn insert_payment(&self, payment: NewPayment) -> Result<(Payment, bool), LedgerError> {
        self.db.insert_payment(payment).await
    }

    pub async fn order(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn payment(&self, provider_id: &str) -> Result<Option<Payment>, LedgerError> {
        self.db.fetch_payment(provider_id).await
    }

    pub async fn payments_for_order(&self, order_id: &OrderId) -> Result<Vec<Payment>, LedgerError> {
        self.db.fetch_payments_for_order(order_id).await
    }

    pub async fn notifications(&self, user_id: &str) -> Result<Vec<Notification>, LedgerError> {
        self.db.fetch_notifications(user_id).await
    }

    /// The order together with its commission and revenue records.
    pub async fn settlement(&self, order_id: &OrderId) -> Result<Option<Settlement>, LedgerError> {
        let Some(order) = self.db.fetch_order(order_id).await? else {
            return Ok(None);
        };
        let commission = self.db.fetch_commission_record(order_id).await?;
        let revenue = self.db.fetch_revenue_records(order_id).await?;
        Ok(Some(Settlement { order, commission, revenue }))
    }

    pub async fn transition_order(
        &self,
        order_id: &OrderId,
        expected: &[OrderStatusType],
        new_status: OrderStatusType,
    ) -> Result<Order, LedgerError> {
        let order = self.db.transition_order(order_id, expected, new_status).await?;
        if matches!(new_status, OrderStatusType::Cancelled | OrderStatusType::Disputed) {
            self.producers.publish_order_annulled(OrderAnnulledEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    pub async fn start_order(&self, order_id: &OrderId, worker_id: &str) -> Result<Order, LedgerError> {
        self.db.start_order(order_id, worker_id).await
    }

    pub async fn complete_order(&self, order_id: &OrderId, worker_id: &str) -> Result<Order, LedgerError> {
        let order = self.db.complete_order(order_id, worker_id).await?;
        info!("🔄️ Order {order_id} completed by {worker_id}");
        Ok(order)
    }

    pub async fn cancel_order(&self, order_id: &OrderId, reason: &str) -> Result<Order, LedgerError> {
        let order = self.db.cancel_order(order_id, reason).await?;
        self.producers.publish_order_annulled(OrderAnnulledEvent::new(order.clone())).await;
        Ok(order)
    }

    pub async fn dispute_order(&self, order_id: &OrderId) -> Result<Order, LedgerError> {
        let order = self.db.dispute_order(order_id).await?;
        warn!("🔄️ Order {order_id} is now disputed");
        self.producers.publish_order_annulled(OrderAnnulledEvent::new(order.clone())).await;
        Ok(order)
    }
}
