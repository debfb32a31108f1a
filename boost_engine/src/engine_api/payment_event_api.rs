//! Idempotent processing of payment provider callbacks.
//!
//! The caller must have checked the authenticity of the callback before handing it to this API.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{OrderStatusType, PaymentStatus},
    engine_api::{
        errors::PaymentEventError,
        payment_objects::{parse_incoming_status, PaymentEvent},
    },
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    traits::{IgnoreReason, LedgerError, SettlementDatabase, WebhookAck},
};

pub struct PaymentEventApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PaymentEventApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentEventApi")
    }
}

impl<B> PaymentEventApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> PaymentEventApi<B>
where B: SettlementDatabase
{
    /// Parses a raw callback body and handles it.
    pub async fn handle_payload(&self, payload: &str) -> Result<WebhookAck, PaymentEventError> {
        let event = PaymentEvent::from_json(payload)?;
        let status = event.status.as_deref().unwrap_or_default();
        Ok(self.handle_event(&event.provider_id, status, payload).await?)
    }

    /// Applies the provider's `status` to the payment with `provider_id`.
    ///
    /// Every outcome other than a store failure is an acknowledgement. Unknown payments, replays and unrecognised
    /// statuses change nothing.
    pub async fn handle_event(
        &self,
        provider_id: &str,
        status: &str,
        raw_payload: &str,
    ) -> Result<WebhookAck, LedgerError> {
        trace!("🪝️ Payment event for {provider_id}: {raw_payload}");
        let Some(status) = parse_incoming_status(status) else {
            info!("🪝️ Ignoring payment event with unrecognised status '{status}' for {provider_id}");
            return Ok(WebhookAck::Ignored(IgnoreReason::UnrecognisedEvent));
        };
        let ack = self.db.apply_payment_event(provider_id, status).await?;
        if let WebhookAck::Applied(transition) = &ack {
            if transition.order_changed() {
                match (status, transition.order.status) {
                    (PaymentStatus::Paid, OrderStatusType::Paid) => {
                        let event = OrderPaidEvent::new(transition.order.clone(), transition.payment.clone());
                        self.producers.publish_order_paid(event).await;
                    },
                    (_, OrderStatusType::Cancelled) => {
                        self.producers.publish_order_annulled(OrderAnnulledEvent::new(transition.order.clone())).await;
                    },
                    _ => {},
                }
            }
        }
        Ok(ack)
    }
}
