//! Payment provider callback payloads.
//!
//! Providers post `{"event": "payment.paid", "data": {"id": "...", "status": "PAID"}}`. Some use `type` instead of
//! `event`, and some leave the status out of `data` and only encode it in the event name.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{db_types::PaymentStatus, engine_api::errors::PaymentEventError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// The event name, from `event` or `type`
    pub event: Option<String>,
    /// The provider's identifier for the payment (`data.id`)
    pub provider_id: String,
    /// The effective status string
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPaymentEvent {
    event: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: RawPaymentData,
}

#[derive(Debug, Default, Deserialize)]
struct RawPaymentData {
    id: Option<Value>,
    status: Option<String>,
}

impl PaymentEvent {
    pub fn new<S: Into<String>>(provider_id: S, status: S) -> Self {
        Self { event: None, provider_id: provider_id.into(), status: Some(status.into()) }
    }

    pub fn from_json(payload: &str) -> Result<Self, PaymentEventError> {
        let raw: RawPaymentEvent =
            serde_json::from_str(payload).map_err(|e| PaymentEventError::InvalidPayload(e.to_string()))?;
        let provider_id = match raw.data.id {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(PaymentEventError::MissingProviderId),
        };
        let event = raw.event.or(raw.kind);
        let status = raw.data.status.filter(|s| !s.trim().is_empty()).or_else(|| {
            event.as_deref().and_then(|e| e.rsplit('.').next()).filter(|s| !s.is_empty()).map(str::to_string)
        });
        Ok(Self { event, provider_id, status })
    }

    /// The payment status this event asks for, if it is one the engine acts on.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.status.as_deref().and_then(parse_incoming_status)
    }
}

/// Case-insensitive. `PENDING` is not something a provider can move a payment *to*, so it is not recognised.
pub fn parse_incoming_status(status: &str) -> Option<PaymentStatus> {
    match status.parse::<PaymentStatus>() {
        Ok(PaymentStatus::Pending) | Err(_) => None,
        Ok(s) => Some(s),
    }
}
