use boost_common::Cents;
use boost_engine::{
    db_types::{NotificationType, OrderId, OrderStatusType, SettlementStatus},
    ClaimOutcome,
    IgnoreReason,
    OrderManagement,
    WebhookAck,
};
use cucumber::{then, when};
use serde_json::json;

use crate::cucumber::BoostWorld;

#[when(expr = "booster '{word}' claims order '{word}'")]
async fn claim(world: &mut BoostWorld, worker: String, order_id: String) {
    let outcome = world.system().claims.claim_outcome(&OrderId::from(order_id), &worker).await;
    world.claim_outcomes.push(outcome);
}

#[when(expr = "boosters '{word}' and '{word}' claim order '{word}' at the same time")]
async fn racing_claims(world: &mut BoostWorld, first: String, second: String, order_id: String) {
    let order_id = OrderId::from(order_id);
    let claims = &world.system().claims;
    let (a, b) = tokio::join!(claims.claim_outcome(&order_id, &first), claims.claim_outcome(&order_id, &second));
    world.claim_outcomes.push(a);
    world.claim_outcomes.push(b);
}

#[when(expr = "booster '{word}' starts order '{word}'")]
async fn start_order(world: &mut BoostWorld, worker: String, order_id: String) {
    world.system().ledger.start_order(&OrderId::from(order_id), &worker).await.expect("Error starting order");
}

#[when(expr = "booster '{word}' completes order '{word}'")]
async fn complete_order(world: &mut BoostWorld, worker: String, order_id: String) {
    world.system().ledger.complete_order(&OrderId::from(order_id), &worker).await.expect("Error completing order");
}

#[when(expr = "an admin cancels order '{word}'")]
async fn cancel_order(world: &mut BoostWorld, order_id: String) {
    world.system().ledger.cancel_order(&OrderId::from(order_id), "Cancelled by support").await.expect("Error cancelling");
}

#[when(expr = "the provider sends '{word}' for payment '{word}'")]
async fn provider_event(world: &mut BoostWorld, event: String, provider_id: String) {
    let payload = json!({ "event": event, "data": { "id": provider_id } }).to_string();
    let ack = world.system().payments.handle_payload(&payload).await.expect("Payment event failed");
    world.last_ack = Some(ack);
}

#[then(expr = "the claim outcome is '{word}'")]
async fn claim_outcome_is(world: &mut BoostWorld, expected: String) {
    let outcome = world.last_outcome();
    let actual = match outcome {
        ClaimOutcome::Assigned(_) => "assigned",
        ClaimOutcome::AlreadyAssigned => "already_assigned",
        ClaimOutcome::NotPayable => "not_payable",
        ClaimOutcome::TransientError => "transient_error",
    };
    assert_eq!(actual, expected, "Unexpected claim outcome: {outcome:?}");
}

#[then("exactly one claim is assigned and the other is already taken")]
async fn one_winner(world: &mut BoostWorld) {
    let winners = world.claim_outcomes.iter().filter(|o| matches!(o, ClaimOutcome::Assigned(_))).count();
    let losers = world.claim_outcomes.iter().filter(|o| matches!(o, ClaimOutcome::AlreadyAssigned)).count();
    assert_eq!(winners, 1, "{:?}", world.claim_outcomes);
    assert_eq!(losers, world.claim_outcomes.len() - 1, "{:?}", world.claim_outcomes);
}

#[then(expr = "order '{word}' is assigned to '{word}' with status {word}")]
async fn order_assigned(world: &mut BoostWorld, order_id: String, worker: String, status: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order not found");
    assert_eq!(order.worker_id.as_deref(), Some(worker.as_str()));
    assert_eq!(order.status, status.parse::<OrderStatusType>().unwrap());
}

#[then(expr = "order '{word}' has status {word}")]
async fn order_status(world: &mut BoostWorld, order_id: String, status: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order not found");
    assert_eq!(order.status, status.parse::<OrderStatusType>().unwrap());
}

#[then(expr = "order '{word}' has no worker")]
async fn order_has_no_worker(world: &mut BoostWorld, order_id: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order not found");
    assert_eq!(order.worker_id, None);
}

#[then(expr = "the commission for order '{word}' is {word}")]
async fn commission_amount(world: &mut BoostWorld, order_id: String, amount: String) {
    let order_id = OrderId::from(order_id);
    let record = world.system().db.fetch_commission_record(&order_id).await.unwrap().expect("No commission record");
    assert_eq!(record.amount, amount.parse::<Cents>().unwrap());
    let order = world.system().db.fetch_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.worker_commission, Some(record.amount));
}

#[then(expr = "the platform revenue for order '{word}' is {word}")]
async fn revenue_amount(world: &mut BoostWorld, order_id: String, amount: String) {
    let records = world.system().db.fetch_revenue_records(&OrderId::from(order_id)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, amount.parse::<Cents>().unwrap());
}

#[then(expr = "order '{word}' has exactly one commission record")]
async fn one_commission_record(world: &mut BoostWorld, order_id: String) {
    let order_id = OrderId::from(order_id);
    let record = world.system().db.fetch_commission_record(&order_id).await.unwrap().expect("No commission record");
    let order = world.system().db.fetch_order(&order_id).await.unwrap().unwrap();
    assert_eq!(order.worker_id.as_deref(), Some(record.worker_id.as_str()));
}

#[then(expr = "order '{word}' has no commission record")]
async fn no_commission_record(world: &mut BoostWorld, order_id: String) {
    let record = world.system().db.fetch_commission_record(&OrderId::from(order_id)).await.unwrap();
    assert!(record.is_none(), "{record:?}");
}

#[then(expr = "the commission record for order '{word}' is {word}")]
async fn commission_status(world: &mut BoostWorld, order_id: String, status: String) {
    let order_id = OrderId::from(order_id);
    let record = world.system().db.fetch_commission_record(&order_id).await.unwrap().expect("No commission record");
    let expected: SettlementStatus = serde_json::from_value(json!(status)).expect("Not a settlement status");
    assert_eq!(record.status, expected);
    let revenue = world.system().db.fetch_revenue_records(&order_id).await.unwrap();
    assert!(revenue.iter().all(|r| r.status == expected));
}

#[then(expr = "the global commission config is {word} to workers and {word} to the platform")]
async fn global_config(world: &mut BoostWorld, worker: String, platform: String) {
    let config = world.system().commission.fetch_config().await.expect("Error fetching config");
    assert!(config.enabled);
    assert!((config.worker_percentage - worker.parse::<f64>().unwrap()).abs() < 1e-9);
    assert!((config.platform_percentage - platform.parse::<f64>().unwrap()).abs() < 1e-9);
}

#[then("the webhook is applied")]
async fn webhook_applied(world: &mut BoostWorld) {
    let ack = world.last_ack.as_ref().expect("No webhook was sent");
    assert!(ack.is_applied(), "{ack:?}");
}

#[then(expr = "the webhook is ignored because '{word}'")]
async fn webhook_ignored(world: &mut BoostWorld, reason: String) {
    let expected: IgnoreReason = serde_json::from_value(json!(reason)).expect("Not an ignore reason");
    let ack = world.last_ack.as_ref().expect("No webhook was sent");
    assert_eq!(ack, &WebhookAck::Ignored(expected));
}

#[then(expr = "{word} '{word}' has {int} '{word}' notification(s)")]
async fn notification_count(world: &mut BoostWorld, _role: String, user: String, count: usize, kind: String) {
    let kind: NotificationType = serde_json::from_value(json!(kind)).expect("Not a notification type");
    let notes = world.system().db.fetch_notifications(&user).await.unwrap();
    let n = notes.iter().filter(|n| n.notification_type == kind).count();
    assert_eq!(n, count, "{notes:#?}");
}
