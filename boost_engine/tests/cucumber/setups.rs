use boost_common::Cents;
use boost_engine::db_types::{NewOrder, NewPayment, OrderId};
use cucumber::given;

use crate::cucumber::{boost_world::BoostSystem, BoostWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut BoostWorld) {
    world.system = Some(BoostSystem::new().await);
}

#[given(expr = "an order '{word}' from client '{word}' for {word}")]
async fn new_order(world: &mut BoostWorld, order_id: String, client: String, total: String) {
    let total = total.parse::<Cents>().expect("Not a valid amount");
    let order = NewOrder::new(OrderId::from(order_id), client, "rank-boost".into(), total);
    let (_, inserted) = world.system().ledger.insert_order(order).await.expect("Error inserting order");
    assert!(inserted);
}

#[given(expr = "a pending payment '{word}' for order '{word}'")]
async fn pending_payment(world: &mut BoostWorld, provider_id: String, order_id: String) {
    let order_id = OrderId::from(order_id);
    let order = world.system().ledger.order(&order_id).await.unwrap().expect("The order does not exist");
    let payment = NewPayment::new(provider_id, order_id, order.total_price);
    world.system().ledger.insert_payment(payment).await.expect("Error inserting payment");
}

#[given(expr = "a paid order '{word}' from client '{word}' for {word}")]
async fn paid_order(world: &mut BoostWorld, order_id: String, client: String, total: String) {
    new_order(world, order_id.clone(), client, total).await;
    let provider_id = format!("pay-{order_id}");
    pending_payment(world, provider_id.clone(), order_id).await;
    let ack = world.system().payments.handle_event(&provider_id, "PAID", "{}").await.expect("Error paying order");
    assert!(ack.is_applied());
}

#[given(expr = "booster '{word}' has a commission override of {word}")]
async fn worker_override(world: &mut BoostWorld, worker: String, pct: String) {
    let pct = pct.parse::<f64>().expect("Not a valid percentage");
    world.system().commission.set_worker_override(&worker, Some(pct)).await.expect("Error setting override");
}

#[given(expr = "the global worker commission is set to {word}")]
async fn global_commission(world: &mut BoostWorld, pct: String) {
    let pct = pct.parse::<f64>().expect("Not a valid percentage");
    world.system().commission.update_config(pct).await.expect("Error updating config");
}
