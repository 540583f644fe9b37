use dinein_core::clients::ActorClient;
use dinein_core::coordinator::CoordinatorError;
use dinein_core::error::{Classify, ErrorKind};
use dinein_core::framework::EntityKind;
use dinein_core::lifecycle::{RestaurantSystem, SystemConfig};
use dinein_core::model::{
    BranchId, ClaimRequest, Claimant, ItemInput, ItemStatus, MenuItemId, OrderCreate, OrderId, OrderOrigin,
    OrderStatus, OrderType, PaymentMethod, PaymentStatus, TableCreate, TableId, TableStatus,
};
use dinein_core::order_actor::OrderError;
use dinein_core::pricing::RatePolicy;
use dinein_core::table_actor::TableError;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn quiet_config() -> SystemConfig {
    SystemConfig {
        reaper_interval: std::time::Duration::ZERO,
        ..SystemConfig::default()
    }
}

fn dish(id: u32, quantity: u32, price: &str) -> ItemInput {
    ItemInput {
        menu_item: MenuItemId(id),
        name: format!("dish {id}"),
        quantity,
        unit_price: d(price),
        notes: None,
    }
}

fn takeaway(items: Vec<ItemInput>) -> OrderCreate {
    OrderCreate {
        branch_id: BranchId(1),
        table_id: None,
        order_type: OrderType::Takeaway,
        origin: OrderOrigin::Staff { staff: Some("counter".into()) },
        seated_under: None,
        items,
        notes: None,
    }
}

async fn staff_dine_in(system: &RestaurantSystem, items: Vec<ItemInput>) -> (TableId, OrderId) {
    let table = system
        .tables
        .create_table(TableCreate {
            number: "S1".to_string(),
            branch_id: BranchId(1),
            capacity: 4,
            location: None,
            qr_active: false,
        })
        .await
        .unwrap();
    let order = system
        .orders
        .create_order(OrderCreate {
            table_id: Some(table),
            order_type: OrderType::DineIn,
            ..takeaway(items)
        })
        .await
        .unwrap();
    (table, order)
}

#[tokio::test]
async fn overpayment_is_rejected_and_status_stays_partial() {
    let system = RestaurantSystem::new(quiet_config());
    let order = system.orders.create_order(takeaway(vec![dish(1, 1, "1000.00")])).await.unwrap();

    let first = system.ledger.apply_payment(order, d("600.00"), PaymentMethod::Card, None).await.unwrap();
    assert_eq!(first.payment_status, PaymentStatus::Partial);

    let err = system
        .ledger
        .apply_payment(order, d("500.00"), PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overpayment);
    assert!(matches!(err, OrderError::Overpayment { .. }));

    let stored = system.orders.fetch(order).await.unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Partial);
    assert_eq!(stored.payments.len(), 1);

    let last = system.ledger.apply_payment(order, d("400.00"), PaymentMethod::Upi, None).await.unwrap();
    assert_eq!(last.payment_status, PaymentStatus::Paid);
    assert_eq!(last.paid, d("1000.00"));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn totals_include_charges_and_recompute_is_stable() {
    let pricing = Arc::new(RatePolicy {
        tax_rate: d("0.05"),
        service_rate: d("0.10"),
    });
    let system = RestaurantSystem::with_pricing(quiet_config(), pricing);
    let order = system
        .orders
        .create_order(takeaway(vec![dish(1, 2, "60.00"), dish(2, 1, "120.00")]))
        .await
        .unwrap();

    let placed = system.orders.fetch(order).await.unwrap();
    assert_eq!(placed.totals.subtotal, d("240.00"));
    assert_eq!(placed.totals.total, d("276.00"));

    let discounted = system.orders.apply_discount(order, d("26.00")).await.unwrap();
    assert_eq!(discounted.total, d("250.00"));
    assert_eq!(system.orders.recompute_totals(order).await.unwrap(), discounted);
    assert_eq!(system.orders.recompute_totals(order).await.unwrap(), discounted);

    let err = system.orders.apply_discount(order, d("300.00")).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidDiscount { .. }));

    let added = system.orders.add_items(order, vec![dish(3, 1, "100.00")]).await.unwrap();
    assert_eq!(added.len(), 1);
    let totals = system.orders.recompute_totals(order).await.unwrap();
    assert_eq!(totals.subtotal, d("340.00"));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_attempts_are_kept_but_never_count() {
    let system = RestaurantSystem::new(quiet_config());
    let order = system.orders.create_order(takeaway(vec![dish(1, 1, "250.00")])).await.unwrap();

    let declined = system
        .ledger
        .record_failed_payment(order, d("250.00"), PaymentMethod::Card, "card declined")
        .await
        .unwrap();
    assert_eq!(declined.payment_status, PaymentStatus::Failed);
    assert_eq!(declined.paid, Decimal::ZERO);

    let paid = system.ledger.apply_payment(order, d("250.00"), PaymentMethod::Cash, None).await.unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(system.ledger.payments(order).await.unwrap().len(), 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn items_never_move_backwards() {
    let system = RestaurantSystem::new(quiet_config());
    let order = system.orders.create_order(takeaway(vec![dish(1, 1, "80.00")])).await.unwrap();
    let item = system.orders.fetch(order).await.unwrap().items[0].id;

    system.orders.advance_item_status(order, item, ItemStatus::Ready).await.unwrap();
    let err = system
        .orders
        .advance_item_status(order, item, ItemStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::ItemRegression { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    // Too late to add dishes once the kitchen is done with them.
    let err = system.orders.add_items(order, vec![dish(2, 1, "10.00")]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn only_unpaid_orders_can_be_cancelled() {
    let system = RestaurantSystem::new(quiet_config());
    let (table, order) = staff_dine_in(&system, vec![dish(1, 1, "300.00")]).await;
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Occupied);

    system.ledger.apply_payment(order, d("100.00"), PaymentMethod::Cash, None).await.unwrap();
    let err = system.coordinator.cancel_order(order, "guest left").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Occupied);

    let other = system.orders.create_order(takeaway(vec![dish(2, 1, "90.00")])).await.unwrap();
    assert_eq!(
        system.coordinator.cancel_order(other, "changed mind").await.unwrap(),
        OrderStatus::Cancelled
    );
    let cancelled = system.orders.fetch(other).await.unwrap();
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("changed mind"));
    assert!(cancelled.items.iter().all(|item| item.status == ItemStatus::Cancelled));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn cancelling_every_item_voids_the_order() {
    let system = RestaurantSystem::new(quiet_config());
    let (table, order) = staff_dine_in(&system, vec![dish(1, 1, "120.00"), dish(2, 1, "80.00")]).await;
    let items: Vec<_> = system.orders.fetch(order).await.unwrap().items.iter().map(|i| i.id).collect();

    let status = system.coordinator.advance_item(order, items[0], ItemStatus::Cancelled).await.unwrap();
    assert_eq!(status, OrderStatus::Pending);
    assert_eq!(system.orders.fetch(order).await.unwrap().totals.total, d("80.00"));

    let status = system.coordinator.advance_item(order, items[1], ItemStatus::Cancelled).await.unwrap();
    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Available);

    system.shutdown().await.unwrap();
}

/// Places a second order on a table that `holder` already occupies.
async fn order_under(system: &RestaurantSystem, table: TableId, holder: Claimant, items: Vec<ItemInput>) -> OrderId {
    system
        .orders
        .create_order(OrderCreate {
            table_id: Some(table),
            order_type: OrderType::DineIn,
            seated_under: Some(holder),
            ..takeaway(items)
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn voiding_a_part_paid_order_keeps_its_table() {
    let system = RestaurantSystem::new(quiet_config());
    let (table, order) = staff_dine_in(&system, vec![dish(1, 1, "100.00")]).await;
    let item = system.orders.fetch(order).await.unwrap().items[0].id;
    system.ledger.apply_payment(order, d("50.00"), PaymentMethod::Cash, None).await.unwrap();

    let err = system
        .coordinator
        .advance_item(order, item, ItemStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Order(OrderError::HasPayments { .. })), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let stored = system.orders.fetch(order).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.items[0].status, ItemStatus::Pending);

    let seat = system.tables.fetch(table).await.unwrap();
    assert_eq!(seat.status, TableStatus::Occupied);
    assert_eq!(seat.holder, Some(Claimant::Order(order)));

    // Nobody else can take the table while the order is open.
    let err = system
        .tables
        .claim(table, ClaimRequest::Order { order: OrderId(99), under: None })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn holder_order_waits_for_the_orders_riding_on_it() {
    let system = RestaurantSystem::new(quiet_config());
    let (table, host) = staff_dine_in(&system, vec![dish(1, 1, "200.00")]).await;
    let guest = order_under(&system, table, Claimant::Order(host), vec![dish(2, 1, "80.00")]).await;
    assert!(system.tables.fetch(table).await.unwrap().riders.contains(&guest));

    let host_item = system.orders.fetch(host).await.unwrap().items[0].id;
    let guest_item = system.orders.fetch(guest).await.unwrap().items[0].id;

    // Voiding the host item by item would free the table under the guest order.
    let err = system
        .coordinator
        .advance_item(host, host_item, ItemStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoordinatorError::Order(OrderError::Table(TableError::RidersOpen { .. }))),
        "{err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(system.orders.fetch(host).await.unwrap().status, OrderStatus::Pending);

    system.coordinator.advance_item(host, host_item, ItemStatus::Served).await.unwrap();
    system.ledger.apply_payment(host, d("200.00"), PaymentMethod::Card, None).await.unwrap();
    let err = system.coordinator.complete_order(host).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(system.orders.fetch(host).await.unwrap().status, OrderStatus::Served);

    let seat = system.tables.fetch(table).await.unwrap();
    assert_eq!(seat.status, TableStatus::Occupied);
    assert_eq!(seat.holder, Some(Claimant::Order(host)));

    // The guest order voids itself; the table stays with the host.
    let status = system.coordinator.advance_item(guest, guest_item, ItemStatus::Cancelled).await.unwrap();
    assert_eq!(status, OrderStatus::Cancelled);
    let seat = system.tables.fetch(table).await.unwrap();
    assert_eq!(seat.holder, Some(Claimant::Order(host)));
    assert!(seat.riders.is_empty());

    assert_eq!(system.coordinator.complete_order(host).await.unwrap(), OrderStatus::Completed);
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Cleaning);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn refunds_after_completion() {
    let system = RestaurantSystem::new(quiet_config());
    let mut events = system.subscribe();
    let (table, order) = staff_dine_in(&system, vec![dish(1, 1, "500.00")]).await;
    let item = system.orders.fetch(order).await.unwrap().items[0].id;

    let card = system.ledger.apply_payment(order, d("300.00"), PaymentMethod::Card, None).await.unwrap();
    let cash = system.ledger.apply_payment(order, d("200.00"), PaymentMethod::Cash, None).await.unwrap();
    assert_eq!(cash.payment_status, PaymentStatus::Paid);

    system.coordinator.advance_item(order, item, ItemStatus::Served).await.unwrap();
    system.coordinator.complete_order(order).await.unwrap();
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Cleaning);

    let err = system
        .coordinator
        .refund(order, d("250.00"), cash.payment.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overpayment);

    let partial = system
        .coordinator
        .refund(order, d("200.00"), cash.payment.id, Some("cold food".into()))
        .await
        .unwrap();
    assert_eq!(partial.payment_status, PaymentStatus::Paid);
    assert_eq!(partial.refunded, d("200.00"));
    assert_eq!(partial.order_status, OrderStatus::Completed);

    let full = system.coordinator.refund(order, d("300.00"), card.payment.id, None).await.unwrap();
    assert_eq!(full.payment_status, PaymentStatus::Refunded);
    assert_eq!(full.order_status, OrderStatus::Completed);

    let mut payment_states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.kind == EntityKind::OrderPayment {
            payment_states.push(event.new_state);
        }
    }
    assert_eq!(payment_states, ["PENDING", "PARTIAL", "PAID", "REFUNDED"].map(String::from).to_vec());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn full_refund_of_an_open_order_closes_it() {
    let system = RestaurantSystem::new(quiet_config());
    let (table, order) = staff_dine_in(&system, vec![dish(1, 1, "150.00")]).await;

    let payment = system.ledger.apply_payment(order, d("150.00"), PaymentMethod::Wallet, None).await.unwrap();
    let receipt = system.coordinator.refund(order, d("150.00"), payment.payment.id, None).await.unwrap();
    assert_eq!(receipt.order_status, OrderStatus::Refunded);
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Available);

    let err = system
        .ledger
        .apply_payment(order, d("10.00"), PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Closed { .. }));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn dine_in_orders_need_a_free_table() {
    let system = RestaurantSystem::new(quiet_config());
    let (table, _) = staff_dine_in(&system, vec![dish(1, 1, "100.00")]).await;

    let err = system
        .orders
        .create_order(OrderCreate {
            table_id: Some(table),
            order_type: OrderType::DineIn,
            ..takeaway(vec![dish(2, 1, "40.00")])
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::TableUnavailable { .. }), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    system.shutdown().await.unwrap();
}
