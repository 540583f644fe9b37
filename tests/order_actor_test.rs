use dinein_core::clients::{ActorClient, SessionClient, TableClient};
use dinein_core::framework::{mock::MockClient, FrameworkError};
use dinein_core::model::{
    BranchId, ItemInput, ItemStatus, MenuItemId, OrderCreate, OrderId, OrderOrigin, OrderType, PaymentMethod,
    SessionStatus, Table, TableId, TableStatus,
};
use dinein_core::order_actor::{OrderContext, OrderError};
use dinein_core::pricing::NoCharges;
use dinein_core::table_actor::{ClaimGrant, TableActionResult, TableError};
use rust_decimal::Decimal;
use std::sync::Arc;

fn grant(capacity: u32) -> ClaimGrant {
    ClaimGrant {
        status: TableStatus::Occupied,
        branch_id: BranchId(4),
        capacity,
        already_held: false,
    }
}

fn dine_in(table: TableId) -> OrderCreate {
    OrderCreate {
        branch_id: BranchId(4),
        table_id: Some(table),
        order_type: OrderType::DineIn,
        origin: OrderOrigin::Staff { staff: Some("anil".into()) },
        seated_under: None,
        items: vec![ItemInput {
            menu_item: MenuItemId(11),
            name: "Masala Dosa".into(),
            quantity: 2,
            unit_price: Decimal::new(9000, 2),
            notes: Some("extra chutney".into()),
        }],
        notes: None,
    }
}

/// Real Order actor with a mocked Table actor.
///
/// The order claims its table in `on_create` and releases it on completion; both calls
/// are answered by the mock, so only the Order actor's own logic is under test.
#[tokio::test]
async fn test_order_actor_with_mocked_tables() {
    let mut tables = MockClient::<Table>::new();
    tables.expect_action(TableId(3)).return_ok(TableActionResult::Claim(grant(4)));
    tables
        .expect_action(TableId(3))
        .return_ok(TableActionResult::Release(TableStatus::Cleaning));

    let (order_actor, orders, ledger) = dinein_core::order_actor::new(8);
    let actor_handle = tokio::spawn(order_actor.run(OrderContext {
        tables: TableClient::new(tables.client()),
        pricing: Arc::new(NoCharges),
    }));

    let id = orders.create_order(dine_in(TableId(3))).await.expect("Order creation failed");
    let order = orders.fetch(id).await.unwrap();
    assert_eq!(order.totals.total, Decimal::new(18000, 2));
    assert_eq!(order.seated_under, None);

    ledger
        .apply_payment(id, order.totals.total, PaymentMethod::NetBanking, None)
        .await
        .unwrap();
    orders.advance_item_status(id, order.items[0].id, ItemStatus::Served).await.unwrap();
    orders.complete_order(id).await.unwrap();

    tables.verify();

    drop(orders);
    drop(ledger);
    actor_handle.await.unwrap();
}

#[tokio::test]
async fn test_refused_claim_creates_no_order() {
    let mut tables = MockClient::<Table>::new();
    tables
        .expect_action(TableId(3))
        .return_err(FrameworkError::Entity(TableError::Conflict {
            table: TableId(3),
            status: TableStatus::Cleaning,
            holder: None,
        }));

    let (order_actor, orders, ledger) = dinein_core::order_actor::new(8);
    let actor_handle = tokio::spawn(order_actor.run(OrderContext {
        tables: TableClient::new(tables.client()),
        pricing: Arc::new(NoCharges),
    }));

    let err = orders.create_order(dine_in(TableId(3))).await.unwrap_err();
    assert!(matches!(err, OrderError::TableUnavailable { table: TableId(3), .. }), "{err:?}");
    assert_eq!(orders.get(OrderId(1)).await.unwrap(), None);

    tables.verify();

    drop(orders);
    drop(ledger);
    actor_handle.await.unwrap();
}

/// Real Session actor with a mocked Table actor: the session takes its branch from the
/// table it claimed, and walking out without ordering frees the table without cleaning.
#[tokio::test]
async fn test_session_actor_with_mocked_tables() {
    let mut tables = MockClient::<Table>::new();
    tables.expect_action(TableId(9)).return_ok(TableActionResult::Claim(grant(2)));
    tables
        .expect_action(TableId(9))
        .return_ok(TableActionResult::Release(TableStatus::Available));

    let (session_actor, sessions): (_, SessionClient) =
        dinein_core::session_actor::new(8, chrono::TimeDelta::minutes(30));
    let actor_handle = tokio::spawn(session_actor.run(TableClient::new(tables.client())));

    // A party larger than the table is allowed; staff may pull up chairs.
    let session = sessions.start_session(TableId(9), 3, None, None).await.unwrap();
    assert_eq!(session.branch_id, BranchId(4));

    assert_eq!(sessions.end_session(session.id).await.unwrap(), SessionStatus::Abandoned);

    tables.verify();

    drop(sessions);
    actor_handle.await.unwrap();
}
