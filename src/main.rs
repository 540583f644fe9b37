//! Demo: one QR dine-in visit from scan to cleaning.
//!
//! 1. A guest scans the QR on table T4 and adds dishes to the cart.
//! 2. Checkout turns the cart into an order on the same table.
//! 3. The kitchen serves every item, the guest pays, staff complete the order.
//! 4. The table is left for cleaning and the session completes.
//!
//! Every state transition published on the bus is logged as it happens.

use dinein_core::clients::ActorClient;
use dinein_core::lifecycle::{setup_tracing, RestaurantSystem, SystemConfig};
use dinein_core::model::{BranchId, ItemInput, ItemStatus, MenuItemId, PaymentMethod, TableCreate};
use rust_decimal::Decimal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Instrument};

fn dish(id: u32, name: &str, quantity: u32, price: Decimal) -> ItemInput {
    ItemInput {
        menu_item: MenuItemId(id),
        name: name.to_string(),
        quantity,
        unit_price: price,
        notes: None,
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = SystemConfig::from_env().map_err(|e| e.to_string())?;
    let system = RestaurantSystem::new(config);

    let mut events = system.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    kind = ?event.kind,
                    id = %event.entity_id,
                    from = event.old_state.as_deref().unwrap_or("-"),
                    to = %event.new_state,
                    "Transition"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Listener fell behind, events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let table = system
        .tables
        .create_table(TableCreate {
            number: "T4".to_string(),
            branch_id: BranchId(1),
            capacity: 4,
            location: Some("Window".to_string()),
            qr_active: true,
        })
        .await
        .map_err(|e| e.to_string())?;

    // Guest side
    let session = async {
        let session = system.sessions.start_session(table, 3, Some("Meera".into()), None).await?;
        system
            .sessions
            .add_to_cart(session.id, dish(1, "Paneer Tikka", 2, Decimal::new(6000, 2)))
            .await?;
        system
            .sessions
            .add_to_cart(session.id, dish(2, "Dal Makhani", 1, Decimal::new(12000, 2)))
            .await?;
        Ok::<_, dinein_core::session_actor::SessionError>(session)
    }
    .instrument(tracing::info_span!("qr_ordering"))
    .await
    .map_err(|e| e.to_string())?;

    let order = system
        .coordinator
        .checkout(session.id, None)
        .instrument(tracing::info_span!("checkout"))
        .await
        .map_err(|e| e.to_string())?;
    info!(order = %order.id, number = %order.number, total = %order.totals.total, "Order placed");

    // Kitchen and cashier side
    async {
        for item in &order.items {
            system
                .coordinator
                .advance_item(order.id, item.id, ItemStatus::Served)
                .await
                .map_err(|e| e.to_string())?;
        }
        let receipt = system
            .ledger
            .apply_payment(order.id, order.totals.total, PaymentMethod::Upi, Some("UPI-77812".into()))
            .await
            .map_err(|e| e.to_string())?;
        info!(payment_status = %receipt.payment_status, paid = %receipt.paid, "Payment recorded");
        system.coordinator.complete_order(order.id).await.map_err(|e| e.to_string())?;
        Ok::<_, String>(())
    }
    .instrument(tracing::info_span!("settlement"))
    .await?;

    let table_status = system.tables.status(table).await.map_err(|e| e.to_string())?;
    let session_status = system.sessions.fetch(session.id).await.map_err(|e| e.to_string())?.status;
    info!(%table_status, %session_status, "Visit finished");

    system.tables.mark_cleaned(table).await.map_err(|e| e.to_string())?;

    system.shutdown().await?;
    listener.await.map_err(|e| e.to_string())?;
    Ok(())
}
