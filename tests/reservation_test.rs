use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use dinein_core::clients::{ActorClient, BookingRequest};
use dinein_core::error::{Classify, ErrorKind};
use dinein_core::lifecycle::{RestaurantSystem, SystemConfig};
use dinein_core::model::{
    BranchId, Claimant, ItemInput, MenuItemId, OrderCreate, OrderOrigin, OrderType, ReservationStatus, TableCreate,
    TableId, TableStatus,
};
use dinein_core::reservation_actor::ReservationError;
use dinein_core::table_actor::TableError;
use rust_decimal::Decimal;

fn quiet_config() -> SystemConfig {
    SystemConfig {
        reaper_interval: std::time::Duration::ZERO,
        ..SystemConfig::default()
    }
}

async fn add_table(system: &RestaurantSystem, number: &str, capacity: u32) -> TableId {
    system
        .tables
        .create_table(TableCreate {
            number: number.to_string(),
            branch_id: BranchId(1),
            capacity,
            location: None,
            qr_active: true,
        })
        .await
        .expect("Failed to create table")
}

fn booking(table: Option<TableId>, hour: u32, minute: u32, duration_minutes: Option<u32>) -> BookingRequest {
    BookingRequest {
        branch_id: BranchId(1),
        table_id: table,
        customer_name: "Farah".to_string(),
        customer_phone: "+91-98450-00000".to_string(),
        guest_count: 2,
        date: NaiveDate::from_ymd_opt(2030, 5, 17).unwrap(),
        time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        duration_minutes,
        notes: None,
    }
}

fn booking_at(table: TableId, starts_at: DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        date: starts_at.date_naive(),
        time: starts_at.time(),
        ..booking(Some(table), 0, 0, Some(90))
    }
}

#[tokio::test]
async fn overlapping_windows_on_one_table_conflict() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "R1", 4).await;

    // 19:00-21:00 with the default length.
    let first = system.reservations.book(booking(Some(table), 19, 0, None)).await.unwrap();
    assert_eq!(first.status, ReservationStatus::Confirmed);
    assert_eq!(first.duration_minutes, 120);

    let err = system
        .reservations
        .propose(booking(Some(table), 20, 0, Some(120)))
        .await
        .unwrap_err();
    assert_eq!(err, ReservationError::Overlap { table, with: first.id });
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Back-to-back is fine: windows are half-open.
    let third = system.reservations.propose(booking(Some(table), 21, 0, Some(90))).await.unwrap();
    assert_eq!(system.reservations.fetch(third).await.unwrap().status, ReservationStatus::Pending);

    // Cancelling the first frees the window for someone else.
    system.reservations.cancel(first.id).await.unwrap();
    system.reservations.book(booking(Some(table), 20, 0, Some(60))).await.unwrap();

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn party_must_fit_the_table() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "R2", 2).await;

    let err = system
        .reservations
        .propose(BookingRequest {
            guest_count: 5,
            ..booking(Some(table), 19, 0, None)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::TableTooSmall { capacity: 2, guests: 5, .. }));

    let err = system
        .reservations
        .propose(booking(Some(TableId(99)), 19, 0, None))
        .await
        .unwrap_err();
    assert_eq!(err, ReservationError::TableNotFound(TableId(99)));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn unassigned_bookings_get_the_smallest_free_table() {
    let system = RestaurantSystem::new(quiet_config());
    let large = add_table(&system, "R3", 6).await;
    let small = add_table(&system, "R4", 2).await;

    let first = system.reservations.book(booking(None, 19, 0, None)).await.unwrap();
    assert_eq!(first.table_id, Some(small));

    let second = system.reservations.book(booking(None, 19, 30, None)).await.unwrap();
    assert_eq!(second.table_id, Some(large));

    let err = system.reservations.propose(booking(None, 20, 0, None)).await.unwrap_err();
    assert!(matches!(err, ReservationError::NoSuitableTable { .. }));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn hold_seat_and_complete() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "R5", 4).await;

    let starts_at = Utc::now() + TimeDelta::minutes(20);
    let reservation = system.reservations.book(booking_at(table, starts_at)).await.unwrap();

    // Too early for the default 30 minute lead.
    let early = system.reaper().activate_reservations_at(starts_at - TimeDelta::minutes(45)).await;
    assert!(early.is_empty());
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Available);

    let held = system.reaper().activate_reservations_at(starts_at - TimeDelta::minutes(10)).await;
    assert_eq!(held, vec![reservation.id]);
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Reserved);

    // A held table refuses walk-in QR guests.
    assert!(system.sessions.start_session(table, 2, None, None).await.is_err());

    assert_eq!(system.reservations.seat(reservation.id).await.unwrap(), table);
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Occupied);

    assert_eq!(
        system.reservations.complete(reservation.id).await.unwrap(),
        ReservationStatus::Completed
    );
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Cleaning);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn seating_on_an_occupied_table_keeps_the_reservation_confirmed() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "R6", 4).await;

    let reservation = system
        .reservations
        .book(booking_at(table, Utc::now() + TimeDelta::minutes(5)))
        .await
        .unwrap();
    // Walk-in guests are still finishing their meal.
    system.sessions.start_session(table, 2, None, None).await.unwrap();

    let err = system.reservations.seat(reservation.id).await.unwrap_err();
    assert!(matches!(err, ReservationError::TableUnavailable { .. }), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let unchanged = system.reservations.fetch(reservation.id).await.unwrap();
    assert_eq!(unchanged.status, ReservationStatus::Confirmed);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn no_show_releases_the_hold() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "R7", 4).await;

    let starts_at = Utc::now() + TimeDelta::minutes(10);
    let reservation = system.reservations.book(booking_at(table, starts_at)).await.unwrap();
    assert!(system.reservations.activate(reservation.id, Utc::now(), TimeDelta::minutes(30)).await.unwrap());
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Reserved);

    assert_eq!(
        system.reservations.mark_no_show(reservation.id).await.unwrap(),
        ReservationStatus::NoShow
    );
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Available);

    let err = system.reservations.seat(reservation.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn pending_proposals_do_not_block_each_other() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "R8", 4).await;

    // Only confirmed or seated bookings hold a window; two proposals may overlap.
    let first = system.reservations.propose(booking(Some(table), 19, 0, Some(120))).await.unwrap();
    let second = system.reservations.propose(booking(Some(table), 20, 0, Some(120))).await.unwrap();

    // Whoever confirms first keeps the window.
    let confirmed = system.reservations.confirm(second).await.unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);
    let err = system.reservations.confirm(first).await.unwrap_err();
    assert_eq!(err, ReservationError::Overlap { table, with: second });
    assert_eq!(system.reservations.fetch(first).await.unwrap().status, ReservationStatus::Pending);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn seated_party_stays_until_its_orders_close() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "R9", 4).await;

    let reservation = system
        .reservations
        .book(booking_at(table, Utc::now() + TimeDelta::minutes(5)))
        .await
        .unwrap();
    system.reservations.seat(reservation.id).await.unwrap();

    let order = system
        .orders
        .create_order(OrderCreate {
            branch_id: BranchId(1),
            table_id: Some(table),
            order_type: OrderType::DineIn,
            origin: OrderOrigin::Staff { staff: Some("meera".into()) },
            seated_under: Some(Claimant::Reservation(reservation.id)),
            items: vec![ItemInput {
                menu_item: MenuItemId(5),
                name: "Kulfi".into(),
                quantity: 2,
                unit_price: Decimal::new(9000, 2),
                notes: None,
            }],
            notes: None,
        })
        .await
        .unwrap();

    let err = system.reservations.complete(reservation.id).await.unwrap_err();
    assert!(matches!(err, ReservationError::Table(TableError::RidersOpen { .. })), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        system.reservations.fetch(reservation.id).await.unwrap().status,
        ReservationStatus::Seated
    );
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Occupied);

    system.orders.cancel_order(order, "party changed plans").await.unwrap();
    assert_eq!(
        system.reservations.complete(reservation.id).await.unwrap(),
        ReservationStatus::Completed
    );
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Cleaning);

    system.shutdown().await.unwrap();
}
