use dinein_core::clients::ActorClient;
use dinein_core::error::{Classify, ErrorKind};
use dinein_core::lifecycle::{RestaurantSystem, SystemConfig};
use dinein_core::model::{BranchId, ClaimRequest, Claimant, SessionId, TableCreate, TableId, TableStatus};
use dinein_core::session_actor::SessionError;
use dinein_core::table_actor::TableError;

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

/// Many guests scan the same QR at the same moment: exactly one session wins the table.
#[tokio::test]
async fn concurrent_scans_yield_exactly_one_session() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "T1", 4).await;

    let attempts: Vec<_> = (0..32)
        .map(|_| {
            let sessions = system.sessions.clone();
            tokio::spawn(async move { sessions.start_session(table, 2, None, None).await })
        })
        .collect();

    let mut winners = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => {
                assert!(matches!(e, SessionError::TableUnavailable { .. }), "{e:?}");
                assert_eq!(e.kind(), ErrorKind::Conflict);
            }
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(system.tables.status(table).await.unwrap(), TableStatus::Occupied);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn raw_claims_race_on_one_table() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "T2", 2).await;

    let claims: Vec<_> = (1..=16)
        .map(|i| {
            let tables = system.tables.clone();
            tokio::spawn(async move { tables.claim(table, ClaimRequest::Session(SessionId(i))).await })
        })
        .collect();

    let mut granted = Vec::new();
    for claim in claims {
        if let Ok(grant) = claim.await.unwrap() {
            granted.push(grant);
        }
    }
    assert_eq!(granted.len(), 1);
    assert!(!granted[0].already_held);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn release_by_non_holder_changes_nothing() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "T3", 4).await;

    let holder = Claimant::Session(SessionId(7));
    system.tables.claim(table, ClaimRequest::Session(SessionId(7))).await.unwrap();

    let status = system.tables.release(table, Claimant::Session(SessionId(8)), true).await.unwrap();
    assert_eq!(status, TableStatus::Occupied);

    assert_eq!(system.tables.release(table, holder, true).await.unwrap(), TableStatus::Cleaning);
    // Repeating the release is harmless.
    assert_eq!(system.tables.release(table, holder, true).await.unwrap(), TableStatus::Cleaning);
    assert_eq!(system.tables.mark_cleaned(table).await.unwrap(), TableStatus::Available);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn block_restores_previous_holder() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "T4", 4).await;
    system.tables.claim(table, ClaimRequest::Session(SessionId(1))).await.unwrap();

    assert_eq!(system.tables.block(table).await.unwrap(), TableStatus::Blocked);
    let err = system
        .tables
        .claim(table, ClaimRequest::Session(SessionId(2)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(system.tables.unblock(table).await.unwrap(), TableStatus::Occupied);
    let restored = system.tables.fetch(table).await.unwrap();
    assert_eq!(restored.holder, Some(Claimant::Session(SessionId(1))));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn qr_disabled_and_retired_tables_refuse_sessions() {
    let system = RestaurantSystem::new(quiet_config());
    let table = add_table(&system, "T5", 4).await;

    system.tables.set_qr_active(table, false).await.unwrap();
    let err = system.sessions.start_session(table, 2, None, None).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::TableUnavailable { reason: TableError::QrDisabled(_), .. }
    ));

    system.tables.retire(table).await.unwrap();
    assert!(system.tables.list_tables(BranchId(1)).await.unwrap().is_empty());
    let err = system
        .tables
        .claim(table, ClaimRequest::Session(SessionId(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::Retired(_)));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn table_numbers_are_unique_per_branch() {
    let system = RestaurantSystem::new(quiet_config());
    add_table(&system, "T9", 4).await;

    let err = system
        .tables
        .create_table(TableCreate {
            number: "T9".to_string(),
            branch_id: BranchId(1),
            capacity: 2,
            location: None,
            qr_active: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::ValidationError(_)), "{err:?}");

    // Same number in another branch is fine.
    system
        .tables
        .create_table(TableCreate {
            number: "T9".to_string(),
            branch_id: BranchId(2),
            capacity: 2,
            location: None,
            qr_active: true,
        })
        .await
        .unwrap();

    system.shutdown().await.unwrap();
}
