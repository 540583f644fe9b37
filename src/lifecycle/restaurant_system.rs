use super::config::SystemConfig;
use super::reaper::Reaper;
use crate::clients::{LedgerClient, OrderClient, ReservationClient, SessionClient, TableClient};
use crate::coordinator::Coordinator;
use crate::framework::{TransitionBus, TransitionEvent};
use crate::order_actor::OrderContext;
use crate::pricing::{ChargePolicy, NoCharges, RatePolicy};
use chrono::TimeDelta;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The running dine-in core: one actor per entity family, wired together.
///
/// # Architecture
///
/// - **Table actor**: leaf, no dependencies (`Context = ()`).
/// - **Session actor** and **Reservation actor**: claim and release tables through a
///   [`TableClient`].
/// - **Order actor**: claims tables and prices orders ([`OrderContext`]). It also owns the
///   payment ledger.
/// - **Reaper**: optional background task expiring idle sessions and holding tables for
///   upcoming reservations.
///
/// Every actor publishes its state transitions on one [`TransitionBus`].
///
/// # Example
///
/// ```ignore
/// let system = RestaurantSystem::new(SystemConfig::default());
/// let table = system.tables.create_table(params).await?;
/// let session = system.sessions.start_session(table, 2, None, None).await?;
///
/// system.shutdown().await?;
/// ```
pub struct RestaurantSystem {
    pub tables: TableClient,
    pub sessions: SessionClient,
    pub reservations: ReservationClient,
    pub orders: OrderClient,
    pub ledger: LedgerClient,
    pub coordinator: Coordinator,

    config: SystemConfig,
    bus: TransitionBus,
    reaper: Reaper,
    reaper_task: Option<(CancellationToken, JoinHandle<()>)>,
    handles: Vec<JoinHandle<()>>,
}

fn delta(duration: std::time::Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

impl RestaurantSystem {
    /// Starts every actor with the charge policy described by `config`.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn new(config: SystemConfig) -> Self {
        let pricing: Arc<dyn ChargePolicy> = if config.tax_rate.is_zero() && config.service_rate.is_zero() {
            Arc::new(NoCharges)
        } else {
            Arc::new(RatePolicy {
                tax_rate: config.tax_rate,
                service_rate: config.service_rate,
            })
        };
        Self::with_pricing(config, pricing)
    }

    pub fn with_pricing(config: SystemConfig, pricing: Arc<dyn ChargePolicy>) -> Self {
        let bus = TransitionBus::new(config.bus_capacity);
        let buffer = config.actor_buffer;

        // 1. Create actors
        let (table_actor, tables) = crate::table_actor::new(buffer);
        let (session_actor, sessions) = crate::session_actor::new(buffer, delta(config.session_idle_timeout));
        let (reservation_actor, reservations) =
            crate::reservation_actor::new(buffer, config.default_reservation_minutes);
        let (order_actor, orders, ledger) = crate::order_actor::new(buffer);

        // 2. Start them with their injected context
        let handles = vec![
            tokio::spawn(table_actor.with_bus(bus.clone()).run(())),
            tokio::spawn(session_actor.with_bus(bus.clone()).run(tables.clone())),
            tokio::spawn(reservation_actor.with_bus(bus.clone()).run(tables.clone())),
            tokio::spawn(order_actor.with_bus(bus.clone()).run(OrderContext {
                tables: tables.clone(),
                pricing,
            })),
        ];

        // 3. Background sweeps
        let reaper = Reaper::new(sessions.clone(), reservations.clone(), delta(config.reservation_lead_time));
        let reaper_task = (!config.reaper_interval.is_zero()).then(|| {
            let token = CancellationToken::new();
            let handle = tokio::spawn(reaper.clone().run(config.reaper_interval, token.clone()));
            (token, handle)
        });

        let coordinator = Coordinator::new(sessions.clone(), orders.clone(), ledger.clone());
        info!(?config, reaper = reaper_task.is_some(), "Restaurant system started");

        Self {
            tables,
            sessions,
            reservations,
            orders,
            ledger,
            coordinator,
            config,
            bus,
            reaper,
            reaper_task,
            handles,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Subscribes to every state transition committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.bus.subscribe()
    }

    /// The sweeps the background task runs, for driving them by hand.
    pub fn reaper(&self) -> &Reaper {
        &self.reaper
    }

    /// Gracefully shuts down the reaper and every actor.
    ///
    /// Actors stop once every client of theirs is dropped, including clones held by
    /// callers and by other actors' contexts. The Table actor therefore stops last.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down restaurant system...");

        if let Some((token, handle)) = self.reaper_task {
            token.cancel();
            if let Err(e) = handle.await {
                error!("Reaper task failed: {:?}", e);
                return Err(format!("Reaper task failed: {:?}", e));
            }
        }

        drop(self.coordinator);
        drop(self.reaper);
        drop(self.tables);
        drop(self.sessions);
        drop(self.reservations);
        drop(self.orders);
        drop(self.ledger);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Restaurant system shutdown complete.");
        Ok(())
    }
}
