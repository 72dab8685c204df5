//! Warehouse back-office service layer.
//!
//! The heart of this crate is the goods-receipt workflow engine
//! ([`services::receiving::ReceivingService`]): a status machine taking a
//! receipt from creation through verification, approval, acceptance with
//! stock reconciliation, rejection, and voiding, with an append-only
//! audit trail and collision-free sequential numbering. Authorization,
//! master data, and inventory adjustment are consumed through narrow
//! ports so hosts can swap their own implementations in.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AccessControl, PermissiveAccessControl};
use crate::services::stock::{SqlStockAdjustment, StockAdjustment};

/// Shared application state an API layer mounts.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub receiving: services::ReceivingService,
    pub statistics: services::ReceivingStatsService,
}

impl AppState {
    /// Wires the service graph with the default collaborators. Returns
    /// the state plus the event receiver the host must drain (e.g. with
    /// [`events::process_events`]).
    pub async fn build(
        config: config::AppConfig,
    ) -> Result<(Self, tokio::sync::mpsc::Receiver<events::Event>), errors::ServiceError> {
        let pool = db::establish_connection_from_app_config(&config).await?;
        db::run_migrations(&pool).await?;
        let db = Arc::new(pool);

        let (event_sender, receiver) = events::channel(256);
        let access: Arc<dyn AccessControl> = Arc::new(PermissiveAccessControl);
        let stock: Arc<dyn StockAdjustment> = Arc::new(SqlStockAdjustment);

        let receiving = services::ReceivingService::new(
            db.clone(),
            &config,
            access,
            stock,
            Some(event_sender.clone()),
        );
        let statistics = services::ReceivingStatsService::new(db.clone());

        Ok((
            Self {
                db,
                config,
                event_sender,
                receiving,
                statistics,
            },
            receiver,
        ))
    }
}

/// Common query parameters for list endpoints
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Standard list response wrapper with pagination metadata
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            total,
            page,
            limit,
        }
    }
}
