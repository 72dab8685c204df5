#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use std::sync::Arc;
use uuid::Uuid;

use warehouse_api::auth::PermissiveAccessControl;
use warehouse_api::config::AppConfig;
use warehouse_api::models::{goods_receipt, product, supplier};
use warehouse_api::services::{
    NewLineItem, NewReceipt, ReceivingService, ReceivingStatsService, SqlStockAdjustment,
    StockAdjustment,
};
use warehouse_api::{db, migrator};

use sea_orm_migration::MigratorTrait;

/// Test harness wiring the service graph over a fresh in-memory SQLite
/// database with migrations applied.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub receiving: ReceivingService,
    pub stats: ReceivingStatsService,
    pub user_id: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_stock(Arc::new(SqlStockAdjustment)).await
    }

    pub async fn with_stock(stock: Arc<dyn StockAdjustment>) -> Self {
        Self::with_config(AppConfig::new("sqlite::memory:"), stock).await
    }

    pub async fn with_config(config: AppConfig, stock: Arc<dyn StockAdjustment>) -> Self {
        let pool = db::establish_connection(&config.database_url)
            .await
            .expect("db connect");
        migrator::Migrator::up(&pool, None).await.expect("migrations");
        let db = Arc::new(pool);

        let receiving = ReceivingService::new(
            db.clone(),
            &config,
            Arc::new(PermissiveAccessControl),
            stock,
            None,
        );
        let stats = ReceivingStatsService::new(db.clone());

        Self {
            db,
            config,
            receiving,
            stats,
            user_id: Uuid::new_v4(),
        }
    }

    /// A second service instance over the same database, as after a
    /// process restart.
    pub fn restart(&self) -> ReceivingService {
        ReceivingService::new(
            self.db.clone(),
            &self.config,
            Arc::new(PermissiveAccessControl),
            Arc::new(SqlStockAdjustment),
            None,
        )
    }

    pub async fn seed_supplier(&self, name: &str, active: bool) -> supplier::Model {
        supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            active: Set(active),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("seed supplier")
    }

    pub async fn seed_product(&self, sku: &str) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku.to_string()),
            name: Set(format!("Product {}", sku)),
            unit_of_measure: Set("unit".to_string()),
            stock_on_hand: Set(Decimal::ZERO),
            minimum_stock: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("seed product")
    }

    pub async fn stock_of(&self, product_id: Uuid) -> Decimal {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .expect("query product")
            .expect("product exists")
            .stock_on_hand
    }

    pub async fn receipt(&self, receipt_id: Uuid) -> goods_receipt::Model {
        self.receiving
            .get_receipt(receipt_id)
            .await
            .expect("query receipt")
            .expect("receipt exists")
    }
}

/// Shorthand for a line receiving `received` units of `product_id`.
pub fn line(product_id: Uuid, expected: Option<Decimal>, received: Decimal) -> NewLineItem {
    NewLineItem {
        product_id,
        expected_quantity: expected,
        received_quantity: received,
        unit_of_measure: "unit".to_string(),
        observations: None,
    }
}

/// Shorthand for a single-line receipt draft.
pub fn draft(supplier_id: Uuid, lines: Vec<NewLineItem>) -> NewReceipt {
    NewReceipt {
        supplier_id,
        purchase_order_number: Some("PO-1001".to_string()),
        observations: None,
        line_items: lines,
    }
}
