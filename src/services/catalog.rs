use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{product, supplier};

/// Read-only master-data lookups. Product and supplier management belong
/// to another subsystem; the receiving workflow only needs existence and
/// activity checks.
#[derive(Clone)]
pub struct MasterDataService {
    db: Arc<DatabaseConnection>,
}

impl MasterDataService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn product_exists(&self, product_id: Uuid) -> Result<bool, ServiceError> {
        let found = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?;
        Ok(found.is_some())
    }

    #[instrument(skip(self))]
    pub async fn supplier_exists(&self, supplier_id: Uuid) -> Result<bool, ServiceError> {
        let found = supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db)
            .await?;
        Ok(found.is_some())
    }

    #[instrument(skip(self))]
    pub async fn supplier_is_active(&self, supplier_id: Uuid) -> Result<bool, ServiceError> {
        let found = supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db)
            .await?;
        Ok(found.map(|s| s.active).unwrap_or(false))
    }
}
