use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Action identifiers checked against the access-control collaborator.
pub mod actions {
    pub const RECEIPT_CREATE: &str = "receiving:receipt:create";
    pub const RECEIPT_UPDATE: &str = "receiving:receipt:update";
    pub const RECEIPT_VERIFY: &str = "receiving:receipt:verify";
    pub const RECEIPT_APPROVE: &str = "receiving:receipt:approve";
    pub const RECEIPT_ACCEPT: &str = "receiving:receipt:accept";
    pub const RECEIPT_REJECT: &str = "receiving:receipt:reject";
    pub const RECEIPT_VOID: &str = "receiving:receipt:void";
}

/// Authorization decision port. Role and permission management live in a
/// separate system; this crate only consumes the yes/no answer. Denial is
/// reported as `Forbidden`, never as a workflow error.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn is_allowed(
        &self,
        user_id: Uuid,
        action: &str,
        receipt_id: Option<Uuid>,
    ) -> Result<bool, ServiceError>;
}

/// Allows every action. Default for deployments where authorization is
/// enforced upstream of this service layer, and for tests.
#[derive(Debug, Default, Clone)]
pub struct PermissiveAccessControl;

#[async_trait]
impl AccessControl for PermissiveAccessControl {
    async fn is_allowed(
        &self,
        _user_id: Uuid,
        _action: &str,
        _receipt_id: Option<Uuid>,
    ) -> Result<bool, ServiceError> {
        Ok(true)
    }
}
