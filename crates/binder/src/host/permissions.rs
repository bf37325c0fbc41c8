use std::sync::Arc;

use tracing::info;

use crate::dispatch::Fault;
use crate::host::packages::PackageDatabase;
use crate::interfaces::permission_manager::PermissionManager;

/// `IPermissionManager` backed by the grants in a [`PackageDatabase`].
pub struct PermissionManagerService {
    database: Arc<PackageDatabase>,
}

impl PermissionManagerService {
    pub fn new(database: Arc<PackageDatabase>) -> Self {
        Self { database }
    }
}

#[async_trait::async_trait]
impl PermissionManager for PermissionManagerService {
    async fn grant_runtime_permission(
        &self,
        package_name: String,
        permission_name: String,
        user_id: i32,
    ) -> Result<(), Fault> {
        self.database.grant(&package_name, &permission_name, user_id).await?;
        info!(package = %package_name, permission = %permission_name, user = user_id, "granted");
        Ok(())
    }

    async fn revoke_runtime_permission(
        &self,
        package_name: String,
        permission_name: String,
        user_id: i32,
        reason: String,
    ) -> Result<(), Fault> {
        self.database.revoke(&package_name, &permission_name, user_id).await?;
        info!(package = %package_name, permission = %permission_name, user = user_id, reason = %reason, "revoked");
        Ok(())
    }

    async fn check_permission(&self, permission_name: String, package_name: String, user_id: i32) -> Result<i32, Fault> {
        Ok(self.database.check(&permission_name, &package_name, user_id).await)
    }
}
