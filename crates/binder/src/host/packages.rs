//! In-memory package database and the `IPackageManager` service on top of it.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use transact::RemoteException;

use crate::dispatch::Fault;
use crate::dispatch::Service;
use crate::interfaces::package_installer::DELETE_ALL_USERS;
use crate::interfaces::package_installer::INSTALL_FAILED_INVALID_URI;
use crate::interfaces::package_installer::INSTALL_SUCCEEDED;
use crate::interfaces::package_manager::PackageManager;
use crate::interfaces::permission_manager::PERMISSION_DENIED;
use crate::interfaces::permission_manager::PERMISSION_GRANTED;

#[derive(Debug, Default)]
struct PackageRecord {
    /// System packages keep their record when the last user is removed.
    system: bool,
    users: BTreeSet<i32>,
    grants: BTreeMap<i32, BTreeSet<String>>,
}

/// Known packages, the users they are installed for and their runtime grants.
#[derive(Debug, Default)]
pub struct PackageDatabase {
    packages: RwLock<BTreeMap<String, PackageRecord>>,
}

impl PackageDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package installed for `users`.
    pub fn with_package(mut self, name: &str, system: bool, users: &[i32]) -> Self {
        let record = PackageRecord { system, users: users.iter().copied().collect(), grants: BTreeMap::new() };
        self.packages.get_mut().insert(name.to_string(), record);
        self
    }

    pub async fn is_known(&self, name: &str) -> bool {
        self.packages.read().await.contains_key(name)
    }

    pub async fn is_installed(&self, name: &str, user_id: i32) -> bool {
        self.packages.read().await.get(name).is_some_and(|p| p.users.contains(&user_id))
    }

    /// Every known package name, sorted.
    pub async fn package_names(&self) -> Vec<String> {
        self.packages.read().await.keys().cloned().collect()
    }

    pub async fn installed_users(&self, name: &str) -> Option<Vec<i32>> {
        self.packages.read().await.get(name).map(|p| p.users.iter().copied().collect())
    }

    /// Removes `name` for `user_id`, or for everyone with `DELETE_ALL_USERS`.
    pub async fn uninstall(&self, name: &str, flags: i32, user_id: i32) -> Result<(), RemoteException> {
        let mut packages = self.packages.write().await;
        let Some(record) = packages.get_mut(name) else {
            return Err(RemoteException::illegal_argument(format!("unknown package: {}", name)));
        };

        if flags & DELETE_ALL_USERS != 0 {
            record.users.clear();
            record.grants.clear();
        } else if record.users.remove(&user_id) {
            record.grants.remove(&user_id);
        } else {
            return Err(RemoteException::illegal_argument(format!(
                "package {} is not installed for user {}",
                name, user_id
            )));
        }

        if record.users.is_empty() && !record.system {
            packages.remove(name);
            info!(package = name, "package removed");
        }
        Ok(())
    }

    /// Installs an already-known package for one more user.
    pub async fn install_existing(&self, name: &str, user_id: i32) -> i32 {
        let mut packages = self.packages.write().await;
        match packages.get_mut(name) {
            Some(record) => {
                record.users.insert(user_id);
                INSTALL_SUCCEEDED
            }
            None => INSTALL_FAILED_INVALID_URI,
        }
    }

    pub async fn grant(&self, package: &str, permission: &str, user_id: i32) -> Result<(), RemoteException> {
        let mut packages = self.packages.write().await;
        let record = installed_for(&mut packages, package, user_id)?;
        record.grants.entry(user_id).or_default().insert(permission.to_string());
        Ok(())
    }

    pub async fn revoke(&self, package: &str, permission: &str, user_id: i32) -> Result<(), RemoteException> {
        let mut packages = self.packages.write().await;
        let record = installed_for(&mut packages, package, user_id)?;
        if let Some(grants) = record.grants.get_mut(&user_id) {
            grants.remove(permission);
        }
        Ok(())
    }

    pub async fn check(&self, permission: &str, package: &str, user_id: i32) -> i32 {
        let packages = self.packages.read().await;
        let granted = packages
            .get(package)
            .filter(|p| p.users.contains(&user_id))
            .and_then(|p| p.grants.get(&user_id))
            .is_some_and(|grants| grants.contains(permission));

        if granted { PERMISSION_GRANTED } else { PERMISSION_DENIED }
    }
}

fn installed_for<'a>(
    packages: &'a mut BTreeMap<String, PackageRecord>,
    package: &str,
    user_id: i32,
) -> Result<&'a mut PackageRecord, RemoteException> {
    match packages.get_mut(package) {
        Some(record) if record.users.contains(&user_id) => Ok(record),
        _ => Err(RemoteException::illegal_argument(format!(
            "package {} is not installed for user {}",
            package, user_id
        ))),
    }
}

/// `IPackageManager` backed by a [`PackageDatabase`].
pub struct PackageManagerService {
    database: Arc<PackageDatabase>,
    installer: Arc<dyn Service>,
}

impl PackageManagerService {
    pub fn new(database: Arc<PackageDatabase>, installer: Arc<dyn Service>) -> Self {
        Self { database, installer }
    }
}

#[async_trait::async_trait]
impl PackageManager for PackageManagerService {
    async fn get_package_installer(&self) -> Result<Arc<dyn Service>, Fault> {
        Ok(self.installer.clone())
    }

    async fn is_package_available(&self, package_name: String, user_id: i32) -> Result<bool, Fault> {
        Ok(self.database.is_installed(&package_name, user_id).await)
    }

    async fn get_all_packages(&self) -> Result<Vec<String>, Fault> {
        Ok(self.database.package_names().await)
    }
}
