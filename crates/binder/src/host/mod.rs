//! # Reference Services
//!
//! In-memory stand-ins for the privileged package process, for tests and
//! embedders. [`SystemServices`] plays the part of the service locator: it
//! owns a `Node`, registers the root services and hands out handles to them.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::channel::ChannelTransport;
use crate::config::Config;
use crate::dispatch::Service;
use crate::handle::Handle;
use crate::interfaces::package_installer::PackageInstallerStub;
use crate::interfaces::package_manager::PackageManagerStub;
use crate::interfaces::permission_manager::PermissionManagerStub;
use crate::local::LocalTransport;
use crate::node::Node;
use crate::transport::Transport;

pub mod installer;
pub mod packages;
pub mod permissions;

pub use installer::PackageInstallerService;
pub use installer::SessionService;
pub use packages::PackageDatabase;
pub use packages::PackageManagerService;
pub use permissions::PermissionManagerService;

/// Root name of the `IPackageManager` service.
pub const PACKAGE_SERVICE: &str = "package";
/// Root name of the `IPermissionManager` service.
pub const PERMISSION_SERVICE: &str = "permissionmgr";

/// The installer identity sessions are created under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub package_name: String,
    pub user_id: i32,
}

impl Caller {
    pub fn new(package_name: impl Into<String>, user_id: i32) -> Self {
        Self { package_name: package_name.into(), user_id }
    }
}

pub struct SystemServices {
    node: Arc<Node>,
    database: Arc<PackageDatabase>,
}

impl SystemServices {
    /// Builds the services over `database` and registers the roots.
    pub fn start(config: Config, database: PackageDatabase, caller: Caller) -> Self {
        let node = Arc::new(Node::new(config));
        let database = Arc::new(database);

        let installer: Arc<dyn Service> =
            Arc::new(PackageInstallerStub::new(PackageInstallerService::new(database.clone(), caller)));
        let package = PackageManagerStub::new(PackageManagerService::new(database.clone(), installer));
        let permissions = PermissionManagerStub::new(PermissionManagerService::new(database.clone()));

        node.add_service(PACKAGE_SERVICE, Arc::new(package));
        node.add_service(PERMISSION_SERVICE, Arc::new(permissions));
        info!(max_transaction_len = config.max_transaction_len, "system services started");

        Self { node, database }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn database(&self) -> &Arc<PackageDatabase> {
        &self.database
    }

    /// An in-process transport into the node.
    pub fn local_transport(&self) -> Arc<dyn Transport> {
        Arc::new(LocalTransport::new(self.node.clone()))
    }

    /// Serves the node over a fresh channel connection.
    pub fn channel_transport(&self) -> (Arc<ChannelTransport>, JoinHandle<()>) {
        let (transport, server) = ChannelTransport::spawn(self.node.clone());
        (Arc::new(transport), server)
    }

    /// A handle to the root service `name`, reached through `transport`.
    pub fn handle(&self, name: &str, transport: Arc<dyn Transport>) -> Option<Handle> {
        self.node.lookup(name).map(|id| Handle::new(id, transport))
    }

    pub fn local_handle(&self, name: &str) -> Option<Handle> {
        self.handle(name, self.local_transport())
    }
}
