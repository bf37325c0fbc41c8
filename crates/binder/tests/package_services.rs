//! Integration tests for the package and permission services.

use binder::Config;
use binder::ErrorKind;
use binder::Registry;
use binder::host::Caller;
use binder::host::PACKAGE_SERVICE;
use binder::host::PERMISSION_SERVICE;
use binder::host::PackageDatabase;
use binder::host::SystemServices;
use binder::interfaces::package_installer::DELETE_ALL_USERS;
use binder::interfaces::package_installer::INSTALL_FAILED_INVALID_URI;
use binder::interfaces::package_installer::INSTALL_SUCCEEDED;
use binder::interfaces::package_installer::PackageInstallerProxy;
use binder::interfaces::package_manager;
use binder::interfaces::package_manager::PackageManagerProxy;
use binder::interfaces::permission_manager::PERMISSION_DENIED;
use binder::interfaces::permission_manager::PERMISSION_GRANTED;
use binder::interfaces::permission_manager::PermissionManagerProxy;
use transact::exception;

const APP: &str = "com.example.app";
const SETTINGS: &str = "com.android.settings";
const CAMERA: &str = "android.permission.CAMERA";

fn system() -> SystemServices {
    binder::logging::init();
    let database = PackageDatabase::new()
        .with_package(APP, false, &[0, 10])
        .with_package(SETTINGS, true, &[0]);
    SystemServices::start(Config::default(), database, Caller::new("com.example.store", 0))
}

async fn package_manager(system: &SystemServices) -> PackageManagerProxy {
    let handle = system.local_handle(PACKAGE_SERVICE).expect("package service registered");
    PackageManagerProxy::as_interface(&handle).await.expect("query").expect("is a package manager")
}

async fn permissions(system: &SystemServices) -> PermissionManagerProxy {
    let handle = system.local_handle(PERMISSION_SERVICE).expect("permission service registered");
    PermissionManagerProxy::as_interface(&handle).await.expect("query").expect("is a permission manager")
}

// ============================================================================
//  INTERFACE QUERIES
// ============================================================================

#[tokio::test]
async fn test_descriptor_of_roots() {
    let system = system();
    let registry = Registry::builtin();

    let handle = system.local_handle(PACKAGE_SERVICE).expect("registered");
    assert_eq!(registry.descriptor_of(&handle).await.expect("query"), package_manager::NAME);

    let pm = package_manager(&system).await;
    let installer = pm.get_package_installer().await.expect("installer");
    let name = registry.descriptor_of(installer.proxy().handle()).await.expect("query");
    assert_eq!(name, "android.content.pm.IPackageInstaller");
}

#[tokio::test]
async fn test_as_interface_wrong_interface() {
    let system = system();
    let handle = system.local_handle(PACKAGE_SERVICE).expect("registered");

    assert!(PermissionManagerProxy::as_interface(&handle).await.expect("query").is_none());
    assert!(PackageInstallerProxy::as_interface(&handle).await.expect("query").is_none());

    let proxy = Registry::builtin().as_interface_named(&handle, package_manager::NAME).await.expect("query");
    assert!(proxy.is_some());
}

#[tokio::test]
async fn test_installer_is_shared() {
    let system = system();
    let pm = package_manager(&system).await;

    let a = pm.get_package_installer().await.expect("installer");
    let b = pm.get_package_installer().await.expect("installer");
    assert_eq!(a.proxy().handle().id(), b.proxy().handle().id());
}

// ============================================================================
//  PACKAGES
// ============================================================================

#[tokio::test]
async fn test_package_queries() {
    let system = system();
    let pm = package_manager(&system).await;

    assert!(pm.is_package_available(APP, 0).await.expect("query"));
    assert!(pm.is_package_available(APP, 10).await.expect("query"));
    assert!(!pm.is_package_available(APP, 11).await.expect("query"));
    assert!(!pm.is_package_available("com.nope", 0).await.expect("query"));

    assert_eq!(pm.get_all_packages().await.expect("list"), vec![SETTINGS.to_string(), APP.to_string()]);
}

#[tokio::test]
async fn test_uninstall_per_user() {
    let system = system();
    let pm = package_manager(&system).await;
    let installer = pm.get_package_installer().await.expect("installer");

    installer.uninstall(APP, "com.example.store", 0, 10).await.expect("uninstall");
    assert!(pm.is_package_available(APP, 0).await.expect("query"));
    assert!(!pm.is_package_available(APP, 10).await.expect("query"));

    let err = installer.uninstall(APP, "com.example.store", 0, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteException);
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_ARGUMENT));

    assert_eq!(system.database().installed_users(APP).await, Some(vec![0]));

    installer.uninstall(APP, "com.example.store", 0, 0).await.expect("uninstall");
    assert_eq!(pm.get_all_packages().await.expect("list"), vec![SETTINGS.to_string()]);
    assert!(!system.database().is_known(APP).await);
    assert_eq!(system.database().installed_users(APP).await, None);
}

#[tokio::test]
async fn test_uninstall_unknown_package() {
    let system = system();
    let pm = package_manager(&system).await;
    let installer = pm.get_package_installer().await.expect("installer");

    let err = installer.uninstall("com.nope", "com.example.store", 0, 0).await.unwrap_err();
    let remote = err.as_remote().expect("raised by the service");
    assert_eq!(remote.kind, exception::ILLEGAL_ARGUMENT);
    assert_eq!(remote.message, "unknown package: com.nope");
}

#[tokio::test]
async fn test_system_package_survives_uninstall() {
    let system = system();
    let pm = package_manager(&system).await;
    let installer = pm.get_package_installer().await.expect("installer");

    installer.uninstall(SETTINGS, "com.example.store", DELETE_ALL_USERS, 0).await.expect("uninstall");
    assert!(!pm.is_package_available(SETTINGS, 0).await.expect("query"));
    assert!(pm.get_all_packages().await.expect("list").contains(&SETTINGS.to_string()));
    assert!(system.database().is_known(SETTINGS).await);
    assert_eq!(system.database().installed_users(SETTINGS).await, Some(Vec::new()));

    let status = installer.install_existing_package(SETTINGS, 0, 0, 0).await.expect("install");
    assert_eq!(status, INSTALL_SUCCEEDED);
    assert!(pm.is_package_available(SETTINGS, 0).await.expect("query"));

    let status = installer.install_existing_package("com.nope", 0, 0, 0).await.expect("install");
    assert_eq!(status, INSTALL_FAILED_INVALID_URI);
}

// ============================================================================
//  PERMISSIONS
// ============================================================================

#[tokio::test]
async fn test_grant_check_revoke() {
    let system = system();
    let permissions = permissions(&system).await;

    assert_eq!(permissions.check_permission(CAMERA, APP, 0).await.expect("check"), PERMISSION_DENIED);

    permissions.grant_runtime_permission(APP, CAMERA, 0).await.expect("grant");
    assert_eq!(permissions.check_permission(CAMERA, APP, 0).await.expect("check"), PERMISSION_GRANTED);
    assert_eq!(permissions.check_permission(CAMERA, APP, 10).await.expect("check"), PERMISSION_DENIED);

    permissions.revoke_runtime_permission(APP, CAMERA, 0, "user request").await.expect("revoke");
    assert_eq!(permissions.check_permission(CAMERA, APP, 0).await.expect("check"), PERMISSION_DENIED);
}

#[tokio::test]
async fn test_grant_requires_installed_package() {
    let system = system();
    let permissions = permissions(&system).await;

    let err = permissions.grant_runtime_permission(APP, CAMERA, 11).await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_ARGUMENT));

    let err = permissions.grant_runtime_permission("com.nope", CAMERA, 0).await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_ARGUMENT));
}

#[tokio::test]
async fn test_uninstall_drops_grants() {
    let system = system();
    let permissions = permissions(&system).await;
    let installer = package_manager(&system).await.get_package_installer().await.expect("installer");

    permissions.grant_runtime_permission(APP, CAMERA, 10).await.expect("grant");
    installer.uninstall(APP, "com.example.store", 0, 10).await.expect("uninstall");
    installer.install_existing_package(APP, 0, 0, 10).await.expect("reinstall");

    assert_eq!(permissions.check_permission(CAMERA, APP, 10).await.expect("check"), PERMISSION_DENIED);
}
