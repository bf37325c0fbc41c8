//! Integration tests for installer sessions as remote objects.

use std::sync::Arc;

use binder::Config;
use binder::Error;
use binder::ErrorKind;
use binder::TransportError;
use binder::host::Caller;
use binder::host::PACKAGE_SERVICE;
use binder::host::PackageDatabase;
use binder::host::SystemServices;
use binder::interfaces::installer_session::InstallerSessionProxy;
use binder::interfaces::package_installer::PackageInstallerProxy;
use binder::interfaces::package_installer::SessionInfo;
use binder::interfaces::package_manager::PackageManagerProxy;
use transact::exception;

const INSTALLER: &str = "com.example.store";

fn system() -> SystemServices {
    binder::logging::init();
    let database = PackageDatabase::new().with_package("com.example.app", false, &[0]);
    SystemServices::start(Config::default(), database, Caller::new(INSTALLER, 0))
}

async fn installer(system: &SystemServices) -> PackageInstallerProxy {
    let handle = system.local_handle(PACKAGE_SERVICE).expect("package service registered");
    let pm = PackageManagerProxy::as_interface(&handle).await.expect("query").expect("is a package manager");
    pm.get_package_installer().await.expect("installer")
}

fn assert_dead(err: Error, session: &InstallerSessionProxy) {
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert!(!err.reached_service());
    match err {
        Error::Transport(TransportError::DeadObject(id)) => assert_eq!(id, session.handle().id()),
        other => panic!("expected a dead object, got {:?}", other),
    }
}

// ============================================================================
//  LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_abandoned_session_is_dead() {
    let system = system();
    let installer = installer(&system).await;

    let session = installer.open_session(42).await.expect("open");
    session.write("base.apk", b"apk").await.expect("write");

    installer.abandon_session(42).await.expect("abandon");

    assert_dead(session.write("base.apk", b"apk").await.unwrap_err(), &session);
    assert_dead(session.get_names().await.unwrap_err(), &session);
    assert_dead(session.commit().await.unwrap_err(), &session);

    let sessions = installer.get_my_sessions(INSTALLER, 0).await.expect("list");
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_session_abandon_from_holder() {
    let system = system();
    let installer = installer(&system).await;

    let session = installer.open_session(7).await.expect("open");
    session.abandon().await.expect("abandon");

    assert_dead(session.get_names().await.unwrap_err(), &session);

    // The installer forgot it too.
    let err = installer.abandon_session(7).await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_ARGUMENT));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let system = system();
    let installer = installer(&system).await;

    let first = installer.open_session(1).await.expect("open 1");
    let second = installer.open_session(2).await.expect("open 2");
    assert_ne!(first.handle().id(), second.handle().id());

    first.write("one.apk", b"1").await.expect("write");
    second.write("two.apk", b"22").await.expect("write");

    installer.abandon_session(1).await.expect("abandon");

    assert_dead(first.get_names().await.unwrap_err(), &first);
    assert_eq!(second.get_names().await.expect("names"), vec!["two.apk".to_string()]);
}

#[tokio::test]
async fn test_reopen_returns_same_session() {
    let system = system();
    let installer = installer(&system).await;

    let a = installer.open_session(5).await.expect("open");
    a.write("base.apk", b"x").await.expect("write");

    let b = installer.open_session(5).await.expect("reopen");
    assert_eq!(a.handle().id(), b.handle().id());
    assert_eq!(b.get_names().await.expect("names"), vec!["base.apk".to_string()]);
}

#[tokio::test]
async fn test_invalid_session_ids() {
    let system = system();
    let installer = installer(&system).await;

    for id in [0, -1] {
        let err = installer.open_session(id).await.unwrap_err();
        assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_ARGUMENT));
    }

    let err = installer.abandon_session(99).await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_ARGUMENT));
}

#[tokio::test]
async fn test_dropping_proxy_releases_object() {
    let system = system();
    let installer = installer(&system).await;
    let before = system.node().len();

    let session = installer.open_session(3).await.expect("open");
    let id = session.handle().id();
    let copy = session.clone();
    assert!(system.node().contains(id));
    assert_eq!(system.node().len(), before + 1);

    drop(session);
    assert!(system.node().contains(id), "a clone still holds the handle");

    drop(copy);
    assert!(!system.node().contains(id));
    assert_eq!(system.node().len(), before);

    // The installer still knows the session, so reopening republishes it.
    let again = installer.open_session(3).await.expect("reopen");
    assert_ne!(again.handle().id(), id);
    assert!(again.get_names().await.expect("names").is_empty());
}

// ============================================================================
//  CONTENTS
// ============================================================================

#[tokio::test]
async fn test_write_and_commit_rules() {
    let system = system();
    let installer = installer(&system).await;
    let session = installer.open_session(11).await.expect("open");

    let err = session.commit().await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_STATE));

    let err = session.write("", b"x").await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_ARGUMENT));

    session.write("split.apk", b"ab").await.expect("write");
    session.write("base.apk", b"abc").await.expect("write");
    assert_eq!(session.get_names().await.expect("names"), vec!["base.apk".to_string(), "split.apk".to_string()]);

    session.commit().await.expect("commit");

    let err = session.write("late.apk", b"x").await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_STATE));
    let err = session.commit().await.unwrap_err();
    assert_eq!(err.as_remote().map(|e| e.kind.as_str()), Some(exception::ILLEGAL_STATE));

    // Committed sessions stay readable.
    assert_eq!(session.get_names().await.expect("names").len(), 2);
}

#[tokio::test]
async fn test_get_my_sessions() {
    let system = system();
    let installer = installer(&system).await;

    assert!(installer.get_my_sessions(INSTALLER, 0).await.expect("list").is_empty());

    let session = installer.open_session(21).await.expect("open");
    session.write("base.apk", b"abc").await.expect("write");
    session.write("split.apk", b"de").await.expect("write");
    session.commit().await.expect("commit");
    installer.open_session(22).await.expect("open");

    let sessions = installer.get_my_sessions(INSTALLER, 0).await.expect("list");
    assert_eq!(
        sessions,
        vec![
            SessionInfo {
                session_id: 21,
                installer_package_name: INSTALLER.to_string(),
                user_id: 0,
                sealed: true,
                size_bytes: 5,
            },
            SessionInfo {
                session_id: 22,
                installer_package_name: INSTALLER.to_string(),
                user_id: 0,
                sealed: false,
                size_bytes: 0,
            },
        ]
    );

    assert!(installer.get_my_sessions("com.other", 0).await.expect("list").is_empty());
    assert!(installer.get_my_sessions(INSTALLER, 10).await.expect("list").is_empty());
}

#[tokio::test]
async fn test_concurrent_sessions() {
    let system = system();
    let installer = Arc::new(installer(&system).await);

    let tasks = (1..=16).map(|id| {
        let installer = installer.clone();
        tokio::spawn(async move {
            let session = installer.open_session(id).await?;
            session.write(&format!("part-{}.apk", id), &[0; 8]).await?;
            session.get_names().await
        })
    });

    for (i, result) in futures::future::join_all(tasks).await.into_iter().enumerate() {
        let names = result.expect("join").expect("session");
        assert_eq!(names, vec![format!("part-{}.apk", i + 1)]);
    }

    let sessions = installer.get_my_sessions(INSTALLER, 0).await.expect("list");
    assert_eq!(sessions.len(), 16);
    assert!(sessions.iter().all(|s| s.size_bytes == 8));
}
