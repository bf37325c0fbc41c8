//! `IPackageInstaller` and its sessions.
//!
//! The installer owns the table of live sessions. Each session is a separate
//! remote object; the installer only keeps a reference so it can list,
//! reopen and abandon it. The table sits behind one async mutex per
//! installer, so `openSession` and `abandonSession` never interleave.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;

use transact::RemoteException;

use crate::dispatch::Fault;
use crate::dispatch::Service;
use crate::host::Caller;
use crate::host::packages::PackageDatabase;
use crate::interfaces::installer_session::InstallerSession;
use crate::interfaces::installer_session::InstallerSessionStub;
use crate::interfaces::package_installer::PackageInstaller;
use crate::interfaces::package_installer::SessionInfo;

type Session = InstallerSessionStub<SessionService>;

/// `IPackageInstaller` for one installer identity.
pub struct PackageInstallerService {
    database: Arc<PackageDatabase>,
    caller: Caller,
    sessions: Mutex<BTreeMap<i32, Arc<Session>>>,
}

impl PackageInstallerService {
    pub fn new(database: Arc<PackageDatabase>, caller: Caller) -> Self {
        Self { database, caller, sessions: Mutex::new(BTreeMap::new()) }
    }
}

#[async_trait::async_trait]
impl PackageInstaller for PackageInstallerService {
    async fn abandon_session(&self, session_id: i32) -> Result<(), Fault> {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, s| s.inner().is_alive());

        let Some(session) = sessions.remove(&session_id) else {
            return Err(RemoteException::illegal_argument(format!("no session {}", session_id)).into());
        };
        session.inner().mark_abandoned();
        info!(session = session_id, "session abandoned");
        Ok(())
    }

    async fn open_session(&self, session_id: i32) -> Result<Arc<dyn Service>, Fault> {
        if session_id <= 0 {
            return Err(RemoteException::illegal_argument(format!("invalid session id {}", session_id)).into());
        }

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, s| s.inner().is_alive());

        let session = sessions
            .entry(session_id)
            .or_insert_with(|| {
                debug!(session = session_id, "session created");
                Arc::new(InstallerSessionStub::new(SessionService::new(session_id, &self.caller)))
            })
            .clone();
        Ok(session)
    }

    async fn get_my_sessions(&self, installer_package_name: String, user_id: i32) -> Result<Vec<SessionInfo>, Fault> {
        let live: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.lock().await;
            sessions.retain(|_, s| s.inner().is_alive());
            sessions.values().cloned().collect()
        };

        let mut infos = Vec::new();
        for session in live {
            let info = session.inner().info().await;
            if info.installer_package_name == installer_package_name && info.user_id == user_id {
                infos.push(info);
            }
        }
        Ok(infos)
    }

    async fn uninstall(
        &self,
        package_name: String,
        caller_package_name: String,
        flags: i32,
        user_id: i32,
    ) -> Result<(), Fault> {
        self.database.uninstall(&package_name, flags, user_id).await?;
        info!(package = %package_name, caller = %caller_package_name, flags, user = user_id, "uninstalled");
        Ok(())
    }

    async fn install_existing_package(
        &self,
        package_name: String,
        install_flags: i32,
        install_reason: i32,
        user_id: i32,
    ) -> Result<i32, Fault> {
        let status = self.database.install_existing(&package_name, user_id).await;
        debug!(
            package = %package_name,
            flags = install_flags,
            reason = install_reason,
            user = user_id,
            status,
            "install existing"
        );
        Ok(status)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    files: BTreeMap<String, Vec<u8>>,
    committed: bool,
}

/// One staged install.
pub struct SessionService {
    id: i32,
    installer_package_name: String,
    user_id: i32,
    state: Mutex<SessionState>,
    abandoned: AtomicBool,
}

impl SessionService {
    pub fn new(id: i32, caller: &Caller) -> Self {
        Self {
            id,
            installer_package_name: caller.package_name.clone(),
            user_id: caller.user_id,
            state: Mutex::new(SessionState::default()),
            abandoned: AtomicBool::new(false),
        }
    }

    pub async fn info(&self) -> SessionInfo {
        let state = self.state.lock().await;
        SessionInfo {
            session_id: self.id,
            installer_package_name: self.installer_package_name.clone(),
            user_id: self.user_id,
            sealed: state.committed,
            size_bytes: state.files.values().map(|data| data.len() as i64).sum(),
        }
    }

    fn mark_abandoned(&self) {
        self.abandoned.store(true, Ordering::Release);
    }

    fn ensure_open(&self) -> Result<(), RemoteException> {
        if self.abandoned.load(Ordering::Acquire) {
            return Err(RemoteException::illegal_state(format!("session {} was abandoned", self.id)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl InstallerSession for SessionService {
    async fn write(&self, name: String, data: Vec<u8>) -> Result<(), Fault> {
        self.ensure_open()?;
        if name.is_empty() {
            return Err(RemoteException::illegal_argument("file name must not be empty").into());
        }

        let mut state = self.state.lock().await;
        if state.committed {
            return Err(RemoteException::illegal_state(format!("session {} is sealed", self.id)).into());
        }
        state.files.insert(name, data);
        Ok(())
    }

    async fn get_names(&self) -> Result<Vec<String>, Fault> {
        self.ensure_open()?;
        Ok(self.state.lock().await.files.keys().cloned().collect())
    }

    async fn commit(&self) -> Result<(), Fault> {
        self.ensure_open()?;

        let mut state = self.state.lock().await;
        if state.committed {
            return Err(RemoteException::illegal_state(format!("session {} already committed", self.id)).into());
        }
        if state.files.is_empty() {
            return Err(RemoteException::illegal_state(format!("session {} has nothing to commit", self.id)).into());
        }
        state.committed = true;
        info!(session = self.id, files = state.files.len(), "session committed");
        Ok(())
    }

    async fn abandon(&self) -> Result<(), Fault> {
        self.ensure_open()?;
        self.mark_abandoned();
        info!(session = self.id, "session abandoned by its holder");
        Ok(())
    }

    fn is_alive(&self) -> bool {
        !self.abandoned.load(Ordering::Acquire)
    }
}
