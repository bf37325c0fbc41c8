//! `android.content.pm.IPackageInstaller`: session bookkeeping plus the
//! install and uninstall entry points.

use std::sync::Arc;

use transact::Descriptor;
use transact::Field;
use transact::FIRST_CALL_TRANSACTION;
use transact::Method;
use transact::Param;
use transact::StructSchema;
use transact::Type;
use transact::Value;

use crate::dispatch::Args;
use crate::dispatch::Fault;
use crate::dispatch::Returned;
use crate::dispatch::Service;
use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;
use crate::interfaces::THROWS;
use crate::interfaces::installer_session;
use crate::interfaces::installer_session::InstallerSessionProxy;
use crate::interfaces::unknown_method;
use crate::proxy::Proxy;
use crate::registry::Registry;

pub const NAME: &str = "android.content.pm.IPackageInstaller";

pub const TRANSACTION_ABANDON_SESSION: u32 = FIRST_CALL_TRANSACTION;
pub const TRANSACTION_OPEN_SESSION: u32 = FIRST_CALL_TRANSACTION + 1;
pub const TRANSACTION_GET_MY_SESSIONS: u32 = FIRST_CALL_TRANSACTION + 2;
pub const TRANSACTION_UNINSTALL: u32 = FIRST_CALL_TRANSACTION + 3;
pub const TRANSACTION_INSTALL_EXISTING_PACKAGE: u32 = FIRST_CALL_TRANSACTION + 4;

/// Remove the package for every user, not just `userId`.
pub const DELETE_ALL_USERS: i32 = 0x0000_0002;
/// Allow removing an update of a system package.
pub const DELETE_SYSTEM_APP: i32 = 0x0000_0004;

pub const INSTALL_SUCCEEDED: i32 = 1;
pub const INSTALL_FAILED_INVALID_URI: i32 = -3;

const SESSION_INFO: StructSchema = StructSchema {
    name: "SessionInfo",
    fields: &[
        Field { name: "sessionId", ty: Type::Int },
        Field { name: "installerPackageName", ty: Type::String },
        Field { name: "userId", ty: Type::Int },
        Field { name: "sealed", ty: Type::Bool },
        Field { name: "sizeBytes", ty: Type::Long },
    ],
};
const SESSION_INFO_TYPE: Type = Type::Struct(&SESSION_INFO);

pub static DESCRIPTOR: Descriptor = Descriptor {
    name: NAME,
    methods: &[
        Method {
            name: "abandonSession",
            code: TRANSACTION_ABANDON_SESSION,
            params: &[Param { name: "sessionId", ty: Type::Int }],
            result: Type::Void,
            throws: THROWS,
        },
        Method {
            name: "openSession",
            code: TRANSACTION_OPEN_SESSION,
            params: &[Param { name: "sessionId", ty: Type::Int }],
            result: Type::Interface(installer_session::NAME),
            throws: THROWS,
        },
        Method {
            name: "getMySessions",
            code: TRANSACTION_GET_MY_SESSIONS,
            params: &[
                Param { name: "installerPackageName", ty: Type::String },
                Param { name: "userId", ty: Type::Int },
            ],
            result: Type::List(&SESSION_INFO_TYPE),
            throws: THROWS,
        },
        Method {
            name: "uninstall",
            code: TRANSACTION_UNINSTALL,
            params: &[
                Param { name: "packageName", ty: Type::String },
                Param { name: "callerPackageName", ty: Type::String },
                Param { name: "flags", ty: Type::Int },
                Param { name: "userId", ty: Type::Int },
            ],
            result: Type::Void,
            throws: THROWS,
        },
        Method {
            name: "installExistingPackage",
            code: TRANSACTION_INSTALL_EXISTING_PACKAGE,
            params: &[
                Param { name: "packageName", ty: Type::String },
                Param { name: "installFlags", ty: Type::Int },
                Param { name: "installReason", ty: Type::Int },
                Param { name: "userId", ty: Type::Int },
            ],
            result: Type::Int,
            throws: THROWS,
        },
    ],
};

/// Snapshot of one live install session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: i32,
    pub installer_package_name: String,
    pub user_id: i32,
    /// Whether the session has been committed.
    pub sealed: bool,
    pub size_bytes: i64,
}

impl SessionInfo {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            Value::Int(self.session_id),
            Value::String(self.installer_package_name.clone()),
            Value::Int(self.user_id),
            Value::Bool(self.sealed),
            Value::Long(self.size_bytes),
        ])
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let fields = match value {
            Value::Struct(fields) => fields,
            other => return Err(Error::UnexpectedResult(format!("expected SessionInfo, got {}", other.desc()))),
        };

        match <[Value; 5]>::try_from(fields) {
            Ok([
                Value::Int(session_id),
                Value::String(installer_package_name),
                Value::Int(user_id),
                Value::Bool(sealed),
                Value::Long(size_bytes),
            ]) => Ok(Self { session_id, installer_package_name, user_id, sealed, size_bytes }),
            _ => Err(Error::UnexpectedResult("SessionInfo fields do not match its schema".into())),
        }
    }
}

/// Server side of `IPackageInstaller`.
#[async_trait::async_trait]
pub trait PackageInstaller: Send + Sync + 'static {
    async fn abandon_session(&self, session_id: i32) -> std::result::Result<(), Fault>;

    /// The session object. A live session must be returned as the same
    /// object every time.
    async fn open_session(&self, session_id: i32) -> std::result::Result<Arc<dyn Service>, Fault>;

    async fn get_my_sessions(
        &self,
        installer_package_name: String,
        user_id: i32,
    ) -> std::result::Result<Vec<SessionInfo>, Fault>;

    async fn uninstall(
        &self,
        package_name: String,
        caller_package_name: String,
        flags: i32,
        user_id: i32,
    ) -> std::result::Result<(), Fault>;

    async fn install_existing_package(
        &self,
        package_name: String,
        install_flags: i32,
        install_reason: i32,
        user_id: i32,
    ) -> std::result::Result<i32, Fault>;
}

pub struct PackageInstallerStub<T> {
    inner: T,
}

impl<T: PackageInstaller> PackageInstallerStub<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<T: PackageInstaller> Service for PackageInstallerStub<T> {
    fn descriptor(&self) -> &'static Descriptor {
        &DESCRIPTOR
    }

    async fn on_call(&self, method: &'static Method, args: Vec<Value>) -> std::result::Result<Returned, Fault> {
        let mut args = Args::new(method, args);
        match method.code {
            TRANSACTION_ABANDON_SESSION => {
                self.inner.abandon_session(args.int()?).await?;
                Ok(Value::Void.into())
            }
            TRANSACTION_OPEN_SESSION => Ok(Returned::Object(self.inner.open_session(args.int()?).await?)),
            TRANSACTION_GET_MY_SESSIONS => {
                let installer_package_name = args.string()?;
                let user_id = args.int()?;
                let sessions = self.inner.get_my_sessions(installer_package_name, user_id).await?;
                Ok(Value::List(sessions.iter().map(SessionInfo::to_value).collect()).into())
            }
            TRANSACTION_UNINSTALL => {
                let package_name = args.string()?;
                let caller_package_name = args.string()?;
                let flags = args.int()?;
                let user_id = args.int()?;
                self.inner.uninstall(package_name, caller_package_name, flags, user_id).await?;
                Ok(Value::Void.into())
            }
            TRANSACTION_INSTALL_EXISTING_PACKAGE => {
                let package_name = args.string()?;
                let install_flags = args.int()?;
                let install_reason = args.int()?;
                let user_id = args.int()?;
                let status = self
                    .inner
                    .install_existing_package(package_name, install_flags, install_reason, user_id)
                    .await?;
                Ok(Value::Int(status).into())
            }
            _ => Err(unknown_method(method)),
        }
    }
}

/// Client side of `IPackageInstaller`.
#[derive(Clone, Debug)]
pub struct PackageInstallerProxy {
    proxy: Proxy,
}

impl PackageInstallerProxy {
    /// Binds `handle` if it implements `IPackageInstaller`.
    pub async fn as_interface(handle: &Handle) -> Result<Option<Self>> {
        let proxy = Registry::builtin().as_interface(handle, &DESCRIPTOR).await?;
        Ok(proxy.map(|proxy| Self { proxy }))
    }

    pub fn from_proxy(proxy: Proxy) -> Result<Self> {
        if proxy.descriptor().name != NAME {
            return Err(Error::UnexpectedResult(format!("{} is not {}", proxy.descriptor().name, NAME)));
        }
        Ok(Self { proxy })
    }

    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }

    pub async fn abandon_session(&self, session_id: i32) -> Result<()> {
        self.proxy.call(TRANSACTION_ABANDON_SESSION, &[Value::Int(session_id)]).await?.into_void()
    }

    pub async fn open_session(&self, session_id: i32) -> Result<InstallerSessionProxy> {
        let outcome = self.proxy.call(TRANSACTION_OPEN_SESSION, &[Value::Int(session_id)]).await?;
        InstallerSessionProxy::from_proxy(outcome.into_proxy()?)
    }

    pub async fn get_my_sessions(&self, installer_package_name: &str, user_id: i32) -> Result<Vec<SessionInfo>> {
        let args = [Value::String(installer_package_name.to_string()), Value::Int(user_id)];
        match self.proxy.call(TRANSACTION_GET_MY_SESSIONS, &args).await?.into_value()? {
            Value::List(items) => items.into_iter().map(SessionInfo::from_value).collect(),
            other => Err(Error::UnexpectedResult(format!("expected List<SessionInfo>, got {}", other.desc()))),
        }
    }

    pub async fn uninstall(
        &self,
        package_name: &str,
        caller_package_name: &str,
        flags: i32,
        user_id: i32,
    ) -> Result<()> {
        let args = [
            Value::String(package_name.to_string()),
            Value::String(caller_package_name.to_string()),
            Value::Int(flags),
            Value::Int(user_id),
        ];
        self.proxy.call(TRANSACTION_UNINSTALL, &args).await?.into_void()
    }

    pub async fn install_existing_package(
        &self,
        package_name: &str,
        install_flags: i32,
        install_reason: i32,
        user_id: i32,
    ) -> Result<i32> {
        let args = [
            Value::String(package_name.to_string()),
            Value::Int(install_flags),
            Value::Int(install_reason),
            Value::Int(user_id),
        ];
        self.proxy.call(TRANSACTION_INSTALL_EXISTING_PACKAGE, &args).await?.into_int()
    }
}
