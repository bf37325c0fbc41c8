//! `android.permission.IPermissionManager`: runtime permission grants.

use transact::Descriptor;
use transact::FIRST_CALL_TRANSACTION;
use transact::Method;
use transact::Param;
use transact::Type;
use transact::Value;

use crate::dispatch::Args;
use crate::dispatch::Fault;
use crate::dispatch::Returned;
use crate::dispatch::Service;
use crate::error::Result;
use crate::handle::Handle;
use crate::interfaces::THROWS;
use crate::interfaces::unknown_method;
use crate::proxy::Proxy;
use crate::registry::Registry;

pub const NAME: &str = "android.permission.IPermissionManager";

pub const TRANSACTION_GRANT_RUNTIME_PERMISSION: u32 = FIRST_CALL_TRANSACTION;
pub const TRANSACTION_REVOKE_RUNTIME_PERMISSION: u32 = FIRST_CALL_TRANSACTION + 1;
pub const TRANSACTION_CHECK_PERMISSION: u32 = FIRST_CALL_TRANSACTION + 2;

pub const PERMISSION_GRANTED: i32 = 0;
pub const PERMISSION_DENIED: i32 = -1;

pub static DESCRIPTOR: Descriptor = Descriptor {
    name: NAME,
    methods: &[
        Method {
            name: "grantRuntimePermission",
            code: TRANSACTION_GRANT_RUNTIME_PERMISSION,
            params: &[
                Param { name: "packageName", ty: Type::String },
                Param { name: "permissionName", ty: Type::String },
                Param { name: "userId", ty: Type::Int },
            ],
            result: Type::Void,
            throws: THROWS,
        },
        Method {
            name: "revokeRuntimePermission",
            code: TRANSACTION_REVOKE_RUNTIME_PERMISSION,
            params: &[
                Param { name: "packageName", ty: Type::String },
                Param { name: "permissionName", ty: Type::String },
                Param { name: "userId", ty: Type::Int },
                Param { name: "reason", ty: Type::String },
            ],
            result: Type::Void,
            throws: THROWS,
        },
        Method {
            name: "checkPermission",
            code: TRANSACTION_CHECK_PERMISSION,
            params: &[
                Param { name: "permissionName", ty: Type::String },
                Param { name: "packageName", ty: Type::String },
                Param { name: "userId", ty: Type::Int },
            ],
            result: Type::Int,
            throws: THROWS,
        },
    ],
};

#[async_trait::async_trait]
pub trait PermissionManager: Send + Sync + 'static {
    async fn grant_runtime_permission(
        &self,
        package_name: String,
        permission_name: String,
        user_id: i32,
    ) -> std::result::Result<(), Fault>;

    async fn revoke_runtime_permission(
        &self,
        package_name: String,
        permission_name: String,
        user_id: i32,
        reason: String,
    ) -> std::result::Result<(), Fault>;

    /// `PERMISSION_GRANTED` or `PERMISSION_DENIED`.
    async fn check_permission(
        &self,
        permission_name: String,
        package_name: String,
        user_id: i32,
    ) -> std::result::Result<i32, Fault>;
}

pub struct PermissionManagerStub<T> {
    inner: T,
}

impl<T: PermissionManager> PermissionManagerStub<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<T: PermissionManager> Service for PermissionManagerStub<T> {
    fn descriptor(&self) -> &'static Descriptor {
        &DESCRIPTOR
    }

    async fn on_call(&self, method: &'static Method, args: Vec<Value>) -> std::result::Result<Returned, Fault> {
        let mut args = Args::new(method, args);
        match method.code {
            TRANSACTION_GRANT_RUNTIME_PERMISSION => {
                let package_name = args.string()?;
                let permission_name = args.string()?;
                let user_id = args.int()?;
                self.inner.grant_runtime_permission(package_name, permission_name, user_id).await?;
                Ok(Value::Void.into())
            }
            TRANSACTION_REVOKE_RUNTIME_PERMISSION => {
                let package_name = args.string()?;
                let permission_name = args.string()?;
                let user_id = args.int()?;
                let reason = args.string()?;
                self.inner.revoke_runtime_permission(package_name, permission_name, user_id, reason).await?;
                Ok(Value::Void.into())
            }
            TRANSACTION_CHECK_PERMISSION => {
                let permission_name = args.string()?;
                let package_name = args.string()?;
                let user_id = args.int()?;
                let result = self.inner.check_permission(permission_name, package_name, user_id).await?;
                Ok(Value::Int(result).into())
            }
            _ => Err(unknown_method(method)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PermissionManagerProxy {
    proxy: Proxy,
}

impl PermissionManagerProxy {
    /// Binds `handle` if it implements `IPermissionManager`.
    pub async fn as_interface(handle: &Handle) -> Result<Option<Self>> {
        let proxy = Registry::builtin().as_interface(handle, &DESCRIPTOR).await?;
        Ok(proxy.map(|proxy| Self { proxy }))
    }

    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }

    pub async fn grant_runtime_permission(&self, package_name: &str, permission_name: &str, user_id: i32) -> Result<()> {
        let args = [
            Value::String(package_name.to_string()),
            Value::String(permission_name.to_string()),
            Value::Int(user_id),
        ];
        self.proxy.call(TRANSACTION_GRANT_RUNTIME_PERMISSION, &args).await?.into_void()
    }

    pub async fn revoke_runtime_permission(
        &self,
        package_name: &str,
        permission_name: &str,
        user_id: i32,
        reason: &str,
    ) -> Result<()> {
        let args = [
            Value::String(package_name.to_string()),
            Value::String(permission_name.to_string()),
            Value::Int(user_id),
            Value::String(reason.to_string()),
        ];
        self.proxy.call(TRANSACTION_REVOKE_RUNTIME_PERMISSION, &args).await?.into_void()
    }

    pub async fn check_permission(&self, permission_name: &str, package_name: &str, user_id: i32) -> Result<i32> {
        let args = [
            Value::String(permission_name.to_string()),
            Value::String(package_name.to_string()),
            Value::Int(user_id),
        ];
        self.proxy.call(TRANSACTION_CHECK_PERMISSION, &args).await?.into_int()
    }
}
