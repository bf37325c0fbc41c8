//! `android.content.pm.IPackageManager`: the entry point of the package
//! service. Hands out the installer and answers package queries.

use std::sync::Arc;

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
use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;
use crate::interfaces::THROWS;
use crate::interfaces::package_installer;
use crate::interfaces::package_installer::PackageInstallerProxy;
use crate::interfaces::unknown_method;
use crate::proxy::Proxy;
use crate::registry::Registry;

pub const NAME: &str = "android.content.pm.IPackageManager";

pub const TRANSACTION_GET_PACKAGE_INSTALLER: u32 = FIRST_CALL_TRANSACTION;
pub const TRANSACTION_IS_PACKAGE_AVAILABLE: u32 = FIRST_CALL_TRANSACTION + 1;
pub const TRANSACTION_GET_ALL_PACKAGES: u32 = FIRST_CALL_TRANSACTION + 2;

pub static DESCRIPTOR: Descriptor = Descriptor {
    name: NAME,
    methods: &[
        Method {
            name: "getPackageInstaller",
            code: TRANSACTION_GET_PACKAGE_INSTALLER,
            params: &[],
            result: Type::Interface(package_installer::NAME),
            throws: THROWS,
        },
        Method {
            name: "isPackageAvailable",
            code: TRANSACTION_IS_PACKAGE_AVAILABLE,
            params: &[
                Param { name: "packageName", ty: Type::String },
                Param { name: "userId", ty: Type::Int },
            ],
            result: Type::Bool,
            throws: THROWS,
        },
        Method {
            name: "getAllPackages",
            code: TRANSACTION_GET_ALL_PACKAGES,
            params: &[],
            result: Type::List(&Type::String),
            throws: THROWS,
        },
    ],
};

/// Server side of `IPackageManager`.
#[async_trait::async_trait]
pub trait PackageManager: Send + Sync + 'static {
    /// The installer object. Must return the same object on every call.
    async fn get_package_installer(&self) -> std::result::Result<Arc<dyn Service>, Fault>;

    async fn is_package_available(&self, package_name: String, user_id: i32) -> std::result::Result<bool, Fault>;

    async fn get_all_packages(&self) -> std::result::Result<Vec<String>, Fault>;
}

pub struct PackageManagerStub<T> {
    inner: T,
}

impl<T: PackageManager> PackageManagerStub<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<T: PackageManager> Service for PackageManagerStub<T> {
    fn descriptor(&self) -> &'static Descriptor {
        &DESCRIPTOR
    }

    async fn on_call(&self, method: &'static Method, args: Vec<Value>) -> std::result::Result<Returned, Fault> {
        let mut args = Args::new(method, args);
        match method.code {
            TRANSACTION_GET_PACKAGE_INSTALLER => Ok(Returned::Object(self.inner.get_package_installer().await?)),
            TRANSACTION_IS_PACKAGE_AVAILABLE => {
                let package_name = args.string()?;
                let user_id = args.int()?;
                let available = self.inner.is_package_available(package_name, user_id).await?;
                Ok(Value::Bool(available).into())
            }
            TRANSACTION_GET_ALL_PACKAGES => {
                let packages = self.inner.get_all_packages().await?;
                Ok(Value::List(packages.into_iter().map(Value::String).collect()).into())
            }
            _ => Err(unknown_method(method)),
        }
    }
}

/// Client side of `IPackageManager`.
#[derive(Clone, Debug)]
pub struct PackageManagerProxy {
    proxy: Proxy,
}

impl PackageManagerProxy {
    /// Binds `handle` if it implements `IPackageManager`.
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

    pub async fn get_package_installer(&self) -> Result<PackageInstallerProxy> {
        let outcome = self.proxy.call(TRANSACTION_GET_PACKAGE_INSTALLER, &[]).await?;
        PackageInstallerProxy::from_proxy(outcome.into_proxy()?)
    }

    pub async fn is_package_available(&self, package_name: &str, user_id: i32) -> Result<bool> {
        let args = [Value::String(package_name.to_string()), Value::Int(user_id)];
        self.proxy.call(TRANSACTION_IS_PACKAGE_AVAILABLE, &args).await?.into_bool()
    }

    pub async fn get_all_packages(&self) -> Result<Vec<String>> {
        self.proxy.call(TRANSACTION_GET_ALL_PACKAGES, &[]).await?.into_strings()
    }
}
