//! `android.content.pm.IPackageInstallerSession`: one staged install.
//!
//! A session collects named blobs, is sealed by `commit` and dies on
//! `abandon`. Each session is its own remote object, independent of the
//! installer handle that produced it.

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
use crate::interfaces::unknown_method;
use crate::proxy::Proxy;
use crate::registry::Registry;

pub const NAME: &str = "android.content.pm.IPackageInstallerSession";

pub const TRANSACTION_WRITE: u32 = FIRST_CALL_TRANSACTION;
pub const TRANSACTION_GET_NAMES: u32 = FIRST_CALL_TRANSACTION + 1;
pub const TRANSACTION_COMMIT: u32 = FIRST_CALL_TRANSACTION + 2;
pub const TRANSACTION_ABANDON: u32 = FIRST_CALL_TRANSACTION + 3;

pub static DESCRIPTOR: Descriptor = Descriptor {
    name: NAME,
    methods: &[
        Method {
            name: "write",
            code: TRANSACTION_WRITE,
            params: &[
                Param { name: "name", ty: Type::String },
                Param { name: "data", ty: Type::Bytes },
            ],
            result: Type::Void,
            throws: THROWS,
        },
        Method {
            name: "getNames",
            code: TRANSACTION_GET_NAMES,
            params: &[],
            result: Type::List(&Type::String),
            throws: THROWS,
        },
        Method { name: "commit", code: TRANSACTION_COMMIT, params: &[], result: Type::Void, throws: THROWS },
        Method { name: "abandon", code: TRANSACTION_ABANDON, params: &[], result: Type::Void, throws: THROWS },
    ],
};

/// Server side of `IPackageInstallerSession`.
#[async_trait::async_trait]
pub trait InstallerSession: Send + Sync + 'static {
    async fn write(&self, name: String, data: Vec<u8>) -> std::result::Result<(), Fault>;

    async fn get_names(&self) -> std::result::Result<Vec<String>, Fault>;

    async fn commit(&self) -> std::result::Result<(), Fault>;

    async fn abandon(&self) -> std::result::Result<(), Fault>;

    /// False once the session has been abandoned.
    fn is_alive(&self) -> bool {
        true
    }
}

pub struct InstallerSessionStub<T> {
    inner: T,
}

impl<T: InstallerSession> InstallerSessionStub<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<T: InstallerSession> Service for InstallerSessionStub<T> {
    fn descriptor(&self) -> &'static Descriptor {
        &DESCRIPTOR
    }

    async fn on_call(&self, method: &'static Method, args: Vec<Value>) -> std::result::Result<Returned, Fault> {
        let mut args = Args::new(method, args);
        match method.code {
            TRANSACTION_WRITE => {
                let name = args.string()?;
                let data = args.bytes()?;
                self.inner.write(name, data).await?;
                Ok(Value::Void.into())
            }
            TRANSACTION_GET_NAMES => {
                let names = self.inner.get_names().await?;
                Ok(Value::List(names.into_iter().map(Value::String).collect()).into())
            }
            TRANSACTION_COMMIT => {
                self.inner.commit().await?;
                Ok(Value::Void.into())
            }
            TRANSACTION_ABANDON => {
                self.inner.abandon().await?;
                Ok(Value::Void.into())
            }
            _ => Err(unknown_method(method)),
        }
    }

    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }
}

/// Client side of `IPackageInstallerSession`.
#[derive(Clone, Debug)]
pub struct InstallerSessionProxy {
    proxy: Proxy,
}

impl InstallerSessionProxy {
    /// Binds `handle` if it implements `IPackageInstallerSession`.
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

    pub fn handle(&self) -> &Handle {
        self.proxy.handle()
    }

    pub async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let args = [Value::String(name.to_string()), Value::Bytes(data.to_vec())];
        self.proxy.call(TRANSACTION_WRITE, &args).await?.into_void()
    }

    pub async fn get_names(&self) -> Result<Vec<String>> {
        self.proxy.call(TRANSACTION_GET_NAMES, &[]).await?.into_strings()
    }

    pub async fn commit(&self) -> Result<()> {
        self.proxy.call(TRANSACTION_COMMIT, &[]).await?.into_void()
    }

    pub async fn abandon(&self) -> Result<()> {
        self.proxy.call(TRANSACTION_ABANDON, &[]).await?.into_void()
    }
}
