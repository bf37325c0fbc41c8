//! # Binder
//!
//! A transactional RPC runtime in the style of Android's binder, carrying the
//! package-manager interfaces.
//!
//! ## Architecture
//!
//! - **Handles**: a caller holds a [`Handle`], an id plus the transport that
//!   reaches the node owning the object. Handles are reference counted across
//!   the boundary.
//! - **Proxies**: a [`Proxy`] binds a handle to an interface descriptor and
//!   turns method calls into exactly one transaction each.
//! - **Nodes**: the serving side keeps an id-indexed table of [`Service`]
//!   objects and hands every transaction to the [`Dispatcher`].
//! - **Transports**: [`LocalTransport`] loops back in-process,
//!   [`ChannelTransport`] runs over tokio channels with a reply pump.
//!
//! Call flow: handle → registry check → proxy → transport → node → dispatcher
//! → service, and back.

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod host;
pub mod interfaces;
pub mod local;
pub mod logging;
pub mod node;
pub mod proxy;
pub mod registry;
pub mod transport;


pub use channel::ChannelTransport;
pub use config::Config;
pub use dispatch::Dispatcher;
pub use dispatch::Fault;
pub use dispatch::Returned;
pub use dispatch::Service;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use handle::Handle;
pub use local::LocalTransport;
pub use node::Node;
pub use proxy::Outcome;
pub use proxy::Proxy;
pub use registry::Registry;
pub use transport::Transport;
pub use transport::TransportError;

pub use transact::ObjectId;
pub use transact::RemoteException;
pub use transact::Value;
