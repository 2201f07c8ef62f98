//! Remote Graph - get, set and invoke members of a live object graph from
//! another process on the same machine.
//!
//! A host process exposes root objects under a `(type, instance id)` key. A
//! client names a member path from that root with typed descriptors, and the
//! host walks the path, reads or writes the leaf property or calls the leaf
//! method, and returns the result as text. Arguments travel as literals or as
//! constructor descriptions the host builds from.
//!
//! # Example
//!
//! ```rust,ignore
//! use remote_graph::{Endpoint, Host, RpcClient};
//!
//! // Host side
//! let host = Host::new(Endpoint::from_env()?)?;
//! host.expose(&window, "main")?;
//!
//! // Client side, in another process
//! let client = RpcClient::<MainWindow>::new("main")?;
//! client.wait_until_exposed(Duration::from_secs(5)).await?;
//! let top: f64 = client.get(|w| w.property(MainWindow::TOP)).await?;
//! client.set(|w| w.property(MainWindow::TOP), top + 10.0).await?;
//! ```

pub mod args;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod ipc;
pub mod node;
pub mod path;
pub mod value;

// Re-export commonly used types
pub use args::{Arg, Construct, IntoArgs};
pub use client::RpcClient;
pub use codec::{AnyObject, Codec, Composite, Scalar, TypeName};
pub use config::{Endpoint, IpcConfig};
pub use error::{RemoteError, Result};
pub use host::{
    shared, Catalog, Constructible, Exposed, Factory, Host, Members, ObjectRef, Shared, Wrappers,
};
pub use ipc::{Envelope, RawClient, TargetKey};
pub use node::{ArgumentNode, Initializer};
pub use path::{compile_path, Accessor, Action, Child, Expr, Method, Property};
pub use value::{ArgList, Dynamic};
