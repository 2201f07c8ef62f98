//! Exposing side: registers live objects and serves requests against them.
//!
//! A [`Host`] owns everything one process exposes: the target registry, the
//! type catalog, the machine-wide lock and the IPC server. The lock is taken
//! and the server started on the first successful [`Host::expose`]. Both are
//! released when the host is dropped.
//!
//! ```ignore
//! let host = Host::new(Endpoint::from_env()?)?;
//! host.register_factory::<MyParam>()?;
//! host.expose_with(&window, "main", ui_thread_wrappers())?;
//! ```

mod catalog;
mod decoder;
mod dispatch;
mod factory;
mod lock;
mod members;
mod registry;
mod resolver;

pub use catalog::Catalog;
pub use dispatch::CommandDispatcher;
pub use factory::{Constructible, Factory};
pub use lock::MachineLock;
pub use members::{shared, Exposed, Members, ObjectRef, Shared};
pub use registry::{Evaluation, HostedTarget, Mutation, Registry, Wrappers};

use crate::codec::Codec;
use crate::config::Endpoint;
use crate::ipc::{IpcServer, IpcServerHandle, TargetKey};
use crate::{RemoteError, Result};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};
use tokio::runtime::Handle;
use tracing::info;

#[derive(Default)]
struct HostState {
    lock: Option<MachineLock>,
    server: Option<IpcServerHandle>,
}

/// One process's exposed object graph.
pub struct Host {
    endpoint: Endpoint,
    runtime: Handle,
    registry: Arc<Registry>,
    catalog: Arc<RwLock<Catalog>>,
    state: Mutex<HostState>,
}

impl Host {
    /// Create a host that will serve on the current tokio runtime.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| RemoteError::Config {
            message: format!("Host::new must be called within a tokio runtime: {}", e),
        })?;
        Ok(Self::with_runtime(endpoint, runtime))
    }

    /// Create a host that will serve on `runtime`.
    pub fn with_runtime(endpoint: Endpoint, runtime: Handle) -> Self {
        Self {
            endpoint,
            runtime,
            registry: Arc::new(Registry::new()),
            catalog: Arc::new(RwLock::new(Catalog::new())),
            state: Mutex::new(HostState::default()),
        }
    }

    /// Make literals of `V` decodable in SET and INVOKE arguments.
    pub fn register_codec<V: Codec>(&self) -> Result<()> {
        self.write_catalog()?.register_codec::<V>();
        Ok(())
    }

    /// Make `T` constructible from constructor argument nodes.
    pub fn register_factory<T: Constructible>(&self) -> Result<()> {
        self.write_catalog()?.register_factory::<T>();
        Ok(())
    }

    /// Make the members of `T` reachable when an untyped child holds a `T`.
    pub fn register_members<T: Exposed>(&self) -> Result<()> {
        self.write_catalog()?.register_members::<T>();
        Ok(())
    }

    /// Expose `instance` under `instance_id`, with graph access run inline.
    pub fn expose<T: Exposed>(&self, instance: &Shared<T>, instance_id: &str) -> Result<()> {
        self.expose_with(instance, instance_id, Wrappers::inline())
    }

    /// Expose `instance` under `instance_id`, with graph access run through
    /// `wrappers`.
    ///
    /// Fails with `DuplicateRegistration` if the key is already exposed here,
    /// and with `AlreadyHostedElsewhere` if another process holds the
    /// endpoint.
    pub fn expose_with<T: Exposed>(
        &self,
        instance: &Shared<T>,
        instance_id: &str,
        wrappers: Wrappers,
    ) -> Result<()> {
        let key = TargetKey::new(T::type_name(), instance_id);
        if self.registry.contains(&key) {
            return Err(RemoteError::DuplicateRegistration {
                type_identity: key.type_identity,
                instance_id: key.instance_id,
            });
        }

        let mut state = self.lock_state()?;
        if state.lock.is_none() {
            state.lock = Some(MachineLock::acquire(&self.endpoint.lock_path)?);
        }

        self.write_catalog()?.register_members::<T>();

        // Nothing is registered unless the server is listening
        if state.server.is_none() {
            let dispatcher = CommandDispatcher::new(self.registry.clone(), self.catalog.clone());
            let server = IpcServer::bind(self.endpoint.addr, Arc::new(dispatcher), &self.runtime)?;
            state.server = Some(server);
        }

        self.registry
            .insert(HostedTarget::new(key.clone(), ObjectRef::new(instance), wrappers))?;
        info!("Exposed {}", key);

        Ok(())
    }

    pub fn is_exposed(&self, key: &TargetKey) -> bool {
        self.registry.contains(key)
    }

    pub fn exposed(&self) -> Vec<TargetKey> {
        self.registry.keys()
    }

    /// The address the server is bound to, once it is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .server
            .as_ref()
            .map(IpcServerHandle::addr)
    }

    /// The endpoint clients should use: the configured one with the actual
    /// bound port filled in.
    pub fn endpoint(&self) -> Endpoint {
        match self.local_addr() {
            Some(addr) => self.endpoint.with_addr(addr),
            None => self.endpoint.clone(),
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, HostState>> {
        self.state.lock().map_err(|_| RemoteError::Other("Host state lock poisoned".to_string()))
    }

    fn write_catalog(&self) -> Result<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|_| RemoteError::Other("Host catalog lock poisoned".to_string()))
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        // Stop serving before giving up the machine-wide claim
        state.server.take();
        state.lock.take();
    }
}
