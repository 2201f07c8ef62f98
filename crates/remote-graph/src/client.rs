//! Typed client for one exposed target.
//!
//! ```ignore
//! let client = RpcClient::<MainWindow>::new("main")?;
//! client.wait_until_exposed(Duration::from_secs(5)).await?;
//!
//! let value = client
//!     .get(|w| w.child(MainWindow::DATA_CONTEXT).cast::<ViewModel>().property(ViewModel::VALUE))
//!     .await?;
//! let sum = client
//!     .invoke(|w| {
//!         w.child(MainWindow::DATA_CONTEXT)
//!             .cast::<ViewModel>()
//!             .call(ViewModel::ADD, (1, 2))
//!     })
//!     .await?;
//! ```

use crate::args::Arg;
use crate::codec::{Codec, TypeName};
use crate::config::{Endpoint, IpcConfig};
use crate::ipc::{Command, RawClient, TargetKey};
use crate::node::encode_args;
use crate::path::{Accessor, Call, Leaf};
use crate::{RemoteError, Result};
use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Client bound to the target `(T, instance_id)`.
pub struct RpcClient<T> {
    target: TargetKey,
    raw: RawClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T: TypeName> RpcClient<T> {
    /// Connect to the well-known endpoint, honouring environment overrides.
    pub fn new(instance_id: impl Into<String>) -> Result<Self> {
        Ok(Self::with_endpoint(&Endpoint::from_env()?, instance_id))
    }

    pub fn with_endpoint(endpoint: &Endpoint, instance_id: impl Into<String>) -> Self {
        Self {
            target: TargetKey::new(T::type_name(), instance_id),
            raw: RawClient::new(endpoint),
            _marker: PhantomData,
        }
    }

    pub fn target(&self) -> &TargetKey {
        &self.target
    }

    /// Read a property somewhere below the target.
    pub async fn get<V: Codec>(
        &self,
        select: impl FnOnce(Accessor<T, T>) -> Leaf<T, V>,
    ) -> Result<V> {
        let path = select(Accessor::root()).path()?;
        let payload = self.raw.call(Command::Get, &self.target, &path, "").await?;
        V::parse(&payload)
    }

    /// Write a property somewhere below the target. The value may be a
    /// literal or a [`Construct`](crate::Construct).
    pub async fn set<V>(
        &self,
        select: impl FnOnce(Accessor<T, T>) -> Leaf<T, V>,
        value: impl Into<Arg<V>>,
    ) -> Result<()> {
        let path = select(Accessor::root()).path()?;
        let payload = value.into().into_node().to_markup();
        self.raw.call(Command::Set, &self.target, &path, &payload).await?;
        Ok(())
    }

    /// Call a method and parse its result.
    pub async fn invoke<R: Codec>(
        &self,
        select: impl FnOnce(Accessor<T, T>) -> Call<T, R>,
    ) -> Result<R> {
        let payload = self.send_call(select(Accessor::root())).await?;
        R::parse(&payload)
    }

    /// Call a method with no result.
    pub async fn invoke_action(
        &self,
        select: impl FnOnce(Accessor<T, T>) -> Call<T, ()>,
    ) -> Result<()> {
        self.send_call(select(Accessor::root())).await?;
        Ok(())
    }

    async fn send_call<R>(&self, call: Call<T, R>) -> Result<String> {
        let path = call.path()?;
        let payload = encode_args(call.args());
        self.raw.call(Command::Invoke, &self.target, &path, &payload).await
    }

    /// Ask the host whether the target is exposed right now.
    pub async fn is_exposed(&self) -> Result<bool> {
        let payload = self.raw.call(Command::WaitFor, &self.target, "", "").await?;
        bool::parse(&payload)
    }

    /// Poll until the target is exposed, backing off between attempts.
    ///
    /// A host that is not running yet counts as "not exposed yet".
    pub async fn wait_until_exposed(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut delay = IpcConfig::WAIT_POLL_INITIAL;

        loop {
            match self.is_exposed().await {
                Ok(true) => return Ok(()),
                Ok(false) => debug!("{} not exposed yet", self.target),
                Err(e) if e.is_transport() => debug!("{} unreachable: {}", self.target, e),
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(RemoteError::Timeout(timeout));
            }

            tokio::time::sleep(delay.min(deadline - now)).await;
            delay = (delay * 2).min(IpcConfig::WAIT_POLL_MAX);
        }
    }
}

impl<T> std::fmt::Debug for RpcClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("target", &self.target)
            .field("addr", &self.raw.addr())
            .finish()
    }
}
