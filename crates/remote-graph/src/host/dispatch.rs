//! Request dispatch: request line in, response envelope out.

use super::catalog::Catalog;
use super::decoder::{decode, decode_all};
use super::registry::{HostedTarget, Registry};
use super::resolver::resolve;
use crate::ipc::{Command, Envelope, IpcDispatch, Request};
use crate::node::{decode_args, ArgumentNode};
use crate::{RemoteError, Result};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, warn};

/// Executes requests against a host's registry and catalog.
#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<Registry>,
    catalog: Arc<RwLock<Catalog>>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<Registry>, catalog: Arc<RwLock<Catalog>>) -> Self {
        Self { registry, catalog }
    }

    /// Handle one raw request line.
    ///
    /// A line with fewer than five fields gets no response at all.
    pub fn handle(&self, line: &str) -> Option<Envelope> {
        match Request::parse(line) {
            Ok(request) => Some(self.execute(&request)),
            Err(e) => {
                warn!("Dropping malformed request: {}", e);
                None
            }
        }
    }

    /// Execute a parsed request. Every failure becomes a failure envelope.
    pub fn execute(&self, request: &Request) -> Envelope {
        debug!("{} {} '{}'", request.command, request.target, request.path);

        if request.command == Command::WaitFor {
            return Envelope::success(self.registry.contains(&request.target).to_string());
        }

        let Some(target) = self.registry.get(&request.target) else {
            return Envelope::failure(request.target.not_exposed().to_string());
        };

        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        let result = match &request.command {
            Command::Get => get(&target, &catalog, &request.path),
            Command::Set => set(&target, &catalog, &request.path, &request.payload),
            Command::Invoke => invoke(&target, &catalog, &request.path, &request.payload),
            Command::WaitFor | Command::Unknown(_) => Err(RemoteError::Protocol {
                message: format!("Unsupported command '{}'", request.command),
            }),
        };

        match result {
            Ok(payload) => Envelope::success(payload),
            Err(e) => {
                debug!("{} {} '{}' failed: {}", request.command, request.target, request.path, e);
                Envelope::failure(e.to_string())
            }
        }
    }
}

fn get(target: &HostedTarget, catalog: &Catalog, path: &str) -> Result<String> {
    let (container, member) = resolve(target, catalog, path)?;
    let table = catalog.members(container.type_name())?;
    let value = target.evaluate(move || table.read(&container, &member))??;
    value.render()
}

fn set(target: &HostedTarget, catalog: &Catalog, path: &str, payload: &str) -> Result<String> {
    let (container, member) = resolve(target, catalog, path)?;
    let value = decode(catalog, &ArgumentNode::from_markup(payload)?)?;
    let table = catalog.members(container.type_name())?;
    target.mutate(move || table.write(&container, &member, value))??;
    Ok(String::new())
}

fn invoke(target: &HostedTarget, catalog: &Catalog, path: &str, payload: &str) -> Result<String> {
    let (container, method) = resolve(target, catalog, path)?;
    let args = decode_all(catalog, &decode_args(payload)?)?;
    let table = catalog.members(container.type_name())?;
    match target.evaluate(move || table.invoke(&container, &method, args))?? {
        Some(result) => result.render(),
        None => Ok(String::new()),
    }
}

#[async_trait::async_trait]
impl IpcDispatch for CommandDispatcher {
    async fn dispatch(&self, request: String) -> Option<String> {
        let dispatcher = self.clone();
        match tokio::task::spawn_blocking(move || dispatcher.handle(&request)).await {
            Ok(envelope) => envelope.map(|envelope| envelope.to_wire()),
            Err(e) => {
                error!("Request handler failed: {}", e);
                Some(Envelope::failure(format!("Request handler failed: {}", e)).to_wire())
            }
        }
    }
}
