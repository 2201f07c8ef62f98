//! Loopback TCP server for an exposing host.
//!
//! Connections are served one at a time: accept, read one request frame,
//! dispatch, write at most one response frame, close. The next connection is
//! accepted only after the previous one is finished.

use super::protocol::{read_text, write_frame};
use crate::{RemoteError, Result};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Handle to a running IPC server. Dropping shuts down the server.
pub struct IpcServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl IpcServerHandle {
    /// Get the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl fmt::Debug for IpcServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpcServerHandle")
            .field("addr", &self.addr)
            .field("running", &self.shutdown_tx.is_some())
            .finish()
    }
}

impl Drop for IpcServerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// Turns one request line into at most one response line.
///
/// Returning `None` closes the connection without a response.
#[async_trait::async_trait]
pub trait IpcDispatch: Send + Sync + 'static {
    async fn dispatch(&self, request: String) -> Option<String>;
}

/// IPC server that listens for client connections.
pub struct IpcServer;

impl IpcServer {
    /// Serve `listener` on `runtime` until the handle is dropped.
    pub fn start<D: IpcDispatch>(
        listener: std::net::TcpListener,
        dispatch: Arc<D>,
        runtime: &Handle,
    ) -> Result<IpcServerHandle> {
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let listener = {
            let _guard = runtime.enter();
            TcpListener::from_std(listener)?
        };

        info!("IPC server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task_handle = runtime.spawn(Self::accept_loop(listener, dispatch, shutdown_rx));

        Ok(IpcServerHandle {
            addr,
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
        })
    }

    /// Bind `addr` and serve it. Port 0 picks a free port.
    pub fn bind<D: IpcDispatch>(
        addr: SocketAddr,
        dispatch: Arc<D>,
        runtime: &Handle,
    ) -> Result<IpcServerHandle> {
        let listener = std::net::TcpListener::bind(addr).map_err(|e| RemoteError::Transport {
            addr: addr.to_string(),
            message: format!("bind failed: {}", e),
        })?;
        Self::start(listener, dispatch, runtime)
    }

    async fn accept_loop<D: IpcDispatch>(
        listener: TcpListener,
        dispatch: Arc<D>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("IPC server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!("IPC connection from {}", peer_addr);
                            if let Err(e) = Self::handle_connection(stream, &*dispatch).await {
                                debug!("IPC connection {} ended: {}", peer_addr, e);
                            }
                        }
                        Err(e) => {
                            error!("IPC accept error: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection<D: IpcDispatch>(mut stream: TcpStream, dispatch: &D) -> Result<()> {
        let (mut reader, mut writer) = stream.split();

        let Some(request) = read_text(&mut reader).await? else {
            return Ok(()); // Peer closed before sending
        };

        if let Some(response) = dispatch.dispatch(request).await {
            write_frame(&mut writer, response.as_bytes()).await?;
        }

        writer.shutdown().await?;
        Ok(())
    }
}
