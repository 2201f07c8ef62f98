//! Untyped IPC client.
//!
//! Every call opens a fresh connection to the host, sends one request frame,
//! reads one response frame and closes. Failures before a response arrives are
//! reported as [`RemoteError::Transport`].

use super::protocol::{read_text, write_frame, Command, Envelope, Request, TargetKey};
use crate::config::{Endpoint, IpcConfig};
use crate::{RemoteError, Result};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tracing::debug;

/// Sends raw requests to a host.
#[derive(Debug, Clone)]
pub struct RawClient {
    addr: SocketAddr,
}

impl RawClient {
    pub fn new(endpoint: &Endpoint) -> Self {
        Self { addr: endpoint.addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send one request line and return the raw response line.
    pub async fn exchange(&self, line: &str) -> Result<String> {
        let connect = TcpStream::connect(self.addr);
        let mut stream = tokio::time::timeout(IpcConfig::CONNECT_TIMEOUT, connect)
            .await
            .map_err(|_| RemoteError::Timeout(IpcConfig::CONNECT_TIMEOUT))?
            .map_err(|e| self.transport(format!("connect failed: {}", e)))?;

        let (mut reader, mut writer) = stream.split();

        write_frame(&mut writer, line.as_bytes())
            .await
            .map_err(|e| self.transport(format!("send failed: {}", e)))?;

        match read_text(&mut reader).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => {
                Err(self.transport("host closed the connection without a response".to_string()))
            }
            Err(e) => Err(self.transport(format!("receive failed: {}", e))),
        }
    }

    /// Send a request and parse the response envelope.
    pub async fn execute(&self, request: &Request) -> Result<Envelope> {
        debug!("{} {} {}", request.command, request.target, request.path);
        let response = self.exchange(&request.to_wire()).await?;
        Envelope::parse(&response)
    }

    /// Send a request and unwrap the envelope into its payload.
    pub async fn call(
        &self,
        command: Command,
        target: &TargetKey,
        path: &str,
        payload: &str,
    ) -> Result<String> {
        let request = Request::new(command, target.clone(), path, payload);
        self.execute(&request).await?.into_result()
    }

    fn transport(&self, message: String) -> RemoteError {
        RemoteError::Transport {
            addr: self.addr.to_string(),
            message,
        }
    }
}
