//! Wire format for remote-graph IPC.
//!
//! Each connection carries exactly one request frame and at most one response
//! frame. A frame is a 4-byte big-endian length prefix followed by UTF-8 text:
//!
//! ```text
//! [u32 BE: len][UTF-8 bytes of len]
//!
//! request:  COMMAND|TypeIdentity|InstanceId|Member.Path|payload
//! response: true|payload   or   false|error text
//! ```
//!
//! The request payload is everything after the fourth `|`, and the response
//! payload everything after the first, so both may contain `|` themselves.

use crate::config::IpcConfig;
use crate::{RemoteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Address of an exposed target: its type identity plus an instance id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetKey {
    pub type_identity: String,
    pub instance_id: String,
}

impl TargetKey {
    pub fn new(type_identity: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            type_identity: type_identity.into(),
            instance_id: instance_id.into(),
        }
    }

    pub fn not_exposed(&self) -> RemoteError {
        RemoteError::NotExposed {
            type_identity: self.type_identity.clone(),
            instance_id: self.instance_id.clone(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.type_identity, self.instance_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Get,
    Set,
    Invoke,
    WaitFor,
    /// Anything else. Answered with a failure envelope.
    Unknown(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Command::Get => "GET",
            Command::Set => "SET",
            Command::Invoke => "INVOKE",
            Command::WaitFor => "WAITFOR",
            Command::Unknown(other) => other,
        }
    }

    pub fn parse(text: &str) -> Self {
        match text {
            "GET" => Command::Get,
            "SET" => Command::Set,
            "INVOKE" => Command::Invoke,
            "WAITFOR" => Command::WaitFor,
            other => Command::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    pub target: TargetKey,
    pub path: String,
    pub payload: String,
}

impl Request {
    pub fn new(
        command: Command,
        target: TargetKey,
        path: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            command,
            target,
            path: path.into(),
            payload: payload.into(),
        }
    }

    pub fn to_wire(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.command,
            self.target.type_identity,
            self.target.instance_id,
            self.path,
            self.payload
        )
    }

    /// Split a request line into its five fields.
    ///
    /// Fewer than five fields is a protocol error; an unrecognised command is
    /// not.
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.splitn(5, '|').collect();
        let [command, type_identity, instance_id, path, payload] = fields[..] else {
            return Err(RemoteError::Protocol {
                message: format!("Expected 5 request fields, found {}", fields.len()),
            });
        };

        Ok(Self {
            command: Command::parse(command),
            target: TargetKey::new(type_identity, instance_id),
            path: path.to_string(),
            payload: payload.to_string(),
        })
    }
}

/// Response to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub payload: String,
}

impl Envelope {
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: payload.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: message.into(),
        }
    }

    pub fn to_wire(&self) -> String {
        format!("{}|{}", self.success, self.payload)
    }

    pub fn parse(line: &str) -> Result<Self> {
        let (flag, payload) = line.split_once('|').ok_or_else(|| RemoteError::Protocol {
            message: format!("Response has no status field: '{}'", line),
        })?;

        let success = match flag {
            "true" | "True" => true,
            "false" | "False" => false,
            other => {
                return Err(RemoteError::Protocol {
                    message: format!("Invalid response status '{}'", other),
                })
            }
        };

        Ok(Self {
            success,
            payload: payload.to_string(),
        })
    }

    /// The payload on success; the host's error text as `OperationFailed` otherwise.
    pub fn into_result(self) -> Result<String> {
        if self.success {
            Ok(self.payload)
        } else {
            Err(RemoteError::OperationFailed(self.payload))
        }
    }
}

/// Read a length-prefixed frame from an async reader.
///
/// Returns `None` on clean EOF (peer closed connection).
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;

    if len > IpcConfig::MAX_MESSAGE_SIZE {
        return Err(RemoteError::Protocol {
            message: format!(
                "IPC message size {} exceeds maximum {}",
                len,
                IpcConfig::MAX_MESSAGE_SIZE
            ),
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(payload))
}

/// Write a length-prefixed frame to an async writer.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > IpcConfig::MAX_MESSAGE_SIZE {
        return Err(RemoteError::Protocol {
            message: format!(
                "IPC message size {} exceeds maximum {}",
                payload.len(),
                IpcConfig::MAX_MESSAGE_SIZE
            ),
        });
    }

    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and decode it as UTF-8 text.
pub async fn read_text<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Option<String>> {
    match read_frame(reader).await? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| RemoteError::Protocol {
                message: "Invalid UTF-8 in IPC frame".to_string(),
            }),
        None => Ok(None),
    }
}
