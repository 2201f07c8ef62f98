//! Local IPC between clients and an exposing host.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::RawClient;
pub use protocol::{Command, Envelope, Request, TargetKey};
pub use server::{IpcDispatch, IpcServer, IpcServerHandle};
