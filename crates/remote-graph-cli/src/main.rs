//! rgraph - demo host and raw command-line client for remote-graph.
//!
//! `rgraph host` exposes the demo window graph until interrupted. The other
//! subcommands send one raw request to whichever host holds the endpoint and
//! print the result.

mod demo;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use remote_graph::ipc::{Command as WireCommand, Request};
use remote_graph::node::encode_args;
use remote_graph::{ArgumentNode, Endpoint, Envelope, Host, IpcConfig, RawClient, TargetKey};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rgraph")]
#[command(about = "Get, set and invoke members of an exposed object graph")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Print the response envelope as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expose the demo window and serve until Ctrl-C
    Host {
        #[arg(long, default_value = "main")]
        instance_id: String,
    },
    /// Read a property
    Get {
        #[command(flatten)]
        target: Target,
        path: String,
    },
    /// Write a property from TYPE=LITERAL
    Set {
        #[command(flatten)]
        target: Target,
        path: String,
        value: String,
    },
    /// Call a method with TYPE=LITERAL arguments
    Invoke {
        #[command(flatten)]
        target: Target,
        path: String,
        args: Vec<String>,
    },
    /// Wait until a target is exposed
    Wait {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },
}

#[derive(ClapArgs, Debug)]
struct Target {
    /// Type identity of the exposed root
    #[arg(long = "type", default_value = "demo::MainWindow")]
    type_identity: String,

    /// Instance id of the exposed root
    #[arg(long = "id", default_value = "main")]
    instance_id: String,
}

impl Target {
    fn key(&self) -> TargetKey {
        TargetKey::new(&self.type_identity, &self.instance_id)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let endpoint = Endpoint::from_env()?;
    debug!("Using endpoint {} at {}", endpoint.name, endpoint.addr);

    match args.command {
        Command::Host { instance_id } => run_host(endpoint, &instance_id).await,
        Command::Get { target, path } => {
            let request = Request::new(WireCommand::Get, target.key(), path, "");
            report(send(&endpoint, &request).await?, args.json)
        }
        Command::Set { target, path, value } => {
            let payload = parse_value(&value)?.to_markup();
            let request = Request::new(WireCommand::Set, target.key(), path, payload);
            report(send(&endpoint, &request).await?, args.json)
        }
        Command::Invoke { target, path, args: values } => {
            let nodes = values.iter().map(|v| parse_value(v)).collect::<Result<Vec<_>>>()?;
            let payload = encode_args(&nodes);
            let request = Request::new(WireCommand::Invoke, target.key(), path, payload);
            report(send(&endpoint, &request).await?, args.json)
        }
        Command::Wait { target, timeout_ms } => {
            let envelope = wait(&endpoint, target.key(), Duration::from_millis(timeout_ms)).await?;
            report(envelope, args.json)
        }
    }
}

async fn run_host(endpoint: Endpoint, instance_id: &str) -> Result<()> {
    info!("Starting remote-graph demo host");

    let host = Host::new(endpoint)?;
    demo::register(&host)?;

    let ui = demo::UiThread::spawn()?;
    host.expose_with(&demo::main_window(), instance_id, ui.wrappers())
        .context("Failed to expose demo window")?;

    let addr = host.local_addr().context("Server did not start")?;

    // Print the address for scripts driving the demo (intentional stdout)
    println!("RGRAPH_ADDR={}", addr);

    info!("Serving {:?} on {}", host.exposed(), addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}

async fn send(endpoint: &Endpoint, request: &Request) -> Result<Envelope> {
    let client = RawClient::new(endpoint);
    let envelope = client
        .execute(request)
        .await
        .with_context(|| format!("No response from host at {}", endpoint.addr))?;
    Ok(envelope)
}

/// Poll WAITFOR until it answers `true` or `timeout` passes.
async fn wait(endpoint: &Endpoint, target: TargetKey, timeout: Duration) -> Result<Envelope> {
    let client = RawClient::new(endpoint);
    let request = Request::new(WireCommand::WaitFor, target, "", "");
    let deadline = Instant::now() + timeout;
    let mut delay = IpcConfig::WAIT_POLL_INITIAL;

    loop {
        match client.execute(&request).await {
            Ok(envelope) if envelope.success && envelope.payload == "true" => return Ok(envelope),
            Ok(envelope) => debug!("Not exposed yet: {}", envelope.payload),
            Err(e) if e.is_transport() => debug!("Host unreachable: {}", e),
            Err(e) => return Err(e.into()),
        }

        let now = Instant::now();
        if now >= deadline {
            bail!("{} was not exposed within {:?}", request.target, timeout);
        }
        tokio::time::sleep(delay.min(deadline - now)).await;
        delay = (delay * 2).min(IpcConfig::WAIT_POLL_MAX);
    }
}

fn report(envelope: Envelope, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    if !envelope.success {
        bail!("Operation failed. Detail: {}", envelope.payload);
    }
    if !envelope.payload.is_empty() {
        println!("{}", envelope.payload);
    }
    Ok(())
}

/// Parse a `TYPE=LITERAL` command-line value into a value node.
fn parse_value(text: &str) -> Result<ArgumentNode> {
    let Some((type_name, literal)) = text.split_once('=') else {
        bail!("Expected TYPE=LITERAL, got '{}'", text);
    };
    if type_name.trim().is_empty() {
        bail!("Missing type name in '{}'", text);
    }
    Ok(ArgumentNode::Value {
        type_name: type_name.trim().to_string(),
        literal: literal.to_string(),
    })
}
