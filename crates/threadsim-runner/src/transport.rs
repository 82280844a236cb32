//! Per-node TCP transport: each node gets its own listening port carrying
//! the wire-codec byte stream described in SPEC_FULL §4.1. Grounded on
//! `uart_server.rs`'s one-port-per-entity accept loop, adapted from a raw
//! byte pass-through to decode/encode full [`threadsim_core::event::Event`]
//! records via `threadsim_wire`.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use threadsim_dispatch::DispatchDriver;
use threadsim_wire::FrameBuffer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// One node's TCP endpoint: a fixed port that carries the wire codec's
/// byte stream in both directions.
#[derive(Debug, Clone, Copy)]
pub struct NodeEndpoint {
    pub node: threadsim_core::NodeId,
    pub port: u16,
}

/// Starts a TCP listener for every endpoint, each forwarding decoded
/// events into `driver` via `Dispatcher::ingress` and writing the node's
/// outgoing wire bytes (already encoded by `NodeHandle::send_event`) back
/// out over the same connection.
pub async fn start_listeners(
    driver: Arc<DispatchDriver>,
    endpoints: Vec<NodeEndpoint>,
    outgoing: Vec<(threadsim_core::NodeId, crossbeam_channel::Receiver<Vec<u8>>)>,
) -> io::Result<()> {
    let mut outgoing = outgoing;
    for endpoint in endpoints {
        let addr: SocketAddr = ([0, 0, 0, 0], endpoint.port).into();
        let listener = TcpListener::bind(addr).await?;
        let idx = outgoing
            .iter()
            .position(|(id, _)| *id == endpoint.node)
            .expect("every endpoint has a matching outgoing channel");
        let (_, rx) = outgoing.remove(idx);
        let driver = driver.clone();
        info!(node = %endpoint.node, port = endpoint.port, "listening");
        tokio::spawn(async move {
            if let Err(e) = run_node_listener(listener, endpoint.node, driver, rx).await {
                warn!(node = %endpoint.node, error = %e, "transport listener exited");
            }
        });
    }
    Ok(())
}

async fn run_node_listener(
    listener: TcpListener,
    node: threadsim_core::NodeId,
    driver: Arc<DispatchDriver>,
    outgoing_rx: crossbeam_channel::Receiver<Vec<u8>>,
) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%node, %peer, "child connected");
        let result = serve_connection(stream, node, &driver, &outgoing_rx).await;
        if let Err(e) = result {
            warn!(%node, error = %e, "connection closed with error");
        }
        driver.post_async(move |d| {
            let _ = d.set_node_failed(node, false);
        });
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    node: threadsim_core::NodeId,
    driver: &Arc<DispatchDriver>,
    outgoing_rx: &crossbeam_channel::Receiver<Vec<u8>>,
) -> io::Result<()> {
    let (mut reader, mut writer) = stream.split();
    let mut frame = FrameBuffer::new();
    let mut read_buf = [0u8; 4096];

    loop {
        tokio::select! {
            result = reader.read(&mut read_buf) => {
                match result {
                    Ok(0) => return Ok(()),
                    Ok(n) => {
                        frame.push(&read_buf[..n]);
                        drain_frames(&mut frame, node, driver);
                    }
                    Err(e) => return Err(e),
                }
            }
            bytes = recv_outgoing(outgoing_rx) => {
                match bytes {
                    Some(bytes) => {
                        writer.write_all(&bytes).await?;
                        writer.flush().await?;
                    }
                    None => return Ok(()),
                }
            }
        }
    }
}

/// Bridges the synchronous `crossbeam_channel` outgoing queue into an
/// async-awaitable future via a short blocking poll, since `NodeHandle`'s
/// outgoing side has no async-aware sender.
async fn recv_outgoing(rx: &crossbeam_channel::Receiver<Vec<u8>>) -> Option<Vec<u8>> {
    loop {
        match rx.try_recv() {
            Ok(bytes) => return Some(bytes),
            Err(crossbeam_channel::TryRecvError::Empty) => {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => return None,
        }
    }
}

fn drain_frames(frame: &mut FrameBuffer, node: threadsim_core::NodeId, driver: &Arc<DispatchDriver>) {
    loop {
        match threadsim_wire::decode_event(frame.as_slice(), node) {
            Ok(Some((event, consumed))) => {
                frame.advance(consumed);
                let driver_node = node;
                driver.post_async(move |d| {
                    if let Err(e) = d.ingress(driver_node, event) {
                        warn!(node = %driver_node, error = %e, "ingress rejected");
                    }
                });
            }
            Ok(None) => break,
            Err(e) => {
                warn!(%node, error = %e, "dropping malformed frame, resyncing");
                frame.advance(frame.buffered_len());
                break;
            }
        }
    }
}
