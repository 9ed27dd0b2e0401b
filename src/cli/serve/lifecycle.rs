//! Server lifecycle management.

use crate::{
    actor::{Coordinator, FsWatcher},
    core::register_server,
    log,
};
use anyhow::{Result, bail};
use crossbeam::channel::{Receiver, Sender};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

use super::build::SiteRebuilder;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
    bail!(
        "failed to bind after {} attempts from port {}: {}",
        MAX_PORT_RETRIES,
        base_port,
        reason
    )
}

/// Register server for graceful shutdown.
///
/// Ctrl+C then unblocks the request loop and signals the coordinator.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Run the watch/rebuild loop on its own thread with a small tokio runtime.
pub fn spawn_coordinator(
    watcher: Option<FsWatcher>,
    wait: Duration,
    rebuilder: SiteRebuilder,
    shutdown_rx: Receiver<()>,
) -> Option<JoinHandle<()>> {
    let watcher = watcher?;

    Some(thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log!("error"; "failed to start watcher runtime: {}", e);
                return;
            }
        };

        rt.block_on(async {
            let coordinator = Coordinator::new(wait, rebuilder).with_shutdown_signal(shutdown_rx);
            if let Err(e) = coordinator.run(watcher).await {
                log!("watch"; "error: {}", e);
            }
        });
    }))
}

/// Wait for the coordinator to stop (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
