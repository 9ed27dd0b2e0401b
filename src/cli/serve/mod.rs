//! Development server with live reload support.
//!
//! Startup order: watcher, initial build, bind, browser, request loop. The
//! watcher is attached before the first build so no edit made while it runs
//! goes unnoticed.

mod build;
mod content;
mod lifecycle;
mod path;
mod response;

pub use build::SiteRebuilder;

use crate::{
    actor::{FsWatcher, collect_watch_roots},
    cli::generate::input_filter,
    config::cfg,
    core::PublishGate,
    embed::serve::PROBE_PATH,
    log,
    logger::{status_detach, status_warning},
    utils::{browser, mime},
};
use anyhow::Result;
use crossbeam::channel;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Threads serving requests.
const REQUEST_THREADS: usize = 4;

/// What a request handler needs, shared by every worker.
struct ServeContext {
    output: PathBuf,
    gate: Arc<PublishGate>,
    log: bool,
    reload: bool,
}

/// Build the site, serve the output root, and rebuild on change until
/// Ctrl+C. Reads the configuration stored by [`init_config`](crate::config::init_config).
pub fn serve_site(inputs: &[String]) -> Result<()> {
    let config = cfg();
    let paths = config.paths();
    let gate = Arc::new(PublishGate::new());

    let watcher = if config.serve.reload {
        match FsWatcher::new(collect_watch_roots(&paths)) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                status_warning(&format!("watching disabled: {e}"));
                status_detach();
                None
            }
        }
    } else {
        None
    };

    let rebuilder = SiteRebuilder::new(
        paths.clone(),
        input_filter(&paths, inputs),
        Arc::clone(&gate),
    );
    rebuilder.build();
    status_detach();

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    let url = format!("http://{addr}/");
    log!("serve"; "{}", url);
    if config.serve.open
        && let Err(e) = browser::open(&url)
    {
        log!("warn"; "could not open browser: {:#}", e);
    }

    let handle = lifecycle::spawn_coordinator(
        watcher,
        config.serve.wait_duration(),
        rebuilder,
        shutdown_rx,
    );

    let ctx = Arc::new(ServeContext {
        output: paths.output,
        gate,
        log: config.serve.log,
        reload: config.serve.reload,
    });
    let result = run_request_loop(&server, ctx);

    lifecycle::wait_for_shutdown(handle);
    result
}

fn run_request_loop(server: &Server, ctx: Arc<ServeContext>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx) {
                crate::debug!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let (path, query) = split_url(request.url());
    if path == PROBE_PATH {
        let since = query_param(query, "since").and_then(|v| v.parse().ok());
        return response::respond_probe(request, since, ctx.gate.generation());
    }

    if !response::is_read_request(&request) {
        log_request(ctx, &request, 405);
        return response::respond_method_not_allowed(request);
    }

    // Resolve and read under the gate so a swap never lands mid-read
    let found = {
        let _guard = ctx.gate.read();
        path::resolve_path(request.url(), &ctx.output).and_then(|file| {
            let body = std::fs::read(&file).ok()?;
            Some((mime::from_path(&file), body, ctx.gate.generation()))
        })
    };

    let Some((content_type, body, generation)) = found else {
        log_request(ctx, &request, 404);
        let generation = ctx.reload.then(|| ctx.gate.generation());
        return response::respond_not_found(request, generation);
    };

    let body = content::maybe_inject_reload(body, content_type, ctx.reload.then_some(generation));
    log_request(ctx, &request, 200);
    response::respond_file(request, content_type, body)
}

fn log_request(ctx: &ServeContext, request: &Request, status: u16) {
    if !ctx.log {
        return;
    }
    log!("serve"; "{} {} {}", request.method(), request.url(), status);
    status_detach();
}

fn split_url(url: &str) -> (&str, &str) {
    url.split_once('?').unwrap_or((url, ""))
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find_map(|(key, value)| (key == name).then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        assert_eq!(split_url("/a/b?x=1"), ("/a/b", "x=1"));
        assert_eq!(split_url("/a"), ("/a", ""));
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("since=4&x=1", "since"), Some("4"));
        assert_eq!(query_param("x=1&since=12", "since"), Some("12"));
        assert_eq!(query_param("since", "since"), None);
        assert_eq!(query_param("", "since"), None);
    }
}
