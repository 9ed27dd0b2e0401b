//! HTTP response handlers.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::content::maybe_inject_reload;
use crate::utils::mime::types::{HTML, JSON, PLAIN};

const NOT_FOUND_HTML: &str =
    "<!doctype html>\n<html><head><title>404 Not Found</title></head>\n<body><h1>404 Not Found</h1></body></html>\n";

/// Respond with file content already read from disk.
pub fn respond_file(request: Request, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }
    send_body(request, 200, content_type, body)
}

/// Respond to the reload probe.
pub fn respond_probe(request: Request, since: Option<u64>, generation: u64) -> Result<()> {
    let reload = since.is_some_and(|since| since < generation);
    let body = serde_json::json!({ "reload": reload, "generation": generation });
    send_body(request, 200, JSON, body.to_string().into_bytes())
}

/// Respond with 404. With live reload on, the page keeps polling so it
/// recovers once a build produces the missing file.
pub fn respond_not_found(request: Request, generation: Option<u64>) -> Result<()> {
    let (content_type, body) = not_found_body(generation);
    if is_head_request(&request) {
        return send_head(request, 404, content_type);
    }
    send_body(request, 404, content_type, body)
}

fn not_found_body(generation: Option<u64>) -> (&'static str, Vec<u8>) {
    match generation {
        Some(_) => {
            let page = NOT_FOUND_HTML.as_bytes().to_vec();
            (HTML, maybe_inject_reload(page, HTML, generation))
        }
        None => (PLAIN, b"404 Not Found".to_vec()),
    }
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(request, 405, PLAIN, b"405 Method Not Allowed".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

pub fn is_read_request(request: &Request) -> bool {
    matches!(request.method(), Method::Get | Method::Head)
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = with_headers(Response::empty(StatusCode(status)), content_type);
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = with_headers(
        Response::from_data(body).with_status_code(StatusCode(status)),
        content_type,
    );
    request.respond(response)?;
    Ok(())
}

/// Content type plus `Cache-Control: no-store` on every response.
fn with_headers<R: std::io::Read>(
    mut response: Response<R>,
    content_type: &'static str,
) -> Response<R> {
    for (key, value) in [("Content-Type", content_type), ("Cache-Control", "no-store")] {
        if let Ok(header) = Header::from_bytes(key, value) {
            response = response.with_header(header);
        }
    }
    response
}
