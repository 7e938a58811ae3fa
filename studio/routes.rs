use std::io::{Cursor, Read};

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use ferrite_sketch::ModeKey;

use crate::handlers;
use crate::state::SharedState;

/// Upper bound on canvas and model uploads.
const MAX_BODY: u64 = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn response(status: u16, content_type: &str, bytes: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = bytes.len();
    let headers: Vec<Header> = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .into_iter()
        .collect();
    Response::new(StatusCode(status), headers, Cursor::new(bytes), Some(len), None)
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    response(200, "text/html; charset=utf-8", body.into_bytes())
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> Response<Cursor<Vec<u8>>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => response(status, "application/json", bytes),
        Err(e) => {
            log::error!("failed to serialize response: {}", e);
            response(500, "text/plain", b"500 Internal Server Error".to_vec())
        }
    }
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    response(404, "text/plain", b"404 Not Found".to_vec())
}

pub fn read_body(request: &mut Request) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    request.as_reader().take(MAX_BODY).read_to_end(&mut body)?;
    Ok(body)
}

fn mode(segment: &str) -> Option<ModeKey> {
    segment.parse().ok()
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// `/predict/<mode>` and `/models/<mode>/<action>` carry the mode as a path
/// segment; an unknown mode is a 404.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("").to_owned();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let response = match (method, segments.as_slice()) {
        (Method::Get, [""]) => handlers::page::handle_get(&state),

        (Method::Post, ["predict", m]) => match mode(m) {
            Some(key) => handlers::predict::handle(&mut request, &state, key),
            None => not_found(),
        },
        (Method::Get, ["models", m]) => match mode(m) {
            Some(key) => handlers::models::handle_status(&state, key),
            None => not_found(),
        },
        (Method::Post, ["models", m, "import"]) => match mode(m) {
            Some(key) => handlers::models::handle_import(&mut request, &state, key),
            None => not_found(),
        },
        (Method::Post, ["models", m, "reload"]) => match mode(m) {
            Some(key) => handlers::models::handle_reload(&state, key),
            None => not_found(),
        },

        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        log::debug!("client went away before the response for {}: {}", url, e);
    }
}
