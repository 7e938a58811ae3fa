use std::io::Cursor;

use serde::Serialize;
use tiny_http::{Request, Response};

use ferrite_sketch::pipeline::{self, LoadOutcome};
use ferrite_sketch::viz::LayerSpec;
use ferrite_sketch::ModeKey;

use crate::state::SharedState;

#[derive(Serialize)]
struct ModelStatus {
    mode: ModeKey,
    ready: bool,
    status: String,
    layers: Vec<LayerSpec>,
    labels: Vec<String>,
}

fn status_response(state: &SharedState, key: ModeKey, outcome: Option<LoadOutcome>) -> Response<Cursor<Vec<u8>>> {
    let ctx = state.context(key);
    let status = match &outcome {
        Some(o) => o.status_text(key),
        None if ctx.is_ready() => format!("{} model ready", key),
        None => "Model not loaded".to_string(),
    };
    let code = match outcome {
        Some(LoadOutcome::Failed(_)) => 422,
        _ => 200,
    };
    crate::routes::json_response(code, &ModelStatus {
        mode: key,
        ready: ctx.is_ready(),
        status,
        layers: ctx.layers(),
        labels: ctx.config().labels(),
    })
}

/// `GET /models/<mode>`
pub fn handle_status(state: &SharedState, key: ModeKey) -> Response<Cursor<Vec<u8>>> {
    status_response(state, key, None)
}

// ---------------------------------------------------------------------------
// POST /models/<mode>/import
// ---------------------------------------------------------------------------

/// Installs an uploaded dense model JSON. The file on disk is left alone;
/// a reload brings the configured model back.
pub fn handle_import(request: &mut Request, state: &SharedState, key: ModeKey) -> Response<Cursor<Vec<u8>>> {
    let outcome = match crate::routes::read_body(request) {
        Ok(body) if body.is_empty() => LoadOutcome::Failed("no model file was uploaded".into()),
        Ok(body) => pipeline::load_bytes(state.context(key), &body),
        Err(e) => LoadOutcome::Failed(format!("failed to read upload: {}", e)),
    };
    status_response(state, key, Some(outcome))
}

// ---------------------------------------------------------------------------
// POST /models/<mode>/reload
// ---------------------------------------------------------------------------

pub fn handle_reload(state: &SharedState, key: ModeKey) -> Response<Cursor<Vec<u8>>> {
    let path = state.config.model_path(key);
    log::info!("{}: reloading {}", key, path.display());
    let outcome = pipeline::load_path(state.context(key), &path);
    status_response(state, key, Some(outcome))
}
