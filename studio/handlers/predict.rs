use std::io::Cursor;

use serde::Serialize;
use tiny_http::{Request, Response};

use ferrite_sketch::pipeline::{self, Prediction, Report, TickOutcome};
use ferrite_sketch::viz::{self, render_svg, Canvas};
use ferrite_sketch::ModeKey;

use crate::state::SharedState;

#[derive(Serialize)]
struct PredictResponse<'a> {
    mode: ModeKey,
    /// One of `cold`, `busy`, `idle`, `ready`, `error`.
    outcome: &'static str,
    status: String,
    report: Option<&'a Report>,
    svg: String,
}

// ---------------------------------------------------------------------------
// POST /predict/<mode>
// ---------------------------------------------------------------------------

/// Body is the encoded canvas (PNG from `canvas.toBlob`). A request that
/// arrives while this mode is already predicting is answered with `busy`
/// straight away; the page re-sends the latest canvas afterwards.
pub fn handle(request: &mut Request, state: &SharedState, key: ModeKey) -> Response<Cursor<Vec<u8>>> {
    let ctx = state.context(key);
    let body = match crate::routes::read_body(request) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("{}: failed to read canvas upload: {}", key, e);
            return crate::routes::json_response(400, &serde_json::json!({
                "mode": key,
                "outcome": "error",
                "status": format!("Error: {}", e),
            }));
        }
    };

    let outcome = pipeline::tick_bytes(ctx, &body);
    let status = outcome.status_text();
    let (label, report) = match &outcome {
        TickOutcome::Cold => ("cold", None),
        TickOutcome::Busy => ("busy", None),
        TickOutcome::Failed(_) => ("error", None),
        TickOutcome::Done(Prediction::Idle(r)) => ("idle", Some(r)),
        TickOutcome::Done(Prediction::Ready(r)) => ("ready", Some(r)),
    };

    let svg = match report {
        Some(r) => render_svg(&r.layers, &r.activity, Canvas::default()),
        None => {
            let layers = ctx.layers();
            render_svg(&layers, &viz::idle(&layers), Canvas::default())
        }
    };

    crate::routes::json_response(200, &PredictResponse { mode: key, outcome: label, status, report, svg })
}
