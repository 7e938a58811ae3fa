/// ferrite-sketch Studio
///
/// Draw a digit or a letter in the browser and watch the prediction and the
/// network diagram update while you draw. Served by a synchronous tiny_http
/// server; no JavaScript frameworks required.
///
/// Run with:
///   cargo run --bin studio --release -- [config.json]
/// Then open the address printed in the banner.

mod state;
mod render;
mod routes;
mod handlers;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tiny_http::Server;

use ferrite_sketch::pipeline::{self, LoadOutcome};
use ferrite_sketch::{ModeKey, SketchConfig};

use state::StudioState;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ferrite-sketch.json"));
    let config = match SketchConfig::load_or_init(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let addr = config.addr.clone();
    let server = match Server::http(&addr) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let shared_state = Arc::new(StudioState::new(config));

    println!("╔══════════════════════════════════════════════╗");
    println!("║          ferrite-sketch Studio               ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Open in your browser:                       ║");
    println!("║  http://{:<37}║", addr);
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Tabs: Digits | Letters                      ║");
    println!("╚══════════════════════════════════════════════╝");

    // Models load in the background; the page reports "Model not loaded"
    // for a mode until its load finishes.
    for key in ModeKey::ALL {
        let state = shared_state.clone();
        std::thread::spawn(move || {
            let path = state.config.model_path(key);
            let outcome = pipeline::load_path(state.context(key), &path);
            if outcome != LoadOutcome::Installed {
                log::warn!("{}: {}", key, outcome.status_text(key));
            }
        });
    }

    // One thread per request so a slow prediction in one mode never stalls
    // the other mode or page loads.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    ExitCode::SUCCESS
}
