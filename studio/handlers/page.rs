use std::io::Cursor;

use tiny_http::Response;

use ferrite_sketch::ModeKey;

use crate::render::{html_escape, render_page};
use crate::state::SharedState;

/// `GET /`
pub fn handle_get(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let status = |key: ModeKey| {
        if state.context(key).is_ready() {
            format!("{} model ready", key)
        } else {
            "Model not loaded".to_string()
        }
    };
    let page = render_page(|tmpl| {
        tmpl.replace("{{CANVAS_SIZE}}", &state.config.canvas_size.to_string())
            .replace("{{DIGIT_STATUS}}", &html_escape(&status(ModeKey::Digit)))
            .replace("{{LETTER_STATUS}}", &html_escape(&status(ModeKey::Letter)))
    });
    crate::routes::html_response(page)
}
