/// Page renderer for the sketch studio.
///
/// The studio serves a single HTML template (`studio/assets/studio.html`)
/// with `{{TOKEN}}` placeholders, loaded at compile time. Mode-specific
/// tokens are filled by the caller; anything left over is blanked.

const TEMPLATE: &str = include_str!("assets/studio.html");

pub fn render_page<F>(fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    blank_remaining(fill(TEMPLATE.to_owned()))
}

/// Replaces any `{{TOKEN}}` that wasn't substituted with an empty string.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        match html[start..].find("}}") {
            Some(end) => html.replace_range(start..start + end + 2, ""),
            None => break,
        }
    }
    html
}

/// Minimal HTML escaping for text interpolated into the template.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
