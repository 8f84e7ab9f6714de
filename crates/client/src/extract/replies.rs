//! Reply list rendering.

use serde::Serialize;

use super::html::escape_text;

/// One reply of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub author: String,
    pub body_html: String,
    pub like_count: u32,
}

/// Render replies as an HTML fragment headed `Replies (N)`.
///
/// Replies with a blank body are dropped and `N` counts only the rest.
/// Document order is kept. Returns `None` when nothing is left.
pub fn format_replies(replies: &[Reply]) -> Option<String> {
    let kept: Vec<&Reply> = replies.iter().filter(|r| !r.body_html.trim().is_empty()).collect();
    if kept.is_empty() {
        return None;
    }

    let blocks: Vec<String> = kept
        .iter()
        .enumerate()
        .map(|(i, reply)| {
            let badge = if reply.like_count > 0 { format!(" <strong>❤️ {}</strong>", reply.like_count) } else { String::new() };
            format!(
                "<h3>#{} {}{}</h3>\n<div>{}</div>",
                i + 1,
                escape_text(&reply.author),
                badge,
                reply.body_html.trim()
            )
        })
        .collect();

    Some(format!("<h2>Replies ({})</h2>\n{}", kept.len(), blocks.join("\n<hr>\n")))
}
