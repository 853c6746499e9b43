//! HTML shell hosting the viewer.
//!
//! The document title and favicon come from the page identity of the bound
//! test; everything else is fetched by the page from `/api/view`.

use crate::AppState;
use axum::{extract::State, response::Html};
use vista_core::PageIdentity;

/// Escapes text for use in HTML content and double-quoted attributes.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn render_shell(page: &PageIdentity) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="icon" href="{icon}" type="image/svg+xml">
</head>
<body>
<div id="root" data-view="/api/view"></div>
</body>
</html>
"#,
        title = escape_html(&page.title),
        icon = escape_html(&page.icon_href),
    )
}

/// Root document
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_shell(&PageIdentity::derive(state.test.as_deref())))
}
