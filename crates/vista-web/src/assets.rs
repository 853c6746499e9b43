//! Embedded icon assets, served as `/assets/logo_<key>.svg`.

use axum::{
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use vista_core::IconKey;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Mask glyph shared by every icon; `{fill}` is the outcome color.
const LOGO_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64" width="64" height="64"><circle cx="32" cy="32" r="30" fill="{fill}"/><path d="M14 24c6-4 12-4 18 0 6-4 12-4 18 0-1 12-8 20-18 22-10-2-17-10-18-22z" fill="#ffffff"/><circle cx="24" cy="29" r="3" fill="{fill}"/><circle cx="40" cy="29" r="3" fill="{fill}"/></svg>"##;

fn fill(icon: IconKey) -> &'static str {
    match icon {
        IconKey::Expected => "#2ead33",
        IconKey::Unexpected => "#d1242f",
        IconKey::Flaky => "#bf8700",
        IconKey::Skipped => "#8c959f",
        IconKey::Default => "#2d4552",
    }
}

/// SVG markup for an icon.
pub fn logo_svg(icon: IconKey) -> String {
    LOGO_TEMPLATE.replace("{fill}", fill(icon))
}

/// Parses an asset file name such as `logo_flaky.svg`.
pub fn icon_from_file_name(file: &str) -> Option<IconKey> {
    file.strip_prefix("logo_")
        .and_then(|rest| rest.strip_suffix(".svg"))
        .and_then(IconKey::from_key)
}

/// Icon asset endpoint
pub async fn icon(Path(file): Path<String>) -> Response {
    match icon_from_file_name(&file) {
        Some(icon) => ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], logo_svg(icon)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
