//! Attachments captured during a test attempt.
//!
//! An attachment carries exactly one content source: inline bytes or a
//! reference to a file held outside the report. In JSON, inline text is
//! written as `body`, other inline bytes as `bodyBase64`, and file
//! references as `path`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const TEXT_PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";

/// Where an attachment's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Bytes embedded in the report
    Inline(Vec<u8>),
    /// Bytes held in an external file
    Path(PathBuf),
}

/// A named artifact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAttachment", into = "RawAttachment")]
pub struct Attachment {
    name: String,
    content_type: String,
    source: AttachmentSource,
}

impl Attachment {
    /// Inline text attachment, `text/plain` unless overridden.
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: TEXT_PLAIN.to_string(),
            source: AttachmentSource::Inline(body.into().into_bytes()),
        }
    }

    /// Inline binary attachment, `application/octet-stream` unless overridden.
    pub fn bytes(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: OCTET_STREAM.to_string(),
            source: AttachmentSource::Inline(body.into()),
        }
    }

    /// File-backed attachment with a content type guessed from the extension.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            content_type: guess_content_type(&path),
            source: AttachmentSource::Path(path),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn source(&self) -> &AttachmentSource {
        &self.source
    }

    /// Inline bytes, if this attachment carries them.
    pub fn body(&self) -> Option<&[u8]> {
        match &self.source {
            AttachmentSource::Inline(bytes) => Some(bytes),
            AttachmentSource::Path(_) => None,
        }
    }

    /// External file reference, if this attachment is file-backed.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            AttachmentSource::Inline(_) => None,
            AttachmentSource::Path(path) => Some(path),
        }
    }

    /// Whether the content type is safe to decode as UTF-8 for previews.
    pub fn is_textual(&self) -> bool {
        is_textual_content_type(&self.content_type)
    }
}

fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Returns true for `text/*`, the JSON/JavaScript/XML family, SVG and a few
/// other structured text types, optionally followed by a charset parameter.
pub fn is_textual_content_type(content_type: &str) -> bool {
    static TEXTUAL: OnceLock<Regex> = OnceLock::new();
    let re = TEXTUAL.get_or_init(|| {
        Regex::new(
            r"^(text/.*?|application/(json|(x-)?javascript|xml.*?|ecmascript|graphql|x-www-form-urlencoded)|image/svg(\+xml)?|application/.*?(\+json|\+xml))(;\s*charset=.*)?$",
        )
        .expect("valid textual content type regex")
    });
    re.is_match(&content_type.trim().to_ascii_lowercase())
}

/// Wire form of an attachment.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttachment {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

impl TryFrom<RawAttachment> for Attachment {
    type Error = String;

    fn try_from(raw: RawAttachment) -> Result<Self, Self::Error> {
        let attachment = match (raw.body, raw.body_base64, raw.path) {
            (Some(body), None, None) => Attachment::text(raw.name, body),
            (None, Some(encoded), None) => {
                let bytes = BASE64.decode(encoded.as_bytes()).map_err(|e| {
                    format!("attachment {:?} has invalid bodyBase64: {}", raw.name, e)
                })?;
                Attachment::bytes(raw.name, bytes)
            }
            (None, None, Some(path)) => Attachment::file(raw.name, path),
            (None, None, None) => {
                return Err(format!(
                    "attachment {:?} has neither a body nor a path",
                    raw.name
                ));
            }
            _ => {
                return Err(format!(
                    "attachment {:?} must have exactly one of body, bodyBase64 or path",
                    raw.name
                ));
            }
        };

        Ok(match raw.content_type {
            Some(content_type) => attachment.with_content_type(content_type),
            None => attachment,
        })
    }
}

impl From<Attachment> for RawAttachment {
    fn from(attachment: Attachment) -> Self {
        let (body, body_base64, path) = match attachment.source {
            AttachmentSource::Inline(bytes) => match String::from_utf8(bytes) {
                Ok(text) => (Some(text), None, None),
                Err(e) => (None, Some(BASE64.encode(e.into_bytes())), None),
            },
            AttachmentSource::Path(path) => (None, None, Some(path)),
        };

        RawAttachment {
            name: attachment.name,
            content_type: Some(attachment.content_type),
            body,
            body_base64,
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_body_defaults_to_text_plain() {
        let attachment: Attachment =
            serde_json::from_value(json!({ "name": "note", "body": "text42" })).unwrap();

        assert_eq!(attachment.content_type(), "text/plain");
        assert_eq!(attachment.body(), Some(b"text42".as_slice()));
        assert!(attachment.is_textual());
    }

    #[test]
    fn test_base64_body_defaults_to_octet_stream() {
        let attachment: Attachment =
            serde_json::from_value(json!({ "name": "data", "bodyBase64": "AQID" })).unwrap();

        assert_eq!(attachment.content_type(), "application/octet-stream");
        assert_eq!(attachment.body(), Some([1u8, 2, 3].as_slice()));
        assert!(!attachment.is_textual());
    }

    #[test]
    fn test_path_content_type_is_guessed() {
        let attachment: Attachment =
            serde_json::from_value(json!({ "name": "trace", "path": "out/trace.json" })).unwrap();

        assert_eq!(attachment.content_type(), "application/json");
        assert_eq!(attachment.path(), Some(Path::new("out/trace.json")));
    }

    #[test]
    fn test_unknown_extension_falls_back_to_octet_stream() {
        let attachment = Attachment::file("blob", "out/blob.zzz-unknown");
        assert_eq!(attachment.content_type(), "application/octet-stream");
    }

    #[test]
    fn test_explicit_content_type_wins() {
        let attachment: Attachment = serde_json::from_value(json!({
            "name": "page",
            "body": "<p>hi</p>",
            "contentType": "text/html"
        }))
        .unwrap();

        assert_eq!(attachment.content_type(), "text/html");
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let result: Result<Attachment, _> = serde_json::from_value(json!({ "name": "empty" }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("neither a body nor a path"));
    }

    #[test]
    fn test_both_sources_are_rejected() {
        let result: Result<Attachment, _> = serde_json::from_value(json!({
            "name": "both",
            "body": "x",
            "path": "x.txt"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_utf8_bytes_serialize_as_base64() {
        let attachment = Attachment::bytes("img", vec![0xff, 0x00, 0xfe]);
        let value = serde_json::to_value(&attachment).unwrap();

        assert!(value.get("body").is_none());
        assert_eq!(value["bodyBase64"], "/wD+");

        let parsed: Attachment = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, attachment);
    }

    #[test]
    fn test_textual_content_types() {
        for textual in [
            "text/plain",
            "text/markdown; charset=utf-8",
            "application/json",
            "application/javascript",
            "application/x-javascript",
            "application/xml",
            "application/vnd.api+json",
            "image/svg+xml",
            "TEXT/HTML",
        ] {
            assert!(is_textual_content_type(textual), "{textual} should be textual");
        }

        for binary in [
            "application/octet-stream",
            "image/png",
            "video/mp2t",
            "application/zip",
        ] {
            assert!(!is_textual_content_type(binary), "{binary} should be binary");
        }
    }
}
