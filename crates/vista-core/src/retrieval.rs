//! Retrieval protocol between the viewer and the attachment store.
//!
//! A request names an attachment by its owning result and its name or index.
//! The answer is inline bytes, a redirect to an external file, or
//! `Unavailable`. Download bytes are passed through untouched: no
//! re-encoding, no line-ending normalization, no charset transcoding.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vista_proto::{Attachment, AttachmentSource, TestCase};

/// How the request identifies the attachment within its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentRef {
    /// Exact attachment name; the first match wins when names repeat
    ByName(String),
    ByIndex(usize),
}

/// Full download or bounded preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RetrievalMode {
    Download,
    Preview { max_bytes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalRequest {
    /// Index of the owning result (retry)
    pub result: usize,
    pub attachment: AttachmentRef,
    pub mode: RetrievalMode,
}

impl RetrievalRequest {
    pub fn download(result: usize, attachment: AttachmentRef) -> Self {
        Self {
            result,
            attachment,
            mode: RetrievalMode::Download,
        }
    }

    pub fn preview(result: usize, attachment: AttachmentRef, max_bytes: usize) -> Self {
        Self {
            result,
            attachment,
            mode: RetrievalMode::Preview { max_bytes },
        }
    }
}

/// Answer to a [`RetrievalRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalResponse {
    /// Bytes returned directly. `truncated` is only ever set in preview mode.
    Inline {
        name: String,
        content_type: String,
        bytes: Vec<u8>,
        truncated: bool,
    },
    /// The caller must read the external file.
    FileRedirect {
        name: String,
        content_type: String,
        path: PathBuf,
    },
    Unavailable,
}

impl RetrievalResponse {
    /// Suggested filename for a download; always the attachment's exact name.
    pub fn suggested_filename(&self) -> Option<&str> {
        match self {
            RetrievalResponse::Inline { name, .. }
            | RetrievalResponse::FileRedirect { name, .. } => Some(name),
            RetrievalResponse::Unavailable => None,
        }
    }
}

/// Finds the attachment a request refers to.
pub fn lookup<'a>(
    test: &'a TestCase,
    result: usize,
    attachment: &AttachmentRef,
) -> Option<&'a Attachment> {
    let result = test.results.get(result)?;
    match attachment {
        AttachmentRef::ByName(name) => result.attachment_by_name(name).map(|(_, a)| a),
        AttachmentRef::ByIndex(index) => result.attachments.get(*index),
    }
}

/// Answers a request from the report alone, without touching the filesystem.
pub fn retrieve(test: &TestCase, request: &RetrievalRequest) -> RetrievalResponse {
    let Some(attachment) = lookup(test, request.result, &request.attachment) else {
        tracing::debug!(?request, "attachment not present in report");
        return RetrievalResponse::Unavailable;
    };

    let name = attachment.name().to_string();
    let content_type = attachment.content_type().to_string();

    match (attachment.source(), request.mode) {
        (AttachmentSource::Inline(bytes), RetrievalMode::Download) => RetrievalResponse::Inline {
            name,
            content_type,
            bytes: bytes.clone(),
            truncated: false,
        },
        (AttachmentSource::Inline(bytes), RetrievalMode::Preview { max_bytes }) => {
            let end = bytes.len().min(max_bytes);
            RetrievalResponse::Inline {
                name,
                content_type,
                bytes: bytes[..end].to_vec(),
                truncated: bytes.len() > max_bytes,
            }
        }
        (AttachmentSource::Path(path), _) => RetrievalResponse::FileRedirect {
            name,
            content_type,
            path: path.clone(),
        },
    }
}

/// Path of the download endpoint for an attachment.
pub fn download_href(result: usize, name: &str) -> String {
    format!(
        "/api/results/{}/attachments/{}",
        result,
        urlencoding::encode(name)
    )
}

/// `Content-Disposition` value whose suggested filename is exactly `name`.
///
/// The RFC 5987 `filename*` parameter carries the exact name, including
/// non-ASCII characters; the plain `filename` parameter is an ASCII fallback
/// for clients that ignore `filename*`.
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if fallback == name {
        format!("attachment; filename=\"{}\"", name)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_proto::{Location, Outcome, TestResult, TestStatus};

    fn test_with_attachments(attachments: Vec<Attachment>) -> TestCase {
        TestCase {
            test_id: "testid".to_string(),
            title: "attach test".to_string(),
            path: Vec::new(),
            project_name: "chromium".to_string(),
            location: Location {
                file: "a.test.ts".to_string(),
                line: 3,
                column: 0,
            },
            annotations: Vec::new(),
            tags: Vec::new(),
            outcome: Outcome::Expected,
            duration: 10,
            ok: true,
            results: vec![TestResult {
                retry: 0,
                start_time: chrono::Utc::now(),
                duration: 10,
                status: TestStatus::Passed,
                errors: Vec::new(),
                attachments,
                steps: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_download_inline_text() {
        let test = test_with_attachments(vec![Attachment::text("note", "text42")]);
        let response = retrieve(
            &test,
            &RetrievalRequest::download(0, AttachmentRef::ByName("note".to_string())),
        );

        assert_eq!(response.suggested_filename(), Some("note"));
        assert_eq!(
            response,
            RetrievalResponse::Inline {
                name: "note".to_string(),
                content_type: "text/plain".to_string(),
                bytes: b"text42".to_vec(),
                truncated: false,
            }
        );
    }

    #[test]
    fn test_download_binary_is_byte_exact() {
        let test = test_with_attachments(vec![
            Attachment::bytes("data", vec![1, 2, 3]).with_content_type("application/octet-stream"),
        ]);
        let response = retrieve(
            &test,
            &RetrievalRequest::download(0, AttachmentRef::ByIndex(0)),
        );

        match response {
            RetrievalResponse::Inline { bytes, content_type, .. } => {
                assert_eq!(bytes, vec![1, 2, 3]);
                assert_eq!(content_type, "application/octet-stream");
            }
            other => panic!("expected inline bytes, got {other:?}"),
        }
    }

    #[test]
    fn test_preview_mode_truncates_inline_bytes() {
        let test = test_with_attachments(vec![Attachment::text("log", "0123456789")]);
        let response = retrieve(
            &test,
            &RetrievalRequest::preview(0, AttachmentRef::ByName("log".to_string()), 4),
        );

        assert!(matches!(
            response,
            RetrievalResponse::Inline { ref bytes, truncated: true, .. } if bytes == b"0123"
        ));
    }

    #[test]
    fn test_file_reference_redirects() {
        let test = test_with_attachments(vec![Attachment::file("note", "/tmp/notes.txt")]);
        let response = retrieve(
            &test,
            &RetrievalRequest::download(0, AttachmentRef::ByName("note".to_string())),
        );

        assert_eq!(
            response,
            RetrievalResponse::FileRedirect {
                name: "note".to_string(),
                content_type: "text/plain".to_string(),
                path: PathBuf::from("/tmp/notes.txt"),
            }
        );
    }

    #[test]
    fn test_unknown_attachment_is_unavailable() {
        let test = test_with_attachments(vec![Attachment::text("note", "x")]);

        for request in [
            RetrievalRequest::download(0, AttachmentRef::ByName("missing".to_string())),
            RetrievalRequest::download(0, AttachmentRef::ByIndex(5)),
            RetrievalRequest::download(3, AttachmentRef::ByName("note".to_string())),
        ] {
            assert_eq!(retrieve(&test, &request), RetrievalResponse::Unavailable);
        }
    }

    #[test]
    fn test_first_duplicate_name_wins() {
        let test = test_with_attachments(vec![
            Attachment::text("dup", "first"),
            Attachment::text("dup", "second"),
        ]);
        let attachment = lookup(&test, 0, &AttachmentRef::ByName("dup".to_string())).unwrap();
        assert_eq!(attachment.body(), Some(b"first".as_slice()));
    }

    #[test]
    fn test_content_disposition_ascii_name() {
        assert_eq!(content_disposition("note"), "attachment; filename=\"note\"");
    }

    #[test]
    fn test_content_disposition_keeps_exact_unicode_name() {
        assert_eq!(
            content_disposition("🎭"),
            "attachment; filename=\"_\"; filename*=UTF-8''%F0%9F%8E%AD"
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        let header = content_disposition("a \"quoted\" name");
        assert!(header.starts_with("attachment; filename=\"a _quoted_ name\""));
        assert!(header.ends_with("filename*=UTF-8''a%20%22quoted%22%20name"));
    }

    #[test]
    fn test_download_href_encodes_name() {
        assert_eq!(download_href(1, "my file"), "/api/results/1/attachments/my%20file");
        assert_eq!(download_href(0, "🎭"), "/api/results/0/attachments/%F0%9F%8E%AD");
    }
}
