//! Attachment store.
//!
//! Resolves attachments to their bytes, either from the inline body or from
//! the referenced file. Nothing is cached between calls, so the store can be
//! shared freely between concurrent requests for different attachments.
//!
//! This module provides a trait-based interface so the viewer can be driven
//! by the filesystem store in production and by in-memory fakes in tests.

use crate::error::{AttachmentError, AttachmentResult};
use crate::text::decode_utf8_prefix;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use vista_proto::{Attachment, AttachmentSource, is_textual_content_type};

/// Stream of attachment bytes used for downloads.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Where the bytes of a resolved attachment come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    Inline,
    FileRef,
}

/// Metadata about an attachment's content, obtained without reading it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentDescriptor {
    pub kind: ContentKind,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<u64>,
}

/// Bounded, decode-safe rendering of an attachment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Preview {
    /// UTF-8 text prefix; `truncated` is set when more content follows
    Text { text: String, truncated: bool },
    /// Binary content, never decoded
    Unavailable,
}

impl Preview {
    /// Builds a preview from an already bounded byte prefix.
    pub fn decode(content_type: &str, prefix: &[u8], truncated: bool) -> Self {
        if !is_textual_content_type(content_type) {
            return Preview::Unavailable;
        }
        Preview::Text {
            text: decode_utf8_prefix(prefix),
            truncated,
        }
    }
}

/// Trait for attachment byte sources.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Describes the content without reading file bytes.
    ///
    /// Fails with `NotFound` when a referenced file is missing.
    async fn resolve(&self, attachment: &Attachment) -> AttachmentResult<ContentDescriptor>;

    /// Reads the complete content, byte for byte.
    async fn read_all(&self, attachment: &Attachment) -> AttachmentResult<Vec<u8>>;

    /// Reads at most `max_bytes` and decodes them when the content type is textual.
    async fn read_preview(
        &self,
        attachment: &Attachment,
        max_bytes: usize,
    ) -> AttachmentResult<Preview>;

    /// Opens the content as a chunked stream for downloads.
    async fn open_stream(&self, attachment: &Attachment) -> AttachmentResult<ByteStream>;
}

/// Attachment store backed by the local filesystem.
///
/// Relative attachment paths resolve against `base_dir` when one is set,
/// typically the directory holding the report file.
#[derive(Debug, Clone, Default)]
pub struct FsAttachmentStore {
    base_dir: Option<PathBuf>,
}

impl FsAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Absolute location of a file reference.
    pub fn locate(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn read_prefix(
        &self,
        path: &Path,
        max_bytes: usize,
    ) -> AttachmentResult<(Vec<u8>, bool)> {
        let location = self.locate(path);
        let file = tokio::fs::File::open(&location)
            .await
            .map_err(|e| AttachmentError::from_io(location.clone(), e))?;

        // One extra byte tells us whether the preview was cut short.
        let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let mut buf = Vec::new();
        file.take(limit)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| AttachmentError::from_io(location, e))?;

        let truncated = buf.len() > max_bytes;
        buf.truncate(max_bytes);
        Ok((buf, truncated))
    }
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    async fn resolve(&self, attachment: &Attachment) -> AttachmentResult<ContentDescriptor> {
        match attachment.source() {
            AttachmentSource::Inline(bytes) => Ok(ContentDescriptor {
                kind: ContentKind::Inline,
                content_type: attachment.content_type().to_string(),
                size_hint: Some(bytes.len() as u64),
            }),
            AttachmentSource::Path(path) => {
                let location = self.locate(path);
                let metadata = tokio::fs::metadata(&location)
                    .await
                    .map_err(|e| AttachmentError::from_io(location.clone(), e))?;
                if !metadata.is_file() {
                    return Err(AttachmentError::NotFound { path: location });
                }
                Ok(ContentDescriptor {
                    kind: ContentKind::FileRef,
                    content_type: attachment.content_type().to_string(),
                    size_hint: Some(metadata.len()),
                })
            }
        }
    }

    async fn read_all(&self, attachment: &Attachment) -> AttachmentResult<Vec<u8>> {
        match attachment.source() {
            AttachmentSource::Inline(bytes) => Ok(bytes.clone()),
            AttachmentSource::Path(path) => {
                let location = self.locate(path);
                tokio::fs::read(&location)
                    .await
                    .map_err(|e| AttachmentError::from_io(location, e))
            }
        }
    }

    async fn read_preview(
        &self,
        attachment: &Attachment,
        max_bytes: usize,
    ) -> AttachmentResult<Preview> {
        if !attachment.is_textual() {
            return Ok(Preview::Unavailable);
        }

        let (prefix, truncated) = match attachment.source() {
            AttachmentSource::Inline(bytes) => {
                let end = bytes.len().min(max_bytes);
                (bytes[..end].to_vec(), bytes.len() > max_bytes)
            }
            AttachmentSource::Path(path) => self.read_prefix(path, max_bytes).await?,
        };
        Ok(Preview::decode(attachment.content_type(), &prefix, truncated))
    }

    async fn open_stream(&self, attachment: &Attachment) -> AttachmentResult<ByteStream> {
        match attachment.source() {
            AttachmentSource::Inline(bytes) => {
                let chunk = Bytes::from(bytes.clone());
                Ok(stream::once(async move { Ok::<_, std::io::Error>(chunk) }).boxed())
            }
            AttachmentSource::Path(path) => {
                let location = self.locate(path);
                let file = tokio::fs::File::open(&location)
                    .await
                    .map_err(|e| AttachmentError::from_io(location, e))?;
                Ok(ReaderStream::new(file).boxed())
            }
        }
    }
}
