//! # vista-core
//!
//! Viewer logic for the Vista test report viewer.
//!
//! This crate provides:
//! - The attachment store, which turns attachment references into bytes
//! - The retrieval protocol used by the download endpoint
//! - The report view controller holding all interactive UI state
//! - Page identity (title and icon) derived from the bound test
//! - UTF-8 safe text helpers for previews and display strings

mod error;
pub mod retrieval;
pub mod store;
mod text;
pub mod view;

pub use error::{AttachmentError, AttachmentResult};
pub use retrieval::{
    AttachmentRef, RetrievalMode, RetrievalRequest, RetrievalResponse, content_disposition,
    download_href, retrieve,
};
pub use store::{
    AttachmentStore, ByteStream, ContentDescriptor, ContentKind, FsAttachmentStore, Preview,
};
pub use text::{decode_utf8_prefix, truncate_with_ellipsis};
pub use view::{
    Anchor, AnnotationItem, AnnotationsView, AttachmentFetch, AttachmentKey, AttachmentRow,
    AttachmentRowState, AttachmentState, DownloadLink, FetchResult, HeaderView, IconKey,
    NO_PREVIEW, PageIdentity, PanelState, ReportView, ReportViewController, ResultTab,
    SUMMARY_TITLE, StepFilter, StepKey, StepRow,
};
