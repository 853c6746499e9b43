//! # vista-proto
//!
//! Shared report types for the Vista test report viewer.
//!
//! This crate provides the foundational abstractions used by the other Vista
//! crates, including:
//! - The test report data model (`TestCase`, `TestResult`, `Step`, ...)
//! - The step tree model with lazy, filterable traversal
//! - Annotation visibility rules and link extraction
//! - Common error types

pub mod annotation;
pub mod attachment;
mod error;
pub mod model;
pub mod step;
mod timestamp;

pub use annotation::{Annotation, Link, TextSpan, extract_links, is_internal, linkify, visible};
pub use attachment::{Attachment, AttachmentSource, is_textual_content_type};
pub use error::{ReportError, Result};
pub use model::{Location, Outcome, ReportBundle, TestCase, TestResult, TestStatus};
pub use step::{Flatten, Step, StepPath, flatten, step_at};
