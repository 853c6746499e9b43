//! Serializable render model consumed by the web layer and `vista inspect`.

use super::{
    AttachmentKey, AttachmentState, PageIdentity, PanelState, ReportViewController, StepFilter,
};
use crate::retrieval::download_href;
use crate::store::{ContentKind, Preview};
use crate::text::truncate_with_ellipsis;
use serde::{Deserialize, Serialize};
use vista_proto::{Outcome, Step, StepPath, TestStatus, TextSpan, linkify, visible};

/// Placeholder shown for attachments whose content cannot be previewed.
pub const NO_PREVIEW: &str = "no preview available";

/// Length of the collapsed annotations preview, in characters.
const ANNOTATION_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub page: PageIdentity,
    pub project_names: Vec<String>,
    /// `None` on the summary page
    pub header: Option<HeaderView>,
    /// `None` when the test has no visible annotations
    pub annotations: Option<AnnotationsView>,
    pub results: Vec<ResultTab>,
    pub selected_result: Option<usize>,
    /// Errors of the selected result
    pub errors: Vec<String>,
    pub steps: Vec<StepRow>,
    pub attachments: Vec<AttachmentRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    pub title: String,
    pub full_title: String,
    pub path: Vec<String>,
    pub project_name: String,
    pub location: String,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    pub ok: bool,
    pub duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationsView {
    pub state: PanelState,
    /// Number of visible annotations
    pub count: usize,
    /// First visible annotation as one truncated line; collapsed panel only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Every visible annotation; expanded panel only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<AnnotationItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationItem {
    pub kind: String,
    pub spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultTab {
    pub index: usize,
    pub retry: u32,
    pub status: TestStatus,
    pub duration: u64,
    pub error_count: usize,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepRow {
    pub path: StepPath,
    pub depth: usize,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub duration: u64,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub leaf: bool,
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<usize>,
}

impl StepRow {
    pub(super) fn new(path: &StepPath, step: &Step, expanded: bool) -> Self {
        Self {
            path: path.clone(),
            depth: path.depth(),
            title: step.title.clone(),
            location: step.location.as_ref().map(ToString::to_string),
            duration: step.duration,
            count: step.count,
            error: step.error.clone(),
            leaf: step.is_leaf(),
            expanded: expanded && !step.is_leaf(),
            attachments: step.attachments.clone(),
        }
    }
}

/// Link that downloads an attachment under its exact name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub href: String,
    pub suggested_filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRow {
    pub index: usize,
    pub name: String,
    pub content_type: String,
    pub download: DownloadLink,
    #[serde(flatten)]
    pub state: AttachmentRowState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum AttachmentRowState {
    Hidden,
    Loading,
    Ready {
        source: ContentKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u64>,
        preview: Preview,
        /// Set when there is no text to show
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    Unavailable {
        reason: String,
    },
}

impl From<&AttachmentState> for AttachmentRowState {
    fn from(state: &AttachmentState) -> Self {
        match state {
            AttachmentState::Hidden => AttachmentRowState::Hidden,
            AttachmentState::Loading { .. } => AttachmentRowState::Loading,
            AttachmentState::Ready { descriptor, preview } => AttachmentRowState::Ready {
                source: descriptor.kind,
                size: descriptor.size_hint,
                placeholder: matches!(preview, Preview::Unavailable)
                    .then(|| NO_PREVIEW.to_string()),
                preview: preview.clone(),
            },
            AttachmentState::Unavailable { reason } => AttachmentRowState::Unavailable {
                reason: reason.clone(),
            },
        }
    }
}

impl ReportViewController {
    /// Snapshot of everything the page shows.
    pub fn render(&self, filter: StepFilter) -> ReportView {
        let selected_result = self.selected_result();
        ReportView {
            page: self.page.clone(),
            project_names: self.project_names.clone(),
            header: self.header(),
            annotations: self.annotations_panel(),
            results: self.result_tabs(),
            selected_result,
            errors: self
                .current_result()
                .map(|result| result.errors.clone())
                .unwrap_or_default(),
            steps: self.visible_steps(filter),
            attachments: self.attachment_rows(),
        }
    }

    pub fn header(&self) -> Option<HeaderView> {
        let test = self.test()?;
        Some(HeaderView {
            title: test.title.clone(),
            full_title: test.full_title(),
            path: test.path.clone(),
            project_name: test.project_name.clone(),
            location: test.location.to_string(),
            tags: test.tags.clone(),
            outcome: test.outcome,
            ok: test.ok,
            duration: test.duration,
        })
    }

    /// The annotations panel, or `None` when nothing is visible.
    pub fn annotations_panel(&self) -> Option<AnnotationsView> {
        let shown = visible(&self.test()?.annotations);
        let first = shown.first()?;

        let (preview, items) = match self.annotations {
            PanelState::Collapsed => {
                let line = if first.description.is_empty() {
                    first.kind.clone()
                } else {
                    format!("{}: {}", first.kind, first.description)
                };
                (Some(truncate_with_ellipsis(&line, ANNOTATION_PREVIEW_CHARS)), Vec::new())
            }
            PanelState::Expanded => {
                let items: Vec<AnnotationItem> = shown
                    .iter()
                    .map(|annotation| AnnotationItem {
                        kind: annotation.kind.clone(),
                        spans: linkify(&annotation.description),
                    })
                    .collect();
                (None, items)
            }
        };

        Some(AnnotationsView {
            state: self.annotations,
            count: shown.len(),
            preview,
            items,
        })
    }

    fn result_tabs(&self) -> Vec<ResultTab> {
        let selected = self.selected_result();
        self.test()
            .map(|test| {
                test.results
                    .iter()
                    .enumerate()
                    .map(|(index, result)| ResultTab {
                        index,
                        retry: result.retry,
                        status: result.status,
                        duration: result.duration,
                        error_count: result.errors.len(),
                        selected: selected == Some(index),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Attachment rows of the selected result, in report order.
    pub fn attachment_rows(&self) -> Vec<AttachmentRow> {
        let Some(result) = self.current_result() else {
            return Vec::new();
        };
        result
            .attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| {
                let key = AttachmentKey {
                    result: self.selected_result,
                    index,
                };
                let state = self
                    .attachments
                    .get(&key)
                    .map_or(AttachmentRowState::Hidden, AttachmentRowState::from);
                AttachmentRow {
                    index,
                    name: attachment.name().to_string(),
                    content_type: attachment.content_type().to_string(),
                    download: DownloadLink {
                        href: download_href(self.selected_result, attachment.name()),
                        suggested_filename: attachment.name().to_string(),
                    },
                    state,
                }
            })
            .collect()
    }
}
