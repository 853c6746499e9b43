//! Report view controller.
//!
//! The controller binds a read-only [`TestCase`] and owns every piece of
//! interactive state around it: the annotations panel, the selected result,
//! which steps are expanded and which attachments are shown. State is keyed by
//! result index plus step path or attachment index, so supplying the same
//! report again as a fresh object keeps what the user had open.
//!
//! Attachment content is loaded off the controller. Showing an attachment
//! hands out an [`AttachmentFetch`] ticket carrying a generation number; the
//! caller runs it against an [`AttachmentStore`] and feeds the
//! [`FetchResult`] back through [`ReportViewController::apply_fetch`], which
//! drops results whose entry has since been hidden, re-shown or rebound.

mod anchor;
mod page;
mod render;

pub use anchor::Anchor;
pub use page::{IconKey, PageIdentity, SUMMARY_TITLE};
pub use render::{
    AnnotationItem, AnnotationsView, AttachmentRow, AttachmentRowState, DownloadLink, HeaderView,
    NO_PREVIEW, ReportView, ResultTab, StepRow,
};

use crate::error::AttachmentResult;
use crate::store::{AttachmentStore, ContentDescriptor, Preview};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};
use vista_proto::{
    Attachment, ReportBundle, Result, Step, StepPath, TestCase, TestResult, flatten, step_at,
};

/// Annotations panel state.
///
/// The panel starts collapsed and still shows a one-line preview of the first
/// visible annotation. Collapsing never hides annotations entirely; expanding
/// lists every visible annotation with its links.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    #[default]
    Collapsed,
    Expanded,
}

/// Which steps `visible_steps` considers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StepFilter {
    #[default]
    All,
    /// Only failed steps and their failing ancestors
    ErrorsOnly,
}

impl StepFilter {
    fn accepts(self, step: &Step) -> bool {
        match self {
            StepFilter::All => true,
            StepFilter::ErrorsOnly => step.has_error(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub result: usize,
    pub path: StepPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    pub result: usize,
    pub index: usize,
}

/// Display state of one attachment entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentState {
    Hidden,
    /// Shown, content requested
    Loading { generation: u64 },
    /// Shown with its content resolved
    Ready {
        descriptor: ContentDescriptor,
        preview: Preview,
    },
    /// Shown, but the content could not be read
    Unavailable { reason: String },
}

impl AttachmentState {
    pub fn is_shown(&self) -> bool {
        !matches!(self, AttachmentState::Hidden)
    }
}

/// Request to load the content of a shown attachment.
#[derive(Debug, Clone)]
pub struct AttachmentFetch {
    pub key: AttachmentKey,
    pub generation: u64,
    pub attachment: Attachment,
}

impl AttachmentFetch {
    /// Resolves the attachment and reads its preview.
    pub async fn run(self, store: &dyn AttachmentStore, max_bytes: usize) -> FetchResult {
        debug!(
            result = self.key.result,
            index = self.key.index,
            generation = self.generation,
            name = self.attachment.name(),
            "fetching attachment"
        );
        let outcome = match store.resolve(&self.attachment).await {
            Ok(descriptor) => store
                .read_preview(&self.attachment, max_bytes)
                .await
                .map(|preview| (descriptor, preview)),
            Err(e) => Err(e),
        };
        FetchResult {
            key: self.key,
            generation: self.generation,
            outcome,
        }
    }
}

/// Completed [`AttachmentFetch`].
#[derive(Debug)]
pub struct FetchResult {
    pub key: AttachmentKey,
    pub generation: u64,
    pub outcome: AttachmentResult<(ContentDescriptor, Preview)>,
}

/// Interactive state around one bound test case.
#[derive(Debug, Default)]
pub struct ReportViewController {
    test: Option<Arc<TestCase>>,
    project_names: Vec<String>,
    page: PageIdentity,
    selected_result: usize,
    annotations: PanelState,
    expanded_steps: HashSet<StepKey>,
    attachments: HashMap<AttachmentKey, AttachmentState>,
    next_generation: u64,
}

impl ReportViewController {
    /// Creates an unbound controller showing the summary page identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a controller from an orchestrator bundle.
    ///
    /// Selects `bundle.run` (clamped to the last result) and applies
    /// `bundle.anchor`; the returned tickets load whatever the anchor shows.
    pub fn from_bundle(bundle: ReportBundle) -> Result<(Self, Vec<AttachmentFetch>)> {
        let mut controller = Self::new();
        controller.project_names = bundle.project_names;
        controller.bind(bundle.test.map(Arc::new))?;
        controller.select_result(bundle.run);
        let fetches = controller.apply_anchor(&bundle.anchor).into_iter().collect();
        Ok((controller, fetches))
    }

    /// Replaces the bound test.
    ///
    /// Fails without touching any state when the test is malformed. Step
    /// expansion survives for paths that still exist; attachments that were
    /// shown are requested again and every earlier ticket becomes stale.
    pub fn bind(&mut self, test: Option<Arc<TestCase>>) -> Result<Vec<AttachmentFetch>> {
        if let Some(test) = &test {
            test.validate()?;
        }

        let shown: Vec<AttachmentKey> = self
            .attachments
            .iter()
            .filter(|(_, state)| state.is_shown())
            .map(|(key, _)| *key)
            .collect();

        self.page = PageIdentity::derive(test.as_deref());
        self.test = test;
        self.attachments.clear();
        self.selected_result = self.clamp_result(self.selected_result);

        let mut fetches = Vec::new();
        for key in shown {
            if let Some(fetch) = self.show(key) {
                fetches.push(fetch);
            }
        }
        debug!(
            bound = self.test.is_some(),
            refetching = fetches.len(),
            "report bound"
        );
        Ok(fetches)
    }

    pub fn test(&self) -> Option<&TestCase> {
        self.test.as_deref()
    }

    pub fn page(&self) -> &PageIdentity {
        &self.page
    }

    pub fn project_names(&self) -> &[String] {
        &self.project_names
    }

    pub fn set_project_names(&mut self, project_names: Vec<String>) {
        self.project_names = project_names;
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    /// Index of the result tab on display, if the bound test has any results.
    pub fn selected_result(&self) -> Option<usize> {
        self.current_result().map(|_| self.selected_result)
    }

    /// Switches result tabs. Out-of-range indices select the last result.
    pub fn select_result(&mut self, index: usize) -> Option<usize> {
        self.selected_result = self.clamp_result(index);
        self.selected_result()
    }

    fn clamp_result(&self, index: usize) -> usize {
        let count = self.test.as_ref().map_or(0, |t| t.results.len());
        index.min(count.saturating_sub(1))
    }

    fn current_result(&self) -> Option<&TestResult> {
        self.test.as_ref()?.results.get(self.selected_result)
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    pub fn annotations_state(&self) -> PanelState {
        self.annotations
    }

    pub fn toggle_annotations(&mut self) -> PanelState {
        self.annotations = match self.annotations {
            PanelState::Collapsed => PanelState::Expanded,
            PanelState::Expanded => PanelState::Collapsed,
        };
        self.annotations
    }

    // ------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------

    fn step_key(&self, path: &StepPath) -> Option<StepKey> {
        step_at(&self.current_result()?.steps, path)?;
        Some(StepKey {
            result: self.selected_result,
            path: path.clone(),
        })
    }

    pub fn is_expanded(&self, path: &StepPath) -> bool {
        self.expanded_steps.contains(&StepKey {
            result: self.selected_result,
            path: path.clone(),
        })
    }

    /// Flips a step of the selected result. Returns the new expansion state,
    /// or `None` when there is no step at `path`.
    pub fn toggle_step(&mut self, path: &StepPath) -> Option<bool> {
        let key = self.step_key(path)?;
        if self.expanded_steps.remove(&key) {
            Some(false)
        } else {
            self.expanded_steps.insert(key);
            Some(true)
        }
    }

    pub fn expand_step(&mut self, path: &StepPath) -> Option<bool> {
        let key = self.step_key(path)?;
        self.expanded_steps.insert(key);
        Some(true)
    }

    /// Collapses one step. Descendants keep their own state.
    pub fn collapse_step(&mut self, path: &StepPath) -> Option<bool> {
        let key = self.step_key(path)?;
        self.expanded_steps.remove(&key);
        Some(false)
    }

    /// Expands every step of the selected result that has children.
    pub fn expand_all(&mut self) {
        let Some(result) = self.current_result() else {
            return;
        };
        let keys: Vec<StepKey> = flatten(&result.steps, |_, _| true)
            .filter(|(_, step)| !step.is_leaf())
            .map(|(path, _)| StepKey {
                result: self.selected_result,
                path,
            })
            .collect();
        self.expanded_steps.extend(keys);
    }

    pub fn collapse_all(&mut self) {
        let selected = self.selected_result;
        self.expanded_steps.retain(|key| key.result != selected);
    }

    /// Rows of the selected result's step tree whose ancestors are all
    /// expanded, in pre-order.
    pub fn visible_steps(&self, filter: StepFilter) -> Vec<StepRow> {
        let Some(result) = self.current_result() else {
            return Vec::new();
        };
        flatten(&result.steps, |path, step| {
            filter.accepts(step) && path.parent().is_none_or(|parent| self.is_expanded(&parent))
        })
        .map(|(path, step)| StepRow::new(&path, step, self.is_expanded(&path)))
        .collect()
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    fn attachment_key(&self, index: usize) -> Option<AttachmentKey> {
        self.current_result()?.attachments.get(index)?;
        Some(AttachmentKey {
            result: self.selected_result,
            index,
        })
    }

    pub fn attachment_state(&self, index: usize) -> &AttachmentState {
        static HIDDEN: AttachmentState = AttachmentState::Hidden;
        self.attachment_key(index)
            .and_then(|key| self.attachments.get(&key))
            .unwrap_or(&HIDDEN)
    }

    /// Shows an attachment of the selected result.
    ///
    /// Returns a ticket to load its content, or `None` when it does not exist
    /// or is already shown.
    pub fn show_attachment(&mut self, index: usize) -> Option<AttachmentFetch> {
        let key = self.attachment_key(index)?;
        if self.attachments.get(&key).is_some_and(AttachmentState::is_shown) {
            return None;
        }
        self.show(key)
    }

    pub fn hide_attachment(&mut self, index: usize) -> bool {
        let Some(key) = self.attachment_key(index) else {
            return false;
        };
        self.attachments.insert(key, AttachmentState::Hidden);
        true
    }

    pub fn toggle_attachment(&mut self, index: usize) -> Option<AttachmentFetch> {
        if self.attachment_state(index).is_shown() {
            self.hide_attachment(index);
            None
        } else {
            self.show_attachment(index)
        }
    }

    fn show(&mut self, key: AttachmentKey) -> Option<AttachmentFetch> {
        let attachment = self
            .test
            .as_ref()?
            .results
            .get(key.result)?
            .attachments
            .get(key.index)?
            .clone();
        self.next_generation += 1;
        let generation = self.next_generation;
        self.attachments
            .insert(key, AttachmentState::Loading { generation });
        Some(AttachmentFetch {
            key,
            generation,
            attachment,
        })
    }

    /// Applies a completed fetch. Returns false when it was stale.
    pub fn apply_fetch(&mut self, fetched: FetchResult) -> bool {
        let current = self.attachments.get(&fetched.key);
        if current != Some(&AttachmentState::Loading { generation: fetched.generation }) {
            debug!(
                result = fetched.key.result,
                index = fetched.key.index,
                generation = fetched.generation,
                "discarding stale attachment fetch"
            );
            return false;
        }

        let state = match fetched.outcome {
            Ok((descriptor, preview)) => AttachmentState::Ready { descriptor, preview },
            Err(e) => {
                warn!(
                    result = fetched.key.result,
                    index = fetched.key.index,
                    error = %e,
                    "attachment unavailable"
                );
                AttachmentState::Unavailable {
                    reason: e.to_string(),
                }
            }
        };
        self.attachments.insert(fetched.key, state);
        true
    }

    /// Runs tickets one after another and applies their results.
    pub async fn load(
        &mut self,
        fetches: Vec<AttachmentFetch>,
        store: &dyn AttachmentStore,
        max_bytes: usize,
    ) {
        for fetch in fetches {
            let fetched = fetch.run(store, max_bytes).await;
            self.apply_fetch(fetched);
        }
    }

    // ------------------------------------------------------------------
    // Anchors
    // ------------------------------------------------------------------

    /// Reveals the part of the selected result named by `anchor`.
    pub fn apply_anchor(&mut self, anchor: &str) -> Option<AttachmentFetch> {
        match Anchor::parse(anchor) {
            Anchor::None => None,
            Anchor::Attachment(index) => {
                let fetch = self.show_attachment(index);
                if fetch.is_none() && !self.attachment_state(index).is_shown() {
                    debug!(anchor, "anchor names no attachment");
                }
                fetch
            }
            Anchor::Step(path) => {
                if self.step_key(&path).is_none() {
                    debug!(anchor, "anchor names no step");
                    return None;
                }
                for ancestor in path.ancestors() {
                    self.expand_step(&ancestor);
                }
                self.expand_step(&path);
                None
            }
            Anchor::Other(_) => {
                debug!(anchor, "ignoring unrecognised anchor");
                None
            }
        }
    }
}
