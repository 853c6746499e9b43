//! Anchors: the part of the report to reveal when it is first shown.

use std::fmt;
use vista_proto::StepPath;

const ATTACHMENT_PREFIX: &str = "attachment-";
const STEP_PREFIX: &str = "step-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    None,
    /// Attachment index within the selected result
    Attachment(usize),
    Step(StepPath),
    /// Anything else; ignored by the controller
    Other(String),
}

impl Anchor {
    pub fn parse(anchor: &str) -> Self {
        if anchor.is_empty() {
            return Anchor::None;
        }
        if let Some(index) = anchor
            .strip_prefix(ATTACHMENT_PREFIX)
            .and_then(|rest| rest.parse().ok())
        {
            return Anchor::Attachment(index);
        }
        if let Some(path) = anchor
            .strip_prefix(STEP_PREFIX)
            .and_then(|rest| rest.parse().ok())
        {
            return Anchor::Step(path);
        }
        Anchor::Other(anchor.to_string())
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::None => Ok(()),
            Anchor::Attachment(index) => write!(f, "{ATTACHMENT_PREFIX}{index}"),
            Anchor::Step(path) => write!(f, "{STEP_PREFIX}{path}"),
            Anchor::Other(anchor) => f.write_str(anchor),
        }
    }
}
