//! Step tree model.
//!
//! Steps form an owned tree: every node belongs to exactly one parent and
//! children are kept in execution order. Nodes are addressed by a
//! [`StepPath`], the child indices from the result's root list, which stays
//! stable when the same report is supplied again as a fresh object.

use crate::error::ReportError;
use crate::model::Location;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named, timed unit of execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub title: String,
    #[serde(with = "crate::timestamp")]
    pub start_time: DateTime<Utc>,
    /// Duration in milliseconds, as reported. Not derived from children.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Number of identical consecutive executions collapsed into this node
    #[serde(default = "default_count")]
    pub count: u32,
    /// Failure message when this step failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Indices into the owning result's attachments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<usize>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_count() -> u32 {
    1
}

impl Step {
    pub fn is_leaf(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when this step or any descendant failed.
    pub fn has_error(&self) -> bool {
        self.error.is_some() || self.steps.iter().any(Step::has_error)
    }
}

/// Child indices from the root step list down to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StepPath(Vec<usize>);

impl StepPath {
    /// Path of the `index`-th root step.
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        match self.0.len() {
            0 | 1 => None,
            len => Some(Self(self.0[..len - 1].to_vec())),
        }
    }

    /// Zero for root steps.
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Strict ancestors, outermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = StepPath> + '_ {
        (1..self.0.len()).map(|len| StepPath(self.0[..len].to_vec()))
    }
}

impl From<Vec<usize>> for StepPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for StepPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

impl FromStr for StepPath {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ReportError::InvalidStepPath("empty path".to_string()));
        }
        s.split('.')
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| ReportError::InvalidStepPath(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(StepPath)
    }
}

impl From<StepPath> for String {
    fn from(path: StepPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for StepPath {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Looks up the step at `path`.
pub fn step_at<'a>(steps: &'a [Step], path: &StepPath) -> Option<&'a Step> {
    let (first, rest) = path.indices().split_first()?;
    let mut step = steps.get(*first)?;
    for index in rest {
        step = step.steps.get(*index)?;
    }
    Some(step)
}

/// Depth-first, pre-order traversal over `steps`.
///
/// A node for which `predicate` returns false is skipped together with its
/// whole subtree. The iterator is lazy; call `flatten` again (or clone a
/// fresh iterator) to restart.
pub fn flatten<'a, P>(steps: &'a [Step], predicate: P) -> Flatten<'a, P>
where
    P: FnMut(&StepPath, &Step) -> bool,
{
    Flatten {
        stack: vec![steps.iter().enumerate()],
        prefix: Vec::new(),
        predicate,
    }
}

/// Iterator returned by [`flatten`].
#[derive(Clone)]
pub struct Flatten<'a, P> {
    /// One sibling iterator per open level
    stack: Vec<std::iter::Enumerate<std::slice::Iter<'a, Step>>>,
    /// Indices of the open parents; always one shorter than `stack`
    prefix: Vec<usize>,
    predicate: P,
}

impl<'a, P> Iterator for Flatten<'a, P>
where
    P: FnMut(&StepPath, &Step) -> bool,
{
    type Item = (StepPath, &'a Step);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            let Some((index, step)) = level.next() else {
                self.stack.pop();
                self.prefix.pop();
                continue;
            };

            let mut indices = self.prefix.clone();
            indices.push(index);
            let path = StepPath(indices);

            if !(self.predicate)(&path, step) {
                continue;
            }

            if !step.steps.is_empty() {
                self.prefix.push(index);
                self.stack.push(step.steps.iter().enumerate());
            }
            return Some((path, step));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn step(title: &str, steps: Vec<Step>) -> Step {
        Step {
            title: title.to_string(),
            start_time: Utc.timestamp_millis_opt(0).unwrap(),
            duration: 10,
            location: None,
            count: 1,
            error: None,
            attachments: Vec::new(),
            steps,
        }
    }

    fn failing(title: &str) -> Step {
        Step {
            error: Some("boom".to_string()),
            ..step(title, Vec::new())
        }
    }

    fn tree() -> Vec<Step> {
        vec![
            step("a", vec![step("a.0", vec![step("a.0.0", vec![])]), failing("a.1")]),
            step("b", vec![]),
            step("c", vec![step("c.0", vec![])]),
        ]
    }

    fn titles<'a>(items: impl Iterator<Item = (StepPath, &'a Step)>) -> Vec<String> {
        items.map(|(_, s)| s.title.clone()).collect()
    }

    #[test]
    fn test_flatten_is_preorder_in_execution_order() {
        let steps = tree();
        assert_eq!(
            titles(flatten(&steps, |_, _| true)),
            vec!["a", "a.0", "a.0.0", "a.1", "b", "c", "c.0"]
        );
    }

    #[test]
    fn test_flatten_yields_paths() {
        let steps = tree();
        let paths: Vec<String> = flatten(&steps, |_, _| true)
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(paths, vec!["0", "0.0", "0.0.0", "0.1", "1", "2", "2.0"]);
    }

    #[test]
    fn test_flatten_skips_failed_subtrees() {
        let steps = tree();
        assert_eq!(
            titles(flatten(&steps, |_, s| s.title != "a.0")),
            vec!["a", "a.1", "b", "c", "c.0"]
        );
    }

    #[test]
    fn test_flatten_errors_only() {
        let steps = tree();
        assert_eq!(titles(flatten(&steps, |_, s| s.has_error())), vec!["a", "a.1"]);
    }

    #[test]
    fn test_flatten_is_lazy() {
        let steps = tree();
        let mut visited = 0;
        let first_two: Vec<_> = flatten(&steps, |_, _| {
            visited += 1;
            true
        })
        .take(2)
        .collect();

        assert_eq!(first_two.len(), 2);
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_flatten_is_restartable() {
        let steps = tree();
        let fresh = flatten(&steps, |_, _| true);
        let replay = fresh.clone();

        assert_eq!(fresh.count(), 7);
        assert_eq!(replay.count(), 7);
        assert_eq!(flatten(&steps, |_, _| true).count(), 7);
    }

    #[test]
    fn test_flatten_empty() {
        assert_eq!(flatten(&[], |_, _| true).count(), 0);
    }

    #[test]
    fn test_is_leaf_and_has_error() {
        let steps = tree();
        assert!(!steps[0].is_leaf());
        assert!(steps[1].is_leaf());
        assert!(steps[0].has_error());
        assert!(!steps[2].has_error());
    }

    #[test]
    fn test_step_at() {
        let steps = tree();
        assert_eq!(step_at(&steps, &"0.0.0".parse().unwrap()).unwrap().title, "a.0.0");
        assert_eq!(step_at(&steps, &StepPath::root(2)).unwrap().title, "c");
        assert!(step_at(&steps, &"0.5".parse().unwrap()).is_none());
        assert!(step_at(&steps, &StepPath::default()).is_none());
    }

    #[test]
    fn test_step_path_navigation() {
        let path: StepPath = "1.2.3".parse().unwrap();
        assert_eq!(path.depth(), 2);
        assert_eq!(path.parent().unwrap().to_string(), "1.2");
        assert_eq!(StepPath::root(1).child(2).child(3), path);

        let ancestors: Vec<String> = path.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["1", "1.2"]);
        assert!(StepPath::root(4).parent().is_none());
    }

    #[test]
    fn test_step_path_rejects_garbage() {
        assert!("".parse::<StepPath>().is_err());
        assert!("1..2".parse::<StepPath>().is_err());
        assert!("a.b".parse::<StepPath>().is_err());
    }

    #[test]
    fn test_step_path_serializes_as_string() {
        let path = StepPath::from(vec![0, 3]);
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"0.3\"");
        let parsed: StepPath = serde_json::from_str("\"0.3\"").unwrap();
        assert_eq!(parsed, path);
    }

    #[test]
    fn test_count_defaults_to_one() {
        let step: Step = serde_json::from_str(
            r#"{"title":"t","startTime":"1970-01-01T00:00:00Z","duration":1}"#,
        )
        .unwrap();
        assert_eq!(step.count, 1);
        assert!(step.steps.is_empty());
    }
}
