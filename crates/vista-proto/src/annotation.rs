//! Annotation visibility and link extraction.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Prefix marking an annotation type as internal.
const INTERNAL_PREFIX: char = '_';

/// Characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '>'];

/// Characters that may join two URLs without whitespace.
const URL_SEPARATORS: &[char] = &[',', ';', '|'];

/// A labeled free-text note attached to a test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Annotation {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
        }
    }
}

/// Whether an annotation is hidden from default listings.
///
/// Only the `_` type prefix is recognised; further conventions belong here.
pub fn is_internal(annotation: &Annotation) -> bool {
    annotation.kind.starts_with(INTERNAL_PREFIX)
}

/// Annotations shown by default, in their original order.
pub fn visible(annotations: &[Annotation]) -> Vec<&Annotation> {
    annotations.iter().filter(|a| !is_internal(a)).collect()
}

/// A clickable URL found in free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// A run of description text, either plain or a link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TextSpan {
    Text { text: String },
    Link { text: String, href: String },
}

/// Splits `description` into plain text and link spans, left to right.
///
/// A URL is `http://` or `https://` followed by non-whitespace, starting at a
/// token boundary. Trailing sentence punctuation and unbalanced closing
/// brackets stay outside the link; a scheme without a host is plain text.
pub fn linkify(description: &str) -> Vec<TextSpan> {
    static URL: OnceLock<Regex> = OnceLock::new();
    let re = URL.get_or_init(|| Regex::new(r"https?://\S+").expect("valid URL regex"));

    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut cursor = 0;
    let mut search_from = 0;

    while let Some(found) = re.find_at(description, search_from) {
        let candidate = &found.as_str()[..next_scheme(found.as_str())];
        search_from = found.start() + candidate.len();

        let preceded_by_word = description[..found.start()]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
        if preceded_by_word {
            continue;
        }

        let url = trim_url(candidate);
        if !has_host(url) {
            continue;
        }

        plain.push_str(&description[cursor..found.start()]);
        if !plain.is_empty() {
            spans.push(TextSpan::Text {
                text: std::mem::take(&mut plain),
            });
        }
        spans.push(TextSpan::Link {
            text: url.to_string(),
            href: url.to_string(),
        });
        cursor = found.start() + url.len();
    }

    plain.push_str(&description[cursor..]);
    if !plain.is_empty() {
        spans.push(TextSpan::Text { text: plain });
    }
    spans
}

/// Only the links of [`linkify`].
pub fn extract_links(description: &str) -> Vec<Link> {
    linkify(description)
        .into_iter()
        .filter_map(|span| match span {
            TextSpan::Link { text, href } => Some(Link { text, href }),
            TextSpan::Text { .. } => None,
        })
        .collect()
}

/// End of the first URL in `candidate`: a second scheme right after a
/// separator starts a new URL.
fn next_scheme(candidate: &str) -> usize {
    candidate
        .char_indices()
        .skip(1)
        .find(|&(i, _)| {
            let rest = &candidate[i..];
            (rest.starts_with("http://") || rest.starts_with("https://"))
                && candidate[..i].ends_with(URL_SEPARATORS)
        })
        .map_or(candidate.len(), |(i, _)| i)
}

fn trim_url(mut url: &str) -> &str {
    loop {
        let Some(last) = url.chars().next_back() else {
            return url;
        };
        let unbalanced = match last {
            ')' => url.matches('(').count() < url.matches(')').count(),
            ']' => url.matches('[').count() < url.matches(']').count(),
            '}' => url.matches('{').count() < url.matches('}').count(),
            c => TRAILING_PUNCTUATION.contains(&c),
        };
        if !unbalanced {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}

fn has_host(url: &str) -> bool {
    url.split_once("://")
        .and_then(|(_, rest)| rest.chars().next())
        .is_some_and(|c| c.is_alphanumeric() || c == '[')
}
