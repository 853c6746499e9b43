//! Page identity: the document title and favicon derived from the bound test.

use serde::{Deserialize, Serialize};
use std::fmt;
use vista_proto::{Outcome, TestCase};

/// Title shown when no test is bound.
pub const SUMMARY_TITLE: &str = "Playwright Test Report | Summary";

/// Favicon variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IconKey {
    Expected,
    Unexpected,
    Flaky,
    Skipped,
    Default,
}

impl IconKey {
    pub const ALL: [IconKey; 5] = [
        IconKey::Expected,
        IconKey::Unexpected,
        IconKey::Flaky,
        IconKey::Skipped,
        IconKey::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IconKey::Expected => "expected",
            IconKey::Unexpected => "unexpected",
            IconKey::Flaky => "flaky",
            IconKey::Skipped => "skipped",
            IconKey::Default => "default",
        }
    }

    /// Parses the key used in asset file names.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.as_str() == key)
    }

    /// Path the icon asset is served from.
    pub fn href(self) -> String {
        format!("/assets/logo_{}.svg", self.as_str())
    }
}

impl From<Outcome> for IconKey {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Expected => IconKey::Expected,
            Outcome::Unexpected => IconKey::Unexpected,
            Outcome::Flaky => IconKey::Flaky,
            Outcome::Skipped => IconKey::Skipped,
        }
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageIdentity {
    pub title: String,
    pub icon: IconKey,
    pub icon_href: String,
}

impl PageIdentity {
    pub fn derive(test: Option<&TestCase>) -> Self {
        let (title, icon) = match test {
            Some(test) => (format!("| {}", test.title), IconKey::from(test.outcome)),
            None => (SUMMARY_TITLE.to_string(), IconKey::Default),
        };
        Self {
            title,
            icon_href: icon.href(),
            icon,
        }
    }
}

impl Default for PageIdentity {
    fn default() -> Self {
        Self::derive(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_keys_round_trip_through_asset_names() {
        for icon in IconKey::ALL {
            assert_eq!(IconKey::from_key(icon.as_str()), Some(icon));
        }
        assert_eq!(IconKey::from_key("passed"), None);
    }

    #[test]
    fn test_icon_href() {
        assert_eq!(IconKey::Flaky.href(), "/assets/logo_flaky.svg");
    }

    #[test]
    fn test_summary_identity() {
        let page = PageIdentity::default();
        assert_eq!(page.title, "Playwright Test Report | Summary");
        assert_eq!(page.icon, IconKey::Default);
        assert_eq!(page.icon_href, "/assets/logo_default.svg");
    }
}
