//! Maps a URL's host to the platform the content lives on.

use serde::{Deserialize, Serialize};
use url::Url;

/// Platform tag assigned to every URL before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Youtube,
    Instagram,
    Website,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Website => "website",
        }
    }

    /// Parse the lowercase tag produced by [`Platform::as_str`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "twitter" => Some(Platform::Twitter),
            "youtube" => Some(Platform::Youtube),
            "instagram" => Some(Platform::Instagram),
            "website" => Some(Platform::Website),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain table walked in order; first match wins, so overlapping domains
/// (e.g. `youtube.com` vs `youtu.be`) keep a deterministic precedence.
const DOMAIN_TABLE: &[(&str, Platform)] = &[
    ("twitter.com", Platform::Twitter),
    ("x.com", Platform::Twitter),
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("instagram.com", Platform::Instagram),
];

/// Classify a parsed URL by host.
///
/// The host is matched case-insensitively as a substring, so subdomains
/// (`www.`, `m.`, `mobile.`) resolve to the same platform. Hosts matching no
/// table entry, and URLs without a host at all, classify as
/// [`Platform::Website`].
#[must_use]
pub fn classify(url: &Url) -> Platform {
    let Some(host) = url.host_str() else {
        return Platform::Website;
    };
    let host = host.to_ascii_lowercase();

    for (domain, platform) in DOMAIN_TABLE {
        if host.contains(domain) {
            return *platform;
        }
    }

    Platform::Website
}
