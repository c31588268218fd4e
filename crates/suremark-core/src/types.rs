use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Maximum length of an extracted title, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum length of extracted body content, in characters.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// Best-effort description of the content behind a URL.
///
/// Produced once per processing attempt by the extractor and folded into a
/// `processed_posts` row at the terminal state. Fields the page did not yield
/// are `None` — never empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostData {
    pub url: String,
    pub platform: Platform,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    /// When the extraction ran. Always set, even for placeholder records.
    pub captured_at: DateTime<Utc>,
    /// SureMark username the announcement is attributed to. Supplied by the
    /// caller at the orchestration layer, not read from the page.
    pub suremark_username: Option<String>,
}

/// Truncate `input` to at most `max` characters (Unicode scalars, so the cut
/// never lands inside a multi-byte sequence).
#[must_use]
pub fn truncate_chars(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        input.to_string()
    } else {
        input.chars().take(max).collect()
    }
}
