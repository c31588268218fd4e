//! Builds the "verified by" announcement text for each platform.

use std::collections::HashMap;

use crate::platform::Platform;

/// Placeholder replaced with `@` + the SureMark username.
pub const USERNAME_PLACEHOLDER: &str = "{suremark_username}";

/// Placeholder replaced with the verification dashboard link.
pub const DASHBOARD_PLACEHOLDER: &str = "{dashboard_url}";

/// Per-platform announcement templates plus a default for unmapped platforms.
///
/// Each template contains one `{suremark_username}` and one `{dashboard_url}`
/// placeholder. The set is an explicit value passed to whoever composes
/// messages, so tests can supply their own templates without touching shared
/// state.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: HashMap<Platform, String>,
    default_template: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            Platform::Twitter,
            "This post by {suremark_username} is verified through SureMark. \
             Verification record: {dashboard_url}"
                .to_string(),
        );
        templates.insert(
            Platform::Youtube,
            "This video by {suremark_username} is verified through SureMark. \
             Verification record: {dashboard_url}"
                .to_string(),
        );
        templates.insert(
            Platform::Instagram,
            "This photo by {suremark_username} is verified through SureMark. \
             Verification record: {dashboard_url}"
                .to_string(),
        );
        Self {
            templates,
            default_template: "This content by {suremark_username} is verified through \
                               SureMark. Verification record: {dashboard_url}"
                .to_string(),
        }
    }
}

impl TemplateSet {
    #[must_use]
    pub fn new(templates: HashMap<Platform, String>, default_template: impl Into<String>) -> Self {
        Self {
            templates,
            default_template: default_template.into(),
        }
    }

    /// The template used for `platform`: the platform-specific entry if one
    /// exists, else the default.
    #[must_use]
    pub fn template_for(&self, platform: Platform) -> &str {
        self.templates
            .get(&platform)
            .map_or(self.default_template.as_str(), String::as_str)
    }

    /// Produce the final announcement text.
    ///
    /// `override_template` skips the per-platform lookup entirely but still
    /// receives placeholder substitution. The username placeholder becomes
    /// `@` + `suremark_username`; the dashboard placeholder becomes
    /// `dashboard_url` verbatim. Only the first occurrence of each
    /// placeholder is replaced — templates carry each exactly once.
    ///
    /// Length is not validated here; the posting client enforces the
    /// platform limit before any network call.
    #[must_use]
    pub fn compose(
        &self,
        platform: Platform,
        suremark_username: &str,
        dashboard_url: &str,
        override_template: Option<&str>,
    ) -> String {
        let template = override_template.unwrap_or_else(|| self.template_for(platform));
        let handle = format!("@{suremark_username}");
        template
            .replacen(USERNAME_PLACEHOLDER, &handle, 1)
            .replacen(DASHBOARD_PLACEHOLDER, dashboard_url, 1)
    }
}
