//! Per-platform extraction strategies and the dispatch registry.

use suremark_core::Platform;
use url::Url;

use crate::html;

/// Fields read for one URL, before truncation.
#[derive(Debug, Default)]
pub(crate) struct PageFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
}

/// How a platform's content is obtained.
pub(crate) enum StrategyKind {
    /// Fetch the page and read fields out of the markup.
    FetchBased { read: fn(&str) -> PageFields },
    /// Derive a record from the URL path alone; never touches the network.
    IdentifierBased { derive: fn(&Url) -> Option<PageFields> },
}

pub(crate) struct Strategy {
    pub kind: StrategyKind,
    pub placeholder_title: &'static str,
    pub placeholder_content: &'static str,
}

const WEBSITE: Strategy = Strategy {
    kind: StrategyKind::FetchBased {
        read: read_website_fields,
    },
    placeholder_title: "Website Content",
    placeholder_content: "Content from website",
};

/// Platform → strategy. Adding a platform means adding a row here; nothing
/// upstream branches on tags. Platforms without a row use the website
/// strategy.
const REGISTRY: &[(Platform, Strategy)] = &[
    (
        Platform::Twitter,
        Strategy {
            kind: StrategyKind::IdentifierBased {
                derive: derive_tweet_fields,
            },
            placeholder_title: "Twitter Post",
            placeholder_content: "Content from Twitter",
        },
    ),
    (
        Platform::Youtube,
        Strategy {
            kind: StrategyKind::FetchBased {
                read: read_youtube_fields,
            },
            placeholder_title: "YouTube Video",
            placeholder_content: "Video content from YouTube",
        },
    ),
    (
        Platform::Instagram,
        Strategy {
            kind: StrategyKind::FetchBased {
                read: read_instagram_fields,
            },
            placeholder_title: "Instagram Post",
            placeholder_content: "Content from Instagram",
        },
    ),
    (Platform::Website, WEBSITE),
];

pub(crate) fn strategy_for(platform: Platform) -> &'static Strategy {
    REGISTRY
        .iter()
        .find(|(p, _)| *p == platform)
        .map_or(&WEBSITE, |(_, s)| s)
}

fn read_website_fields(html: &str) -> PageFields {
    PageFields {
        title: html::og_title(html)
            .or_else(|| html::document_title(html))
            .or_else(|| html::first_h1(html)),
        content: html::og_description(html)
            .or_else(|| html::meta_description(html))
            .or_else(|| html::first_paragraph(html)),
        author: html::meta_author(html)
            .or_else(|| html::author_element(html))
            .or_else(|| html::data_author(html)),
    }
}

fn read_youtube_fields(html: &str) -> PageFields {
    PageFields {
        title: html::og_title(html)
            .or_else(|| html::document_title(html))
            .or_else(|| html::first_h1(html)),
        content: html::og_description(html)
            .or_else(|| html::meta_description(html))
            .or_else(|| html::first_paragraph(html)),
        // Video pages carry the channel name in an itemprop link, not an
        // author meta tag.
        author: html::itemprop_link_name(html).or_else(|| html::meta_author(html)),
    }
}

fn read_instagram_fields(html: &str) -> PageFields {
    let title = html::og_title(html)
        .or_else(|| html::document_title(html))
        .or_else(|| html::first_h1(html));
    // Post pages put the poster's handle inside the og:title, e.g.
    // "Jane Doe (@jane.doe) • Instagram photos and videos".
    let author = title
        .as_deref()
        .and_then(html::parenthesised_handle)
        .or_else(|| html::meta_author(html));
    PageFields {
        title,
        content: html::og_description(html)
            .or_else(|| html::meta_description(html))
            .or_else(|| html::first_paragraph(html)),
        author,
    }
}

/// Read the post identifier (and, when present, the posting user) out of a
/// `/{user}/status/{id}` path. Returns `None` when the path carries no
/// `status` segment or the segment after it is empty.
fn derive_tweet_fields(url: &Url) -> Option<PageFields> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    let status_pos = segments.iter().position(|s| *s == "status")?;
    let id = segments
        .get(status_pos + 1)
        .filter(|s| !s.is_empty())?;

    let author = (status_pos > 0).then(|| segments[status_pos - 1].to_string());

    Some(PageFields {
        title: Some("Twitter Post".to_string()),
        content: Some(format!("Tweet {id}")),
        author,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("test URL should parse")
    }

    #[test]
    fn tweet_fields_embed_the_status_identifier() {
        let fields = derive_tweet_fields(&url("https://x.com/someuser/status/42")).unwrap();
        assert_eq!(fields.content.as_deref(), Some("Tweet 42"));
        assert_eq!(fields.author.as_deref(), Some("someuser"));
    }

    #[test]
    fn tweet_fields_require_a_status_segment() {
        assert!(derive_tweet_fields(&url("https://x.com/someuser")).is_none());
        assert!(derive_tweet_fields(&url("https://x.com/someuser/status/")).is_none());
        assert!(derive_tweet_fields(&url("https://x.com/")).is_none());
    }

    #[test]
    fn tweet_fields_tolerate_missing_user_segment() {
        let fields = derive_tweet_fields(&url("https://x.com/status/987")).unwrap();
        assert_eq!(fields.content.as_deref(), Some("Tweet 987"));
        assert!(fields.author.is_none());
    }

    #[test]
    fn registry_resolves_every_platform() {
        for platform in [
            Platform::Twitter,
            Platform::Youtube,
            Platform::Instagram,
            Platform::Website,
        ] {
            let strategy = strategy_for(platform);
            assert!(!strategy.placeholder_title.is_empty());
        }
    }

    #[test]
    fn website_fields_prefer_open_graph() {
        let html = r#"
            <title>Doc Title</title>
            <meta property="og:title" content="OG Title">
            <meta name="description" content="Meta description text">
            <meta property="og:description" content="OG description text">
            <h1>Heading</h1>
        "#;
        let fields = read_website_fields(html);
        assert_eq!(fields.title.as_deref(), Some("OG Title"));
        assert_eq!(fields.content.as_deref(), Some("OG description text"));
    }

    #[test]
    fn website_fields_fall_through_title_chain() {
        let html = "<h1>Only a Heading</h1><p>A paragraph long enough to be content.</p>";
        let fields = read_website_fields(html);
        assert_eq!(fields.title.as_deref(), Some("Only a Heading"));
        assert_eq!(
            fields.content.as_deref(),
            Some("A paragraph long enough to be content.")
        );
        assert!(fields.author.is_none());
    }

    #[test]
    fn youtube_fields_take_channel_name_from_itemprop_link() {
        let html = r#"
            <meta property="og:title" content="Great Video">
            <link itemprop="name" content="Great Channel">
        "#;
        let fields = read_youtube_fields(html);
        assert_eq!(fields.author.as_deref(), Some("Great Channel"));
    }

    #[test]
    fn instagram_fields_parse_handle_from_og_title() {
        let html = r#"<meta property="og:title" content="Jane (@jane.doe) • Instagram photos">"#;
        let fields = read_instagram_fields(html);
        assert_eq!(fields.author.as_deref(), Some("jane.doe"));
    }
}
