//! Ordered fallback strategies for reading a profile page.
//!
//! Each table is walked front to back and the first strategy that yields
//! non-empty text wins. Markup changes are absorbed by appending strategies
//! rather than by changing the walk.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::browser::{BrowserPage, ElementHandle};
use crate::error::FetchError;
use crate::types::{PostRecord, MAX_POSTS};

#[derive(Debug)]
pub enum Strategy {
    /// Text content of the first element matching a CSS selector.
    Css(&'static str),
    /// First match of a pattern in the rendered page text.
    TextPattern(&'static LazyLock<Regex>),
}

static FOLLOWERS_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d[\d.,]*\s*[km]?\s*followers").expect("valid regex")
});

static VIEWS_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d[\d.,]*\s*[km]?\s*views").expect("valid regex"));

/// Any one of these being present means the profile rendered.
pub const MAIN_CONTENT_SELECTORS: &[&str] = &[
    r#"div[role="main"]"#,
    "main",
    "article",
    "div._aagv",
    r#"div[style*="padding-bottom: 100%"]"#,
];

pub static FOLLOWER_STRATEGIES: &[Strategy] = &[
    Strategy::TextPattern(&FOLLOWERS_TEXT),
    Strategy::Css(r#"div[role="main"] ul li:nth-child(2) span"#),
    Strategy::Css(r#"div[role="main"] ul li:nth-child(2) a span"#),
    Strategy::Css("div._aacl._aaco._aacw._aacx._aad6._aade"),
];

pub static BIO_STRATEGIES: &[Strategy] = &[
    Strategy::Css("div._aa_c"),
    Strategy::Css(r#"div[role="main"] div._aa_c"#),
    Strategy::Css(r#"div[role="main"] div._aacl._aaco._aacu._aacx._aad6._aade"#),
    Strategy::Css("div._aacl._aaco._aacu._aacx._aad6._aade"),
];

pub static VIEW_STRATEGIES: &[Strategy] = &[Strategy::TextPattern(&VIEWS_TEXT)];

pub const POST_IMAGES: &str = r#"article img, div[role="main"] img, div._aagv img"#;
pub const POST_DIALOG: &str = r#"div[role="dialog"]"#;

/// Text of the first strategy that matches, trimmed. `None` when none do.
///
/// Strategy errors are logged and treated as a miss.
pub async fn first_match(page: &dyn BrowserPage, strategies: &[Strategy]) -> Option<String> {
    for strategy in strategies {
        match run_strategy(page, strategy).await {
            Ok(Some(text)) => return Some(text),
            Ok(None) => {}
            Err(e) => tracing::debug!(?strategy, error = %e, "extraction strategy failed"),
        }
    }
    None
}

async fn run_strategy(page: &dyn BrowserPage, strategy: &Strategy) -> Result<Option<String>, FetchError> {
    let text = match strategy {
        Strategy::Css(selector) => match page.locate(selector).await? {
            Some(element) => element.text_content().await?,
            None => None,
        },
        Strategy::TextPattern(pattern) => {
            let body = page.body_text().await?;
            pattern.find(&body).map(|m| m.as_str().to_string())
        }
    };
    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Waits for the first main-content selector to appear, each for up to `timeout`.
///
/// # Errors
///
/// [`FetchError::ExtractionNotFound`] when none appears; browser errors are propagated.
pub async fn wait_for_main_content(
    page: &dyn BrowserPage,
    handle: &str,
    timeout: Duration,
) -> Result<&'static str, FetchError> {
    for &selector in MAIN_CONTENT_SELECTORS {
        if page.wait_for_selector(selector, timeout).await? {
            tracing::debug!(handle, selector, "main content found");
            return Ok(selector);
        }
    }
    Err(FetchError::ExtractionNotFound {
        handle: handle.to_string(),
    })
}

/// Reads up to [`MAX_POSTS`] posts from the profile grid.
///
/// A post whose dialog cannot be opened or read keeps its image fields and
/// gets no view count.
pub async fn extract_posts(page: &dyn BrowserPage, timeout: Duration) -> Vec<PostRecord> {
    let images = match page.locate_all(POST_IMAGES).await {
        Ok(images) => images,
        Err(e) => {
            tracing::debug!(error = %e, "post grid not readable");
            return Vec::new();
        }
    };

    let mut posts = Vec::with_capacity(images.len().min(MAX_POSTS));
    for (i, image) in images.iter().take(MAX_POSTS).enumerate() {
        let url = image.get_attribute("src").await.ok().flatten();
        let alt_text = image.get_attribute("alt").await.ok().flatten();
        let view_count = match read_post_views(page, image.as_ref(), timeout).await {
            Ok(views) => views,
            Err(e) => {
                tracing::debug!(post = i + 1, error = %e, "post views unavailable");
                None
            }
        };
        posts.push(PostRecord {
            url,
            alt_text,
            view_count,
        });
    }
    posts
}

async fn read_post_views(
    page: &dyn BrowserPage,
    image: &dyn ElementHandle,
    timeout: Duration,
) -> Result<Option<String>, FetchError> {
    image.click().await?;
    if !page.wait_for_selector(POST_DIALOG, timeout).await? {
        return Err(FetchError::ElementRead {
            selector: POST_DIALOG.to_string(),
            reason: "post dialog did not open".to_string(),
        });
    }
    let views = first_match(page, VIEW_STRATEGIES).await;
    page.press_escape().await?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follower_pattern_accepts_suffixed_counts() {
        let m = FOLLOWERS_TEXT.find("Posts 120 · 12.3K followers · 80 following");
        assert_eq!(m.map(|m| m.as_str()), Some("12.3K followers"));
        let m = FOLLOWERS_TEXT.find("1,204 Followers");
        assert_eq!(m.map(|m| m.as_str()), Some("1,204 Followers"));
    }

    #[test]
    fn views_pattern_matches_plain_and_suffixed() {
        assert_eq!(
            VIEWS_TEXT.find("Liked by x · 845 views").map(|m| m.as_str()),
            Some("845 views")
        );
        assert_eq!(
            VIEWS_TEXT.find("1.2M views").map(|m| m.as_str()),
            Some("1.2M views")
        );
        assert!(VIEWS_TEXT.find("no counters here").is_none());
    }

    #[test]
    fn tables_keep_their_order() {
        assert_eq!(MAIN_CONTENT_SELECTORS[0], r#"div[role="main"]"#);
        assert!(matches!(FOLLOWER_STRATEGIES[0], Strategy::TextPattern(_)));
        assert!(matches!(BIO_STRATEGIES[0], Strategy::Css("div._aa_c")));
    }
}
