//! Records produced by a successful profile fetch.

use serde::Serialize;

/// Maximum number of posts collected per profile.
pub const MAX_POSTS: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    /// Raw follower text as rendered on the page, e.g. `"12.3k followers"`.
    pub followers: Option<String>,
    /// Empty when no bio strategy matched.
    pub bio: String,
    pub posts: Vec<PostRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub url: Option<String>,
    pub alt_text: Option<String>,
    /// Raw view text from the post dialog, e.g. `"1.2k views"`.
    pub view_count: Option<String>,
}
