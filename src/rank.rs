//! Pure filter/rank stage: raw feed entries in, at most six ranked [`Post`]s out.

use std::sync::LazyLock;

use regex::Regex;

use crate::feed::RawEntry;

/// Ranked posts are truncated to this many per cycle.
pub const MAX_POSTS_PER_CYCLE: usize = 6;

static TITLE_FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^0-9a-zA-Z ]+").expect("title filter regex is valid"));

/// One accepted candidate post. Immutable after construction; the sanitized
/// title doubles as the stored filename stem.
#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    pub url: String,
    pub score: i64,
}

impl Post {
    pub fn from_entry(entry: &RawEntry) -> Self {
        Self {
            title: sanitize_title(&entry.title),
            url: entry.url.clone(),
            score: entry.ups,
        }
    }

    /// File extension for the downloaded media: `png` iff the URL mentions
    /// `.png`, `jpg` otherwise.
    pub fn extension(&self) -> &'static str {
        if self.url.contains(".png") {
            "png"
        } else {
            "jpg"
        }
    }

    /// `<sanitized title>.<ext>`, the name the download stage stores under.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.title, self.extension())
    }
}

/// Strips every character outside `[0-9a-zA-Z ]`. Titles are used as path
/// components, so this must run before any filesystem use. Idempotent.
pub fn sanitize_title(raw: &str) -> String {
    TITLE_FILTER.replace_all(raw, "").into_owned()
}

/// True when the URL points at an image file directly.
pub fn is_direct_image_url(url: &str) -> bool {
    url.contains(".png") || url.contains(".jpg")
}

/// Converts raw entries into posts, drops entries below the upvote threshold
/// unless their URL is a direct image link, ranks by score descending, and
/// keeps at most [`MAX_POSTS_PER_CYCLE`].
pub fn filter_and_rank(entries: &[RawEntry], upvote_threshold: i64) -> Vec<Post> {
    let mut posts: Vec<Post> = entries
        .iter()
        .filter(|entry| entry.ups >= upvote_threshold || is_direct_image_url(&entry.url))
        .map(Post::from_entry)
        .collect();

    posts.sort_by(|a, b| b.score.cmp(&a.score));
    posts.truncate(MAX_POSTS_PER_CYCLE);
    posts
}
