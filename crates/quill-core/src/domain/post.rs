use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visibility lifecycle state of a post. Soft deletion is tracked separately
/// on [`Post::deleted`] so that a deleted draft stays a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    #[default]
    Draft,
    Published,
}

impl PostState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    /// Parse a state filter value. Anything outside the known set is ignored
    /// rather than rejected, so callers get `None` instead of an error.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// Post entity - a blog entry with content, author, visibility state, and
/// soft-delete flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Display name of the author, denormalized onto the post so listings and
    /// search don't join through the user record.
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<String>,
    pub state: PostState,
    pub deleted: bool,
    pub read_count: i64,
    /// Minutes to read, computed once at creation and never recomputed.
    pub reading_time: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated content fields for a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// Partial update for a post. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
    pub state: Option<PostState>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.body.is_none()
            && self.tags.is_none()
            && self.state.is_none()
    }

    /// Apply the present fields onto a post.
    pub fn apply(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(description) = &self.description {
            post.description = description.clone();
        }
        if let Some(body) = &self.body {
            post.body = body.clone();
        }
        if let Some(tags) = &self.tags {
            post.tags = tags.clone();
        }
        if let Some(state) = self.state {
            post.state = state;
        }
    }
}

impl Post {
    /// Create a new draft with generated ID and timestamps.
    pub fn new(author_id: Uuid, author_name: String, fields: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            author_name,
            reading_time: reading_time(&fields.body),
            title: fields.title,
            description: fields.description,
            body: fields.body,
            tags: fields.tags,
            state: PostState::Draft,
            deleted: false,
            read_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Estimate reading time in minutes: ceiling of whitespace-separated word
/// count over 100 words per minute.
pub fn reading_time(body: &str) -> i64 {
    let words = body.split_whitespace().count() as u64;
    words.div_ceil(100) as i64
}
