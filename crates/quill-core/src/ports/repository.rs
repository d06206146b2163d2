use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, PostPatch, User};
use crate::error::RepoError;
use crate::query::{ListQuery, PostScope};

/// Post store. Single-record mutations must be atomic at record granularity;
/// no cross-record transactions are required.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    async fn insert(&self, post: Post) -> Result<Post, RepoError>;

    /// Apply a partial update and return the updated record.
    async fn update_fields(&self, id: Uuid, patch: &PostPatch) -> Result<Post, RepoError>;

    /// Raise the soft-delete flag. The record is never physically removed.
    async fn set_deleted(&self, id: Uuid) -> Result<(), RepoError>;

    /// Atomically add 1 to the read counter.
    async fn increment_read_count(&self, id: Uuid) -> Result<(), RepoError>;

    /// One sorted, offset-skipped, limit-capped page of matching posts.
    async fn search(&self, query: &ListQuery) -> Result<Vec<Post>, RepoError>;

    /// Global count of posts matching a scope, for page math.
    async fn count(&self, scope: &PostScope) -> Result<u64, RepoError>;
}

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find a user by email or username, for login.
    async fn find_by_login(&self, email_or_username: &str) -> Result<Option<User>, RepoError>;

    async fn save(&self, user: User) -> Result<User, RepoError>;

    /// Append a post id to the user's denormalized posts list.
    async fn append_post(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError>;
}
