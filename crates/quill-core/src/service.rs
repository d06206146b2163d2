//! Post lifecycle service.
//!
//! Orchestrates validation, the authorization guard, and the post store for
//! every post operation. All identity is passed in explicitly; there is no
//! ambient session.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{NewPost, Post, PostPatch};
use crate::error::DomainError;
use crate::guard::{self, Action, Caller};
use crate::ports::{PostRepository, UserRepository};
use crate::query::{ListQuery, Page};
use crate::validate::ContentLimits;

pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    limits: ContentLimits,
}

impl BlogService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            posts,
            users,
            limits: ContentLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ContentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Create a new draft owned by the caller.
    ///
    /// Field violations are collected across all fields and returned in one
    /// validation error. The denormalized owner-list append is best-effort:
    /// its failure is logged but never rolls back the created post.
    pub async fn create(&self, caller: &Caller, fields: NewPost) -> Result<Post, DomainError> {
        let errors = self.limits.check(&fields);
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let post = Post::new(caller.id, caller.username.clone(), fields);
        let post = self.posts.insert(post).await?;

        if let Err(err) = self.users.append_post(caller.id, post.id).await {
            tracing::warn!(
                user_id = %caller.id,
                post_id = %post.id,
                error = %err,
                "failed to append post to owner's denormalized list"
            );
        }

        tracing::info!(post_id = %post.id, author = %caller.username, "post created");
        Ok(post)
    }

    /// Load a post for viewing and count the read.
    ///
    /// The author reads through `ReadAsOwner` (drafts included); everyone
    /// else through the public `Read` path. Any successful view increments
    /// the read counter by exactly 1.
    pub async fn view(&self, caller: Option<&Caller>, post_id: Uuid) -> Result<Post, DomainError> {
        let mut post = self.load(post_id).await?;

        let action = match caller {
            Some(c) if c.id == post.author_id => Action::ReadAsOwner,
            _ => Action::Read,
        };
        guard::authorize(caller, &post, action).map_err(|d| d.into_error(post_id))?;

        self.posts.increment_read_count(post_id).await?;
        post.read_count += 1;
        Ok(post)
    }

    /// Apply a partial update to the caller's own post.
    ///
    /// Only fields present in the patch are touched; the reading time is
    /// never recomputed, even when the body changes.
    pub async fn update(
        &self,
        caller: &Caller,
        post_id: Uuid,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        let post = self.load(post_id).await?;
        guard::authorize(Some(caller), &post, Action::Update)
            .map_err(|d| d.into_error(post_id))?;

        if patch.is_empty() {
            return Ok(post);
        }

        let updated = self.posts.update_fields(post_id, &patch).await?;
        Ok(updated)
    }

    /// Soft-delete the caller's own post. The record stays in the store with
    /// its read history; a repeated call is answered by the guard (`Gone`)
    /// and the flag never goes back to false.
    pub async fn soft_delete(&self, caller: &Caller, post_id: Uuid) -> Result<(), DomainError> {
        let post = self.load(post_id).await?;
        guard::authorize(Some(caller), &post, Action::Delete)
            .map_err(|d| d.into_error(post_id))?;

        self.posts.set_deleted(post_id).await?;
        tracing::info!(post_id = %post_id, "post soft-deleted");
        Ok(())
    }

    /// Run a listing query and assemble the paginated envelope. An empty
    /// page is a valid result, never an error.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Post>, DomainError> {
        let items = self.posts.search(query).await?;
        let matching = self.posts.count(&query.scope).await?;
        Ok(Page::assemble(items, matching, query))
    }

    async fn load(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::not_found("post", post_id))
    }
}
