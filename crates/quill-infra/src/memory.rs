//! In-memory repository implementations.
//!
//! Back the no-database fallback mode of the API server and the service-level
//! tests. Semantics mirror the Postgres repositories: the same scope filters,
//! sort keys, and page math apply.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, PostPatch, PostState, User};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, UserRepository};
use quill_core::query::{ListQuery, PostScope, SortKey, SortOrder};

/// In-memory post store. Insertion order is the unsorted result order.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_scope(post: &Post, scope: &PostScope) -> bool {
    match scope {
        PostScope::Public { search } => {
            if post.state != PostState::Published || post.deleted {
                return false;
            }
            match search.as_deref().filter(|t| !t.trim().is_empty()) {
                None => true,
                Some(term) => {
                    let term = term.to_lowercase();
                    post.title.to_lowercase().contains(&term)
                        || post.author_name.to_lowercase().contains(&term)
                        || post
                            .tags
                            .iter()
                            .any(|tag| tag.to_lowercase().contains(&term))
                }
            }
        }
        PostScope::Owner { author_id, state } => {
            post.author_id == *author_id
                && !post.deleted
                && state.is_none_or(|s| post.state == s)
        }
    }
}

fn compare(a: &Post, b: &Post, key: SortKey) -> Ordering {
    match key {
        SortKey::ReadCount => a.read_count.cmp(&b.read_count),
        SortKey::ReadingTime => a.reading_time.cmp(&b.reading_time),
        SortKey::Timestamp => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        posts.push(post.clone());
        Ok(post)
    }

    async fn update_fields(&self, id: Uuid, patch: &PostPatch) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;

        patch.apply(post);
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn set_deleted(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;

        post.deleted = true;
        post.updated_at = Utc::now();
        Ok(())
    }

    async fn increment_read_count(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;

        post.read_count += 1;
        Ok(())
    }

    async fn search(&self, query: &ListQuery) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;
        let mut matching: Vec<Post> = posts
            .iter()
            .filter(|p| matches_scope(p, &query.scope))
            .cloned()
            .collect();

        if let Some((key, order)) = query.sort {
            matching.sort_by(|a, b| match order {
                SortOrder::Asc => compare(a, b, key),
                SortOrder::Desc => compare(b, a, key),
            });
        }

        Ok(matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count(&self, scope: &PostScope) -> Result<u64, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().filter(|p| matches_scope(p, scope)).count() as u64)
    }
}

/// In-memory user store.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_login(&self, email_or_username: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email == email_or_username || u.username == email_or_username)
            .cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RepoError::Constraint("entity already exists".to_string()));
        }

        users.push(user.clone());
        Ok(user)
    }

    async fn append_post(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(RepoError::NotFound)?;

        user.posts.push(post_id);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use quill_core::BlogService;
    use quill_core::domain::NewPost;
    use quill_core::error::DomainError;
    use quill_core::guard::Caller;

    use super::*;

    struct Fixture {
        service: BlogService,
        posts: Arc<InMemoryPostRepository>,
        users: Arc<InMemoryUserRepository>,
    }

    fn fixture() -> Fixture {
        let posts = Arc::new(InMemoryPostRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let service = BlogService::new(posts.clone(), users.clone());
        Fixture {
            service,
            posts,
            users,
        }
    }

    async fn register(fx: &Fixture, username: &str) -> Caller {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "Test".to_string(),
            "User".to_string(),
            "hash".to_string(),
        );
        let user = fx.users.save(user).await.unwrap();
        Caller {
            id: user.id,
            username: user.username,
        }
    }

    fn fields(title: &str, tags: &[&str]) -> NewPost {
        NewPost {
            title: title.to_string(),
            description: "A reasonable description".to_string(),
            body: "word ".repeat(250).trim_end().to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    async fn publish(fx: &Fixture, caller: &Caller, post_id: Uuid) {
        fx.service
            .update(
                caller,
                post_id,
                PostPatch {
                    state: Some(PostState::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_produces_a_clean_draft() {
        let fx = fixture();
        let author = register(&fx, "ada").await;

        let post = fx
            .service
            .create(&author, fields("Analytical engines", &["history"]))
            .await
            .unwrap();

        assert_eq!(post.state, PostState::Draft);
        assert!(!post.deleted);
        assert_eq!(post.read_count, 0);
        assert_eq!(post.reading_time, 3); // 250 words at 100 wpm, rounded up
        assert_eq!(post.author_id, author.id);

        // The denormalized owner list picked up the id.
        let user = fx.users.find_by_id(author.id).await.unwrap().unwrap();
        assert_eq!(user.posts, vec![post.id]);
    }

    #[tokio::test]
    async fn create_collects_every_validation_failure() {
        let fx = fixture();
        let author = register(&fx, "ada").await;

        let bad = NewPost {
            title: "ab".to_string(),
            description: "cd".to_string(),
            body: "ef".to_string(),
            tags: vec![],
        };
        let err = fx.service.create(&author, bad).await.unwrap_err();

        match err {
            DomainError::Validation(errors) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn owner_list_append_failure_does_not_fail_creation() {
        let fx = fixture();
        // A caller whose user record doesn't exist in the store.
        let ghost = Caller {
            id: Uuid::new_v4(),
            username: "ghost".to_string(),
        };

        let post = fx
            .service
            .create(&ghost, fields("Still created", &["misc"]))
            .await
            .unwrap();

        assert!(fx.posts.find_by_id(post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn public_view_of_published_post_counts_the_read() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let post = fx
            .service
            .create(&author, fields("Published piece", &["misc"]))
            .await
            .unwrap();
        publish(&fx, &author, post.id).await;

        let viewed = fx.service.view(None, post.id).await.unwrap();
        assert_eq!(viewed.read_count, 1);

        let viewed = fx.service.view(None, post.id).await.unwrap();
        assert_eq!(viewed.read_count, 2);
    }

    #[tokio::test]
    async fn draft_is_invisible_to_non_authors_but_not_to_the_author() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let reader = register(&fx, "reader").await;
        let post = fx
            .service
            .create(&author, fields("Hidden draft", &["misc"]))
            .await
            .unwrap();

        let err = fx.service.view(Some(&reader), post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let err = fx.service.view(None, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        // The author reads their own draft, and the read still counts.
        let viewed = fx.service.view(Some(&author), post.id).await.unwrap();
        assert_eq!(viewed.read_count, 1);
    }

    #[tokio::test]
    async fn rejected_views_do_not_touch_the_counter() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let reader = register(&fx, "reader").await;
        let post = fx
            .service
            .create(&author, fields("Hidden draft", &["misc"]))
            .await
            .unwrap();

        let _ = fx.service.view(Some(&reader), post.id).await;
        let stored = fx.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.read_count, 0);
    }

    #[tokio::test]
    async fn view_of_missing_post_is_not_found() {
        let fx = fixture();
        let err = fx.service.view(None, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let post = fx
            .service
            .create(&author, fields("Original title", &["misc"]))
            .await
            .unwrap();
        let original_reading_time = post.reading_time;

        let updated = fx
            .service
            .update(
                &author,
                post.id,
                PostPatch {
                    title: Some("Corrected title".to_string()),
                    body: Some("short body".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Corrected title");
        assert_eq!(updated.body, "short body");
        assert_eq!(updated.description, "A reasonable description");
        // The body shrank but the reading time stays as computed at creation.
        assert_eq!(updated.reading_time, original_reading_time);
    }

    #[tokio::test]
    async fn only_the_author_may_update_or_delete() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let stranger = register(&fx, "stranger").await;
        let post = fx
            .service
            .create(&author, fields("Contested post", &["misc"]))
            .await
            .unwrap();

        let err = fx
            .service
            .update(
                &stranger,
                post.id,
                PostPatch {
                    title: Some("Hijacked".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let err = fx.service.soft_delete(&stranger, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn soft_delete_keeps_the_record_and_never_reverses() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let post = fx
            .service
            .create(&author, fields("Doomed post", &["misc"]))
            .await
            .unwrap();

        fx.service.soft_delete(&author, post.id).await.unwrap();

        let stored = fx.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert!(stored.deleted);
        assert_eq!(stored.state, PostState::Draft); // state untouched

        // The second delete is answered by the guard; the flag stays raised.
        let err = fx.service.soft_delete(&author, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Gone));
        let stored = fx.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert!(stored.deleted);
    }

    #[tokio::test]
    async fn deleted_post_is_gone_for_every_action_even_the_author() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let post = fx
            .service
            .create(&author, fields("Doomed post", &["misc"]))
            .await
            .unwrap();
        publish(&fx, &author, post.id).await;
        fx.service.soft_delete(&author, post.id).await.unwrap();

        let err = fx.service.view(None, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Gone));

        let err = fx.service.view(Some(&author), post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Gone));

        let err = fx
            .service
            .update(
                &author,
                post.id,
                PostPatch {
                    title: Some("Too late".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Gone));
    }

    #[tokio::test]
    async fn public_listing_sees_only_published_non_deleted_posts() {
        let fx = fixture();
        let author = register(&fx, "ada").await;

        let draft = fx
            .service
            .create(&author, fields("A draft", &["misc"]))
            .await
            .unwrap();
        let published = fx
            .service
            .create(&author, fields("Published piece", &["misc"]))
            .await
            .unwrap();
        publish(&fx, &author, published.id).await;
        let deleted = fx
            .service
            .create(&author, fields("Deleted piece", &["misc"]))
            .await
            .unwrap();
        publish(&fx, &author, deleted.id).await;
        fx.service.soft_delete(&author, deleted.id).await.unwrap();

        let query = ListQuery::new(
            PostScope::Public { search: None },
            None,
            None,
            None,
            None,
        );
        let page = fx.service.list(&query).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, published.id);
        assert!(!page.items.iter().any(|p| p.id == draft.id));
    }

    #[tokio::test]
    async fn search_matches_tags_case_insensitively() {
        let fx = fixture();
        let author = register(&fx, "ada").await;

        let tagged = fx
            .service
            .create(&author, fields("Nothing in the title", &["Cat", "pets"]))
            .await
            .unwrap();
        publish(&fx, &author, tagged.id).await;
        let other = fx
            .service
            .create(&author, fields("Dog diaries", &["dogs"]))
            .await
            .unwrap();
        publish(&fx, &author, other.id).await;

        let query = ListQuery::new(
            PostScope::Public {
                search: Some("cat".to_string()),
            },
            None,
            None,
            None,
            None,
        );
        let page = fx.service.list(&query).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, tagged.id);
    }

    #[tokio::test]
    async fn search_matches_author_display_name() {
        let fx = fixture();
        let author = register(&fx, "grace").await;
        let post = fx
            .service
            .create(&author, fields("Compilers in practice", &["plt"]))
            .await
            .unwrap();
        publish(&fx, &author, post.id).await;

        let query = ListQuery::new(
            PostScope::Public {
                search: Some("GRACE".to_string()),
            },
            None,
            None,
            None,
            None,
        );
        let page = fx.service.list(&query).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn pagination_math_follows_the_envelope_contract() {
        let fx = fixture();
        let author = register(&fx, "ada").await;

        for i in 0..25 {
            let post = fx
                .service
                .create(&author, fields(&format!("Post number {i}"), &["misc"]))
                .await
                .unwrap();
            publish(&fx, &author, post.id).await;
        }

        let scope = PostScope::Public { search: None };
        let page = fx
            .service
            .list(&ListQuery::new(scope.clone(), Some(3), Some(10), None, None))
            .await
            .unwrap();
        assert_eq!(page.total, 5); // items in this page
        assert_eq!(page.total_pages, 3); // from the global count
        assert_eq!(page.current_page, 3);

        // A page past the end is empty but keeps the global page count.
        let page = fx
            .service
            .list(&ListQuery::new(scope, Some(5), Some(10), None, None))
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn timestamp_desc_returns_newest_first() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let base = Utc::now();

        for i in 0..3 {
            let mut post = Post::new(
                author.id,
                author.username.clone(),
                fields(&format!("Post number {i}"), &["misc"]),
            );
            post.state = PostState::Published;
            post.created_at = base + Duration::seconds(i);
            fx.posts.insert(post).await.unwrap();
        }

        let query = ListQuery::new(
            PostScope::Public { search: None },
            None,
            None,
            Some("timestamp"),
            Some("desc"),
        );
        let page = fx.service.list(&query).await.unwrap();

        assert_eq!(page.items[0].title, "Post number 2");
        assert_eq!(page.items[2].title, "Post number 0");
    }

    #[tokio::test]
    async fn read_count_ordering_uses_the_counter() {
        let fx = fixture();
        let author = register(&fx, "ada").await;

        let quiet = fx
            .service
            .create(&author, fields("Quiet post", &["misc"]))
            .await
            .unwrap();
        publish(&fx, &author, quiet.id).await;
        let popular = fx
            .service
            .create(&author, fields("Popular post", &["misc"]))
            .await
            .unwrap();
        publish(&fx, &author, popular.id).await;

        for _ in 0..5 {
            fx.service.view(None, popular.id).await.unwrap();
        }

        let query = ListQuery::new(
            PostScope::Public { search: None },
            None,
            None,
            Some("read_count"),
            Some("desc"),
        );
        let page = fx.service.list(&query).await.unwrap();
        assert_eq!(page.items[0].id, popular.id);
    }

    #[tokio::test]
    async fn owner_listing_includes_drafts_and_honors_the_state_filter() {
        let fx = fixture();
        let author = register(&fx, "ada").await;
        let other = register(&fx, "other").await;

        let draft = fx
            .service
            .create(&author, fields("My draft", &["misc"]))
            .await
            .unwrap();
        let published = fx
            .service
            .create(&author, fields("My published", &["misc"]))
            .await
            .unwrap();
        publish(&fx, &author, published.id).await;
        fx.service
            .create(&other, fields("Someone else's", &["misc"]))
            .await
            .unwrap();

        let all_mine = ListQuery::new(
            PostScope::Owner {
                author_id: author.id,
                state: None,
            },
            None,
            None,
            None,
            None,
        );
        let page = fx.service.list(&all_mine).await.unwrap();
        assert_eq!(page.total, 2);

        let drafts_only = ListQuery::new(
            PostScope::Owner {
                author_id: author.id,
                state: Some(PostState::Draft),
            },
            None,
            None,
            None,
            None,
        );
        let page = fx.service.list(&drafts_only).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, draft.id);
    }

    #[tokio::test]
    async fn unknown_sort_field_yields_insertion_order() {
        let fx = fixture();
        let author = register(&fx, "ada").await;

        for i in 0..3 {
            let post = fx
                .service
                .create(&author, fields(&format!("Post number {i}"), &["misc"]))
                .await
                .unwrap();
            publish(&fx, &author, post.id).await;
        }

        let query = ListQuery::new(
            PostScope::Public { search: None },
            None,
            None,
            Some("author_name"),
            Some("asc"),
        );
        let page = fx.service.list(&query).await.unwrap();
        assert_eq!(page.items[0].title, "Post number 0");
        assert_eq!(page.items[2].title, "Post number 2");
    }
}
