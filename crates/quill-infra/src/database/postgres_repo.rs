//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use quill_core::domain::{Post, PostPatch, PostState, User};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, UserRepository};
use quill_core::query::{ListQuery, PostScope, SortKey, SortOrder};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn query_err(e: DbErr) -> RepoError {
    match e {
        DbErr::RecordNotFound(_) => RepoError::NotFound,
        other => {
            let msg = other.to_string();
            if msg.contains("duplicate") || msg.contains("unique") {
                RepoError::Constraint("entity already exists".to_string())
            } else {
                RepoError::Query(msg)
            }
        }
    }
}

/// Escape LIKE wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Translate a listing scope into a store filter.
///
/// The public scope always carries the mandatory visibility predicate; the
/// search term ANDs onto it as a case-insensitive substring match over title,
/// author display name, and the tag array.
fn scope_condition(scope: &PostScope) -> Condition {
    match scope {
        PostScope::Public { search } => {
            let mut cond = Condition::all()
                .add(post::Column::State.eq(PostState::Published.as_str()))
                .add(post::Column::Deleted.eq(false));

            if let Some(term) = search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = format!("%{}%", escape_like(term));
                cond = cond.add(
                    Condition::any()
                        .add(Expr::col(post::Column::Title).ilike(pattern.clone()))
                        .add(Expr::col(post::Column::AuthorName).ilike(pattern.clone()))
                        .add(Expr::cust_with_values("tags::text ILIKE ?", [pattern])),
                );
            }
            cond
        }
        PostScope::Owner { author_id, state } => {
            let mut cond = Condition::all()
                .add(post::Column::AuthorId.eq(*author_id))
                .add(post::Column::Deleted.eq(false));

            if let Some(state) = state {
                cond = cond.add(post::Column::State.eq(state.as_str()));
            }
            cond
        }
    }
}

fn sort_column(key: SortKey) -> post::Column {
    match key {
        SortKey::ReadCount => post::Column::ReadCount,
        SortKey::ReadingTime => post::Column::ReadingTime,
        SortKey::Timestamp => post::Column::CreatedAt,
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let active: post::ActiveModel = post.into();
        let model = active.insert(&self.db).await.map_err(query_err)?;
        Ok(model.into())
    }

    async fn update_fields(&self, id: Uuid, patch: &PostPatch) -> Result<Post, RepoError> {
        fn set_or_skip<T: Into<sea_orm::Value>>(value: Option<T>) -> sea_orm::ActiveValue<T> {
            value.map(Set).unwrap_or(NotSet)
        }

        let active = post::ActiveModel {
            id: Unchanged(id),
            title: set_or_skip(patch.title.clone()),
            description: set_or_skip(patch.description.clone()),
            body: set_or_skip(patch.body.clone()),
            tags: set_or_skip(patch.tags.as_ref().map(|t| serde_json::json!(t))),
            state: set_or_skip(patch.state.map(|s| s.as_str().to_string())),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active.update(&self.db).await.map_err(query_err)?;
        Ok(model.into())
    }

    async fn set_deleted(&self, id: Uuid) -> Result<(), RepoError> {
        PostEntity::update_many()
            .col_expr(post::Column::Deleted, Expr::value(true))
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }

    async fn increment_read_count(&self, id: Uuid) -> Result<(), RepoError> {
        // Single-statement increment keeps the counter atomic under
        // concurrent views.
        PostEntity::update_many()
            .col_expr(
                post::Column::ReadCount,
                Expr::col(post::Column::ReadCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }

    async fn search(&self, query: &ListQuery) -> Result<Vec<Post>, RepoError> {
        let mut select = PostEntity::find().filter(scope_condition(&query.scope));

        if let Some((key, order)) = query.sort {
            let direction = match order {
                SortOrder::Asc => Order::Asc,
                SortOrder::Desc => Order::Desc,
            };
            select = select.order_by(sort_column(key), direction);
        }

        let models = select
            .offset(query.offset())
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count(&self, scope: &PostScope) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(scope_condition(scope))
            .count(&self.db)
            .await
            .map_err(query_err)
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_login(&self, email_or_username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Email.eq(email_or_username))
                    .add(user::Column::Username.eq(email_or_username)),
            )
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let active: user::ActiveModel = user.into();
        let model = active.insert(&self.db).await.map_err(query_err)?;
        Ok(model.into())
    }

    async fn append_post(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or(RepoError::NotFound)?;

        let mut posts = user.posts;
        posts.push(post_id);

        let active = user::ActiveModel {
            id: Unchanged(user_id),
            posts: Set(serde_json::json!(posts)),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        active.update(&self.db).await.map_err(query_err)?;

        Ok(())
    }
}
