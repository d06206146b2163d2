//! Post entity for SeaORM.
//!
//! Field names and types here are the on-disk contract; keep them stable.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::PostState;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub title: String,
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub tags: Json,
    pub state: String,
    pub deleted: bool,
    pub read_count: i64,
    pub reading_time: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            author_name: model.author_name,
            title: model.title,
            description: model.description,
            body: model.body,
            tags: serde_json::from_value(model.tags).unwrap_or_default(),
            state: PostState::parse(&model.state).unwrap_or_default(),
            deleted: model.deleted,
            read_count: model.read_count,
            reading_time: model.reading_time,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            author_name: Set(post.author_name),
            title: Set(post.title),
            description: Set(post.description),
            body: Set(post.body),
            tags: Set(serde_json::json!(post.tags)),
            state: Set(post.state.as_str().to_string()),
            deleted: Set(post.deleted),
            read_count: Set(post.read_count),
            reading_time: Set(post.reading_time),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
