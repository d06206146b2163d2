#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use quill_core::domain::{Post, PostState};
    use quill_core::ports::PostRepository;

    use crate::database::entity::post;
    use crate::database::postgres_repo::PostgresPostRepository;

    fn sample_model(post_id: uuid::Uuid, author_id: uuid::Uuid) -> post::Model {
        let now = chrono::Utc::now();
        post::Model {
            id: post_id,
            author_id,
            author_name: "ada".to_owned(),
            title: "Test Post".to_owned(),
            description: "A description".to_owned(),
            body: "Content body".to_owned(),
            tags: serde_json::json!(["rust", "testing"]),
            state: "published".to_owned(),
            deleted: false,
            read_count: 7,
            reading_time: 2,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_find_post_by_id_maps_stored_fields() {
        let post_id = uuid::Uuid::new_v4();
        let author_id = uuid::Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![sample_model(post_id, author_id)]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        assert!(result.is_some());
        let post = result.unwrap();
        assert_eq!(post.id, post_id);
        assert_eq!(post.author_id, author_id);
        assert_eq!(post.state, PostState::Published);
        assert_eq!(post.tags, vec!["rust".to_string(), "testing".to_string()]);
        assert_eq!(post.read_count, 7);
    }

    #[tokio::test]
    async fn test_increment_read_count_issues_single_update() {
        let post_id = uuid::Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        repo.increment_read_count(post_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_deleted_flags_the_record() {
        let post_id = uuid::Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);
        repo.set_deleted(post_id).await.unwrap();
    }
}
