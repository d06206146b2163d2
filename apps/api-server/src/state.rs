//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::BlogService;
use quill_core::ports::{PostRepository, UserRepository};
use quill_infra::database::{DatabaseConfig, DatabaseConnections};
use quill_infra::{InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use quill_infra::{PostgresPostRepository, PostgresUserRepository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub users: Arc<dyn UserRepository>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        #[cfg(feature = "postgres")]
        let (db, posts, users): (
            Option<Arc<DatabaseConnections>>,
            Arc<dyn PostRepository>,
            Arc<dyn UserRepository>,
        ) = {
            if let Some(config) = db_config {
                match DatabaseConnections::init(config).await {
                    Ok(connections) => {
                        let conn = Arc::new(connections);
                        let posts = Arc::new(PostgresPostRepository::new(conn.main.clone()));
                        let users = Arc::new(PostgresUserRepository::new(conn.main.clone()));
                        (Some(conn), posts, users)
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        in_memory()
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (db, posts, users) = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            in_memory()
        };

        let blog = Arc::new(BlogService::new(posts, users.clone()));
        tracing::info!("Application state initialized");

        Self { blog, users, db }
    }
}

fn in_memory() -> (
    Option<Arc<DatabaseConnections>>,
    Arc<dyn PostRepository>,
    Arc<dyn UserRepository>,
) {
    (
        None,
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
    )
}
