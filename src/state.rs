use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CommentService, PostService, SeaOrmAuthService, SeaOrmCommentService,
    SeaOrmPostService, SeaOrmUserService, UserService,
};

/// Everything a request handler needs. Configuration is immutable after
/// startup; the connection pool is the only shared resource.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub post_service: Arc<dyn PostService>,

    pub comment_service: Arc<dyn CommentService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires the services around an already-connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let config = Arc::new(config);

        let auth_service = Arc::new(SeaOrmAuthService::new(store.clone(), config.clone()))
            as Arc<dyn AuthService + Send + Sync + 'static>;

        let post_service = Arc::new(SeaOrmPostService::new(store.clone(), config.clone()))
            as Arc<dyn PostService + Send + Sync + 'static>;

        let comment_service = Arc::new(SeaOrmCommentService::new(store.clone(), config.clone()))
            as Arc<dyn CommentService + Send + Sync + 'static>;

        let user_service = Arc::new(SeaOrmUserService::new(store.clone(), config.clone()))
            as Arc<dyn UserService + Send + Sync + 'static>;

        Self {
            config,
            store,
            auth_service,
            post_service,
            comment_service,
            user_service,
        }
    }
}
