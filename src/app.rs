use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::repository::PostRepository;
use crate::db::store::{MongoPostStore, PostStore};
use crate::error::AppError;
use crate::search::client::{MeilisearchIndex, SearchIndex};
use crate::search::record::LinkBuilder;
use crate::sync::synchronizer::PostSynchronizer;
use crate::topics::catalog::{StaticTopicCatalog, TopicCatalog};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostRepository>,
    pub topics: Arc<dyn TopicCatalog>,
}

/// Connections to the external systems, opened once and closed on shutdown.
pub struct Gateways {
    mongo: Arc<MongoPostStore>,
    pub store: Arc<dyn PostStore>,
    pub index: Arc<dyn SearchIndex>,
    pub topics: Arc<dyn TopicCatalog>,
}

impl Gateways {
    /// Connect to MongoDB and create the Meilisearch client.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let mongo = Arc::new(
            MongoPostStore::connect(&config.mongodb_uri, &config.mongodb_database).await?,
        );
        tracing::info!(database = %config.mongodb_database, "Connected to MongoDB");

        let index: Arc<dyn SearchIndex> = Arc::new(MeilisearchIndex::connect(
            &config.meili_url,
            config.meili_api_key.clone(),
            &config.meili_index,
        )?);
        tracing::info!(url = %config.meili_url, index = %config.meili_index, "Meilisearch client initialized");

        Ok(Self {
            store: mongo.clone(),
            mongo,
            index,
            topics: Arc::new(StaticTopicCatalog::new()),
        })
    }

    /// Build the repository and its synchronizer on top of these gateways.
    pub fn repository(&self, config: &AppConfig) -> PostRepository {
        build_repository(
            config,
            self.store.clone(),
            self.index.clone(),
            self.topics.clone(),
        )
    }

    /// Close the MongoDB connection pool.
    pub async fn close(self) {
        self.mongo.close().await;
        tracing::info!("MongoDB disconnected");
    }
}

/// Wire a repository from explicit gateways.
pub fn build_repository(
    config: &AppConfig,
    store: Arc<dyn PostStore>,
    index: Arc<dyn SearchIndex>,
    topics: Arc<dyn TopicCatalog>,
) -> PostRepository {
    let links = LinkBuilder::new(&config.site_url, &config.image_base_url);
    let sync = PostSynchronizer::new(config.mode(), store.clone(), index, topics, links);
    PostRepository::new(store, Arc::new(sync))
}

/// Build the Axum router for the JSON API.
pub fn router(state: AppState) -> Router {
    use crate::api::{posts, topics};

    Router::new()
        .route(
            "/api/v1/posts",
            get(posts::list_posts_handler).post(posts::create_post_handler),
        )
        .route("/api/v1/posts/count", get(posts::count_posts_handler))
        .route(
            "/api/v1/posts/{id}",
            get(posts::get_post_handler).put(posts::update_post_handler),
        )
        .route(
            "/api/v1/posts/{id}/metadata",
            get(posts::get_metadata_handler),
        )
        .route("/api/v1/posts/{id}/scope", put(posts::set_scope_handler))
        .route(
            "/api/v1/posts/{id}/deleted",
            put(posts::set_deleted_handler),
        )
        .route("/api/v1/topics", get(topics::list_topics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
