pub mod memory;

use std::sync::Arc;

use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::meilisearch::Meilisearch;
use testcontainers_modules::mongo::Mongo;

use postdesk::app::{build_repository, router, AppState};
use postdesk::config::AppConfig;
use postdesk::db::models::PostId;
use postdesk::db::repository::PostRepository;
use postdesk::db::store::{MongoPostStore, PostStore};
use postdesk::search::client::{MeilisearchIndex, SearchIndex};
use postdesk::search::record::SearchIndexRecord;
use postdesk::topics::catalog::StaticTopicCatalog;

/// Holds running containers and provides the Axum router for integration tests.
///
/// Containers are kept alive for as long as this struct lives. When dropped,
/// containers are stopped and cleaned up automatically.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    _meili: ContainerAsync<Meilisearch>,
    pub meili_url: String,
    pub router: Router,
    pub repo: Arc<PostRepository>,
    pub store: Arc<dyn PostStore>,
    pub index: Arc<dyn SearchIndex>,
}

impl TestEnv {
    /// Spin up MongoDB and Meilisearch and wire a production-mode repository.
    pub async fn start() -> Self {
        Self::start_in("production").await
    }

    pub async fn start_in(env: &str) -> Self {
        // Start containers concurrently
        let (mongo_container, meili_container) =
            tokio::join!(Mongo::default().start(), Meilisearch::default().start());
        let mongo_container = mongo_container.expect("Failed to start MongoDB container");
        let meili_container = meili_container.expect("Failed to start Meilisearch container");

        // --- MongoDB ---
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let store: Arc<dyn PostStore> = Arc::new(
            MongoPostStore::connect(&mongo_uri, "postdesk_test")
                .await
                .expect("Failed to connect to MongoDB"),
        );

        // --- Meilisearch ---
        let meili_port = meili_container
            .get_host_port_ipv4(7700)
            .await
            .expect("Failed to get Meilisearch port");
        let meili_url = format!("http://127.0.0.1:{}", meili_port);
        let meili_index = format!("posts-{}", uuid::Uuid::new_v4().simple());

        let meili = MeilisearchIndex::connect(&meili_url, None, &meili_index)
            .expect("Failed to create Meilisearch client");
        meili
            .configure_index()
            .await
            .expect("Failed to configure Meilisearch index");
        let index: Arc<dyn SearchIndex> = Arc::new(meili);

        let config = AppConfig {
            env: env.to_string(),
            mongodb_uri: mongo_uri,
            mongodb_database: "postdesk_test".to_string(),
            meili_url: meili_url.clone(),
            meili_api_key: None,
            meili_index,
            site_url: "https://blog.example.com/posts".to_string(),
            image_base_url: "https://img.example.com".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
        };

        let repo = Arc::new(build_repository(
            &config,
            store.clone(),
            index.clone(),
            Arc::new(StaticTopicCatalog::new()),
        ));
        let router = router(AppState {
            posts: repo.clone(),
            topics: Arc::new(StaticTopicCatalog::new()),
        });

        Self {
            _mongo: mongo_container,
            _meili: meili_container,
            meili_url,
            router,
            repo,
            store,
            index,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Helper: create a post via the API and return its id.
    pub async fn create_post(
        &self,
        server: &axum_test::TestServer,
        title: &str,
        slug: &str,
        topic: &str,
        public: bool,
    ) -> PostId {
        let response = server
            .post("/api/v1/posts")
            .json(&serde_json::json!({
                "title": title,
                "slug": slug,
                "topic": topic,
                "public": public,
                "desc": format!("About {title}"),
                "tags": ["test"],
                "body": { "blocks": [] },
                "format": "editorjs",
                "author_id": "64b7f0c2a1d3e4f5a6b7c8d9"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: serde_json::Value = response.json();
        assert!(body.get("sync_error").is_none(), "unexpected sync error: {body}");
        PostId::parse(body["id"].as_str().expect("id in response")).expect("valid id")
    }

    /// Helper: read a record straight from the search index.
    pub async fn indexed(&self, id: PostId) -> Option<SearchIndexRecord> {
        self.index
            .get(&id.to_hex())
            .await
            .expect("Failed to read search index")
    }

    /// Helper: wait for Meilisearch to process pending tasks (async indexing).
    pub async fn wait_for_search_indexing(&self) {
        // Meilisearch processes tasks asynchronously. A short delay is the
        // simplest reliable approach for integration tests.
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    }
}
