use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use postdesk::app::{build_repository, AppState};
use postdesk::config::AppConfig;
use postdesk::db::models::{
    MetadataQuery, Post, PostId, PostMetadata, PostUpdate, Scope, SortMode, Visibility,
};
use postdesk::db::repository::PostRepository;
use postdesk::db::store::PostStore;
use postdesk::error::AppError;
use postdesk::search::client::SearchIndex;
use postdesk::search::record::SearchIndexRecord;
use postdesk::topics::catalog::StaticTopicCatalog;

/// In-memory `posts` collection.
#[derive(Default)]
pub struct MemoryPostStore {
    posts: Mutex<Vec<Post>>,
}

impl MemoryPostStore {
    pub fn get(&self, id: PostId) -> Option<Post> {
        self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }
}

fn in_scope(post: &Post, scope: Scope) -> bool {
    post.public == scope.is_public() && !post.deleted
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, AppError> {
        Ok(self.get(id))
    }

    async fn find_metadata(
        &self,
        id: PostId,
        scope: Option<Scope>,
    ) -> Result<Option<PostMetadata>, AppError> {
        Ok(self
            .get(id)
            .filter(|p| scope.map_or(true, |s| in_scope(p, s)))
            .map(|p| PostMetadata::from(&p)))
    }

    async fn list_metadata(&self, query: &MetadataQuery) -> Result<Vec<PostMetadata>, AppError> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| in_scope(p, query.scope))
            .filter(|p| query.topic.as_ref().map_or(true, |t| &p.topic == t))
            .cloned()
            .collect();

        match query.sort {
            SortMode::Title => posts.sort_by(|a, b| a.title.cmp(&b.title)),
            SortMode::Topic => posts.sort_by(|a, b| a.topic.cmp(&b.topic)),
            SortMode::Newest => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortMode::Oldest => posts.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortMode::Updated => posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            SortMode::Natural => {}
        }

        let limit = if query.limit > 0 {
            query.limit as usize
        } else {
            usize::MAX
        };
        Ok(posts
            .iter()
            .skip(query.skip as usize)
            .take(limit)
            .map(PostMetadata::from)
            .collect())
    }

    async fn count(&self, scope: Scope, include_deleted: bool) -> Result<u64, AppError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.public == scope.is_public() && (include_deleted || !p.deleted))
            .count() as u64)
    }

    async fn insert(&self, post: &Post) -> Result<PostId, AppError> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(post.id)
    }

    async fn update(
        &self,
        id: PostId,
        update: PostUpdate,
    ) -> Result<Option<Visibility>, AppError> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        match update {
            PostUpdate::Content(c) => {
                post.title = c.title;
                post.slug = c.slug;
                post.desc = c.desc;
                post.topic = c.topic;
                post.tags = c.tags;
                post.body = c.body;
                post.public = c.public;
                post.cover_image = c.cover_image;
                post.related = c.related;
                post.updated_at = c.updated_at;
            }
            PostUpdate::Public(public) => post.public = public,
            PostUpdate::Deleted(deleted) => post.deleted = deleted,
        }

        Ok(Some(post.visibility()))
    }

    async fn list_visibility(&self) -> Result<Vec<(PostId, Visibility)>, AppError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .map(|p| (p.id, p.visibility()))
            .collect())
    }
}

/// In-memory search index that counts calls and can be told to fail.
#[derive(Default)]
pub struct MemorySearchIndex {
    records: Mutex<HashMap<String, SearchIndexRecord>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MemorySearchIndex {
    pub fn record(&self, id: PostId) -> Option<SearchIndexRecord> {
        self.records.lock().unwrap().get(&id.to_hex()).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Search("index unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn put(&self, record: &SearchIndexRecord) -> Result<(), AppError> {
        self.enter()?;
        self.records
            .lock()
            .unwrap()
            .insert(record.object_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.enter()?;
        self.records.lock().unwrap().remove(id);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SearchIndexRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn configure_index(&self) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn test_config(env: &str) -> AppConfig {
    AppConfig {
        env: env.to_string(),
        mongodb_uri: "mongodb://unused".to_string(),
        mongodb_database: "postdesk_test".to_string(),
        meili_url: "http://unused".to_string(),
        meili_api_key: None,
        meili_index: "posts".to_string(),
        site_url: "https://blog.example.com/posts".to_string(),
        image_base_url: "https://img.example.com".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

/// Repository wired to in-memory gateways.
pub struct MemoryEnv {
    pub store: Arc<MemoryPostStore>,
    pub index: Arc<MemorySearchIndex>,
    pub repo: Arc<PostRepository>,
}

impl MemoryEnv {
    pub fn new(env: &str) -> Self {
        let store = Arc::new(MemoryPostStore::default());
        let index = Arc::new(MemorySearchIndex::default());
        let repo = build_repository(
            &test_config(env),
            store.clone(),
            index.clone(),
            Arc::new(StaticTopicCatalog::new()),
        );

        Self {
            store,
            index,
            repo: Arc::new(repo),
        }
    }

    pub fn production() -> Self {
        Self::new("production")
    }

    pub fn state(&self) -> AppState {
        AppState {
            posts: self.repo.clone(),
            topics: Arc::new(StaticTopicCatalog::new()),
        }
    }

    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(postdesk::app::router(self.state()))
    }
}

pub fn create_payload(
    title: &str,
    slug: &str,
    topic: &str,
    public: bool,
) -> postdesk::db::models::CreatePostPayload {
    serde_json::from_value(serde_json::json!({
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
    .expect("valid payload")
}
