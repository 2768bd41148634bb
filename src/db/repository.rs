use std::sync::Arc;

use chrono::Utc;

use crate::db::models::{
    parse_object_id, ContentUpdate, CreatePostPayload, MetadataQuery, Post, PostId,
    PostMetadata, PostUpdate, Scope, UpdatePostPayload,
};
use crate::db::store::PostStore;
use crate::error::{AppError, SyncError};
use crate::sync::synchronizer::PostSynchronizer;

/// Result of a committed mutation together with the outcome of its index sync.
///
/// A `sync_error` means the store write succeeded but the search index may be
/// stale until the next mutation of the same post.
#[derive(Debug)]
pub struct Synced<T> {
    pub value: T,
    pub sync_error: Option<SyncError>,
}

impl<T> Synced<T> {
    fn new(value: T, sync: Result<(), SyncError>) -> Self {
        Self {
            value,
            sync_error: sync.err(),
        }
    }
}

/// Counts produced by [`PostRepository::reindex`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReindexReport {
    pub indexed: usize,
    pub removed: usize,
    pub failed: usize,
}

/// CRUD over posts; every mutation that can change visibility is followed by
/// a reconciliation of the search index.
pub struct PostRepository {
    store: Arc<dyn PostStore>,
    sync: Arc<PostSynchronizer>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn PostStore>, sync: Arc<PostSynchronizer>) -> Self {
        Self { store, sync }
    }

    /// Insert a new post, then index it if it is public.
    pub async fn create(&self, payload: CreatePostPayload) -> Result<Synced<PostId>, AppError> {
        let title = required(&payload.title, "title")?;
        let topic = required(&payload.topic, "topic")?;
        let slug = derive_slug(&payload.slug, &title)?;
        let author_id = parse_object_id(&payload.author_id, "author id")?;
        let related = parse_related(&payload.related_posts)?;
        let body = body_document(payload.body)?;
        let now = Utc::now();

        let post = Post {
            id: PostId::new(),
            title,
            slug,
            desc: payload.desc.trim().to_string(),
            topic,
            tags: normalize_tags(payload.tags),
            body,
            format: payload.format,
            stars: 0,
            author_id,
            public: payload.public,
            deleted: false,
            cover_image: payload.cover_image,
            related,
            created_at: now,
            updated_at: now,
        };

        let id = self.store.insert(&post).await?;
        tracing::info!(post_id = %id, slug = %post.slug, public = post.public, "Post created");

        let sync = self.sync.reconcile(id, post.visibility().effective()).await;
        Ok(Synced::new(id, sync))
    }

    /// Replace the editable fields of a post.
    pub async fn update_content(
        &self,
        id: PostId,
        payload: UpdatePostPayload,
    ) -> Result<Synced<()>, AppError> {
        let title = required(&payload.title, "title")?;
        let update = ContentUpdate {
            slug: derive_slug(&payload.slug, &title)?,
            title,
            desc: payload.desc.trim().to_string(),
            topic: required(&payload.topic, "topic")?,
            tags: normalize_tags(payload.tags),
            body: body_document(payload.body)?,
            public: payload.public,
            cover_image: payload.cover_image,
            related: parse_related(&payload.related_posts)?,
            updated_at: Utc::now(),
        };

        self.apply(id, PostUpdate::Content(update)).await
    }

    /// Change only the `public` flag.
    pub async fn set_scope(&self, id: PostId, scope: Scope) -> Result<Synced<()>, AppError> {
        self.apply(id, PostUpdate::Public(scope.is_public())).await
    }

    /// Change only the `deleted` flag.
    ///
    /// Restoring a post reindexes it only if its stored `public` flag is set.
    pub async fn set_deleted(&self, id: PostId, deleted: bool) -> Result<Synced<()>, AppError> {
        self.apply(id, PostUpdate::Deleted(deleted)).await
    }

    async fn apply(&self, id: PostId, update: PostUpdate) -> Result<Synced<()>, AppError> {
        let visibility = self
            .store
            .update(id, update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post '{id}' not found")))?;

        tracing::info!(
            post_id = %id,
            public = visibility.public,
            deleted = visibility.deleted,
            "Post updated"
        );

        let sync = self.sync.reconcile(id, visibility.effective()).await;
        Ok(Synced::new((), sync))
    }

    pub async fn get_by_id(&self, id: PostId) -> Result<Post, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post '{id}' not found")))
    }

    pub async fn get_metadata_by_id(
        &self,
        id: PostId,
        scope: Scope,
    ) -> Result<PostMetadata, AppError> {
        self.store
            .find_metadata(id, Some(scope))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No {scope} post '{id}'")))
    }

    pub async fn list_metadata(&self, query: &MetadataQuery) -> Result<Vec<PostMetadata>, AppError> {
        if query.limit < 0 {
            return Err(AppError::Validation("limit cannot be negative".into()));
        }
        self.store.list_metadata(query).await
    }

    pub async fn count(&self, scope: Scope, include_deleted: bool) -> Result<u64, AppError> {
        self.store.count(scope, include_deleted).await
    }

    /// Reconcile every stored post with its effective visibility.
    ///
    /// Individual failures are counted and logged; only a failure to list
    /// posts aborts the run.
    pub async fn reindex(&self) -> Result<ReindexReport, AppError> {
        let posts = self.store.list_visibility().await?;
        let mut report = ReindexReport::default();

        for (id, visibility) in posts {
            let effective = visibility.effective();
            match self.sync.reconcile(id, effective).await {
                Ok(()) if effective => report.indexed += 1,
                Ok(()) => report.removed += 1,
                Err(_) => report.failed += 1,
            }
        }

        tracing::info!(
            indexed = report.indexed,
            removed = report.removed,
            failed = report.failed,
            "Reindex finished"
        );
        Ok(report)
    }
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

/// Keep the given slug as written, or derive one from the title when it is empty.
fn derive_slug(slug: &str, title: &str) -> Result<String, AppError> {
    let slug = slug.trim();
    if !slug.is_empty() {
        return Ok(slug.to_string());
    }

    let derived = slugify(title);
    if derived.is_empty() {
        return Err(AppError::Validation(format!(
            "Cannot derive a slug from '{title}'"
        )));
    }
    Ok(derived)
}

/// Lower-case alphanumerics joined by single dashes.
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Tags behave as a set: trimmed, de-duplicated and sorted.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

fn parse_related(raw: &[String]) -> Result<Vec<bson::oid::ObjectId>, AppError> {
    raw.iter()
        .map(|id| parse_object_id(id, "related post id"))
        .collect()
}

fn body_document(body: serde_json::Value) -> Result<bson::Document, AppError> {
    match body {
        serde_json::Value::Null => Ok(bson::Document::new()),
        serde_json::Value::Object(_) => bson::to_document(&body)
            .map_err(|e| AppError::Validation(format!("Invalid body: {e}"))),
        _ => Err(AppError::Validation("body must be a JSON object".into())),
    }
}
