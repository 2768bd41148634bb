use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::db::models::{
    CoverImage, CreatePostPayload, MetadataQuery, Post, PostId, PostMetadata, Scope, SortMode,
    UpdatePostPayload,
};
use crate::db::repository::Synced;
use crate::error::AppError;

/// Response of every mutating endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub id: String,
    /// Set when the post was saved but the search index could not be updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

impl MutationResponse {
    fn new<T>(id: PostId, synced: &Synced<T>) -> Self {
        Self {
            id: id.to_hex(),
            sync_error: synced.sync_error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// JSON view of a full post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub desc: String,
    pub topic: String,
    pub tags: Vec<String>,
    pub body: serde_json::Value,
    pub format: String,
    pub stars: i64,
    pub author_id: String,
    pub public: bool,
    pub deleted: bool,
    pub cover_image: Option<CoverImage>,
    pub related: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_hex(),
            title: post.title,
            slug: post.slug,
            desc: post.desc,
            topic: post.topic,
            tags: post.tags,
            body: bson::Bson::Document(post.body).into_relaxed_extjson(),
            format: post.format,
            stars: post.stars,
            author_id: post.author_id.to_hex(),
            public: post.public,
            deleted: post.deleted,
            cover_image: post.cover_image,
            related: post.related.iter().map(|id| id.to_hex()).collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// JSON view of post metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub desc: String,
    pub tags: Vec<String>,
    pub topic: String,
    pub stars: i64,
    pub format: String,
    pub author_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub cover_image: Option<CoverImage>,
}

impl From<PostMetadata> for MetadataResponse {
    fn from(meta: PostMetadata) -> Self {
        Self {
            id: meta.id.to_hex(),
            title: meta.title,
            slug: meta.slug,
            desc: meta.desc,
            tags: meta.tags,
            topic: meta.topic,
            stars: meta.stars,
            format: meta.format,
            author_id: meta.author_id.to_hex(),
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            cover_image: meta.cover_image,
        }
    }
}

/// Query string of `GET /api/v1/posts`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub scope: Option<String>,
    /// `all` or absent lists every topic.
    pub topic: Option<String>,
    pub sort: Option<String>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub skip: u64,
}

impl ListParams {
    fn into_query(self) -> Result<MetadataQuery, AppError> {
        Ok(MetadataQuery {
            scope: parse_scope(self.scope.as_deref())?,
            topic: self.topic.filter(|t| !t.is_empty() && t != "all"),
            sort: self
                .sort
                .as_deref()
                .map(SortMode::from_param)
                .unwrap_or_default(),
            limit: self.limit,
            skip: self.skip,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub scope: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScopeParams {
    pub scope: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetScopeRequest {
    pub scope: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetDeletedRequest {
    pub deleted: bool,
}

/// Absent scope means public.
fn parse_scope(raw: Option<&str>) -> Result<Scope, AppError> {
    raw.map(str::parse::<Scope>).transpose().map(|s| s.unwrap_or(Scope::Public))
}

/// Axum handler for `GET /api/v1/posts`.
pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<MetadataResponse>>, AppError> {
    let query = params.into_query()?;
    let posts = state.posts.list_metadata(&query).await?;
    Ok(Json(posts.into_iter().map(MetadataResponse::from).collect()))
}

/// Axum handler for `GET /api/v1/posts/count`.
pub async fn count_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> Result<Json<CountResponse>, AppError> {
    let scope = parse_scope(params.scope.as_deref())?;
    let count = state.posts.count(scope, params.include_deleted).await?;
    Ok(Json(CountResponse { count }))
}

/// Axum handler for `POST /api/v1/posts`.
pub async fn create_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostPayload>,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    let synced = state.posts.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::new(synced.value, &synced)),
    ))
}

/// Axum handler for `GET /api/v1/posts/{id}`.
pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let id = PostId::parse(&raw_id)?;
    let post = state.posts.get_by_id(id).await?;
    Ok(Json(post.into()))
}

/// Axum handler for `GET /api/v1/posts/{id}/metadata`.
pub async fn get_metadata_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<MetadataResponse>, AppError> {
    let id = PostId::parse(&raw_id)?;
    let scope = parse_scope(params.scope.as_deref())?;
    let meta = state.posts.get_metadata_by_id(id, scope).await?;
    Ok(Json(meta.into()))
}

/// Axum handler for `PUT /api/v1/posts/{id}`.
pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(payload): Json<UpdatePostPayload>,
) -> Result<Json<MutationResponse>, AppError> {
    let id = PostId::parse(&raw_id)?;
    let synced = state.posts.update_content(id, payload).await?;
    Ok(Json(MutationResponse::new(id, &synced)))
}

/// Axum handler for `PUT /api/v1/posts/{id}/scope`.
pub async fn set_scope_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(request): Json<SetScopeRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let id = PostId::parse(&raw_id)?;
    let scope: Scope = request.scope.parse()?;
    let synced = state.posts.set_scope(id, scope).await?;
    Ok(Json(MutationResponse::new(id, &synced)))
}

/// Axum handler for `PUT /api/v1/posts/{id}/deleted`.
pub async fn set_deleted_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(request): Json<SetDeletedRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let id = PostId::parse(&raw_id)?;
    let synced = state.posts.set_deleted(id, request.deleted).await?;
    Ok(Json(MutationResponse::new(id, &synced)))
}
