use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Stable identifier of a post, stored as a MongoDB ObjectId.
///
/// The textual form is 24 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(ObjectId);

impl PostId {
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Parse the 24-hex textual form. A malformed id is a caller error.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        parse_object_id(raw, "post id").map(Self)
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn as_object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for PostId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for PostId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse a 24-hex ObjectId, naming the offending field on failure.
pub fn parse_object_id(raw: &str, field: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("Malformed {field} '{raw}'")))
}

/// Cover image reference attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    /// Asset id at the image host.
    #[serde(default)]
    pub id: String,
    /// Path of the image at the image host, without extension.
    #[serde(default)]
    pub path: String,
    /// Attribution name.
    #[serde(default)]
    pub ref_name: String,
    /// Attribution link.
    #[serde(default)]
    pub ref_url: String,
}

/// A blog post as stored in the `posts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: PostId,
    pub title: String,
    /// URL-safe identifier used in public links.
    pub slug: String,
    pub desc: String,
    /// Key into the topic catalog.
    pub topic: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque content blob, interpreted according to `format`.
    #[serde(default)]
    pub body: bson::Document,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub stars: i64,
    pub author_id: ObjectId,
    pub public: bool,
    pub deleted: bool,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub related: Vec<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn visibility(&self) -> Visibility {
        Visibility {
            public: self.public,
            deleted: self.deleted,
        }
    }
}

/// Post projection without body, flags or related posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    #[serde(rename = "_id")]
    pub id: PostId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub stars: i64,
    #[serde(default)]
    pub format: String,
    pub author_id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
}

impl From<&Post> for PostMetadata {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            desc: post.desc.clone(),
            tags: post.tags.clone(),
            topic: post.topic.clone(),
            stars: post.stars,
            format: post.format.clone(),
            author_id: post.author_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            cover_image: post.cover_image.clone(),
        }
    }
}

/// The two independent flags that decide search-index membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub public: bool,
    pub deleted: bool,
}

impl Visibility {
    /// `public AND NOT deleted`.
    pub fn effective(&self) -> bool {
        self.public && !self.deleted
    }
}

/// Publication scope of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Public,
    Private,
}

impl Scope {
    pub fn is_public(&self) -> bool {
        matches!(self, Scope::Public)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Public => write!(f, "public"),
            Scope::Private => write!(f, "private"),
        }
    }
}

impl FromStr for Scope {
    type Err = AppError;

    /// Unrecognized scopes are rejected rather than treated as private.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Scope::Public),
            "private" => Ok(Scope::Private),
            other => Err(AppError::Validation(format!(
                "Invalid scope '{other}'. Expected: public, private"
            ))),
        }
    }
}

/// Ordering of metadata listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Title ascending.
    Title,
    /// Topic ascending.
    Topic,
    /// Creation time descending.
    Newest,
    /// Creation time ascending.
    Oldest,
    /// Last update descending.
    Updated,
    /// Store order.
    #[default]
    Natural,
}

impl SortMode {
    /// Unknown values fall back to [`SortMode::Natural`].
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "title" => SortMode::Title,
            "topic" => SortMode::Topic,
            "newest" => SortMode::Newest,
            "oldest" => SortMode::Oldest,
            "updated" => SortMode::Updated,
            other => {
                if !other.is_empty() {
                    tracing::debug!(sort = other, "Unrecognized sort mode, using natural order");
                }
                SortMode::Natural
            }
        }
    }

    /// Field and direction (1 / -1) to sort by, `None` for natural order.
    pub fn sort_key(&self) -> Option<(&'static str, i32)> {
        match self {
            SortMode::Title => Some(("title", 1)),
            SortMode::Topic => Some(("topic", 1)),
            SortMode::Newest => Some(("createdAt", -1)),
            SortMode::Oldest => Some(("createdAt", 1)),
            SortMode::Updated => Some(("updatedAt", -1)),
            SortMode::Natural => None,
        }
    }
}

/// Parameters of a metadata listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataQuery {
    pub scope: Scope,
    /// `None` lists every topic.
    pub topic: Option<String>,
    pub sort: SortMode,
    /// 0 means unlimited.
    pub limit: i64,
    pub skip: u64,
}

impl Default for MetadataQuery {
    fn default() -> Self {
        Self {
            scope: Scope::Public,
            topic: None,
            sort: SortMode::Natural,
            limit: 0,
            skip: 0,
        }
    }
}

/// Full-field update applied by `UpdateContent`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentUpdate {
    pub title: String,
    pub slug: String,
    pub desc: String,
    pub topic: String,
    pub tags: Vec<String>,
    pub body: bson::Document,
    pub public: bool,
    pub cover_image: Option<CoverImage>,
    pub related: Vec<ObjectId>,
    pub updated_at: DateTime<Utc>,
}

/// A single-document write against an existing post.
#[derive(Debug, Clone, PartialEq)]
pub enum PostUpdate {
    Content(ContentUpdate),
    Public(bool),
    Deleted(bool),
}

/// Request body for creating a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostPayload {
    pub title: String,
    /// Derived from the title when empty.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub topic: String,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    pub author_id: String,
    #[serde(default)]
    pub related_posts: Vec<String>,
}

/// Request body for a full-field update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostPayload {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub topic: String,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub related_posts: Vec<String>,
}
