use async_trait::async_trait;

use crate::db::models::{MetadataQuery, Post, PostId, PostMetadata, PostUpdate, Scope, Visibility};
use crate::error::AppError;

/// Gateway over the `posts` collection.
///
/// This trait allows mocking the database layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Find a full post by id.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, AppError>;

    /// Find a post's metadata. With a scope, only non-deleted posts of that
    /// scope match; without one, any post matches.
    async fn find_metadata(
        &self,
        id: PostId,
        scope: Option<Scope>,
    ) -> Result<Option<PostMetadata>, AppError>;

    /// List non-deleted post metadata matching the query.
    async fn list_metadata(&self, query: &MetadataQuery) -> Result<Vec<PostMetadata>, AppError>;

    /// Count posts of a scope, optionally including soft-deleted ones.
    async fn count(&self, scope: Scope, include_deleted: bool) -> Result<u64, AppError>;

    /// Insert a new post and return its id.
    async fn insert(&self, post: &Post) -> Result<PostId, AppError>;

    /// Apply an update and return the post's resulting visibility flags,
    /// or `None` if no post has this id.
    async fn update(&self, id: PostId, update: PostUpdate)
        -> Result<Option<Visibility>, AppError>;

    /// Visibility flags of every post, deleted ones included.
    async fn list_visibility(&self) -> Result<Vec<(PostId, Visibility)>, AppError>;
}

/// MongoDB implementation of the PostStore.
pub struct MongoPostStore {
    client: mongodb::Client,
    collection: mongodb::Collection<Post>,
}

/// Fields returned by metadata reads.
fn metadata_projection() -> bson::Document {
    bson::doc! {
        "_id": 1,
        "title": 1,
        "slug": 1,
        "desc": 1,
        "tags": 1,
        "topic": 1,
        "stars": 1,
        "format": 1,
        "authorId": 1,
        "createdAt": 1,
        "updatedAt": 1,
        "coverImage": 1,
    }
}

/// Filter matching non-deleted posts of a scope.
fn scope_filter(scope: Scope) -> bson::Document {
    bson::doc! { "public": scope.is_public(), "deleted": false }
}

fn update_document(update: PostUpdate) -> Result<bson::Document, AppError> {
    let set = match update {
        PostUpdate::Content(content) => {
            let cover_image = bson::to_bson(&content.cover_image)
                .map_err(|e| AppError::Internal(format!("Failed to encode cover image: {e}")))?;
            bson::doc! {
                "title": content.title,
                "slug": content.slug,
                "desc": content.desc,
                "topic": content.topic,
                "tags": content.tags,
                "body": content.body,
                "public": content.public,
                "coverImage": cover_image,
                "related": content.related,
                "updatedAt": bson::DateTime::from_chrono(content.updated_at),
            }
        }
        PostUpdate::Public(public) => bson::doc! { "public": public },
        PostUpdate::Deleted(deleted) => bson::doc! { "deleted": deleted },
    };
    Ok(bson::doc! { "$set": set })
}

#[derive(serde::Deserialize)]
struct VisibilityRow {
    #[serde(rename = "_id")]
    id: PostId,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    deleted: bool,
}

impl MongoPostStore {
    /// Connect to MongoDB and verify the connection with a ping.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let client = mongodb::Client::with_uri_str(uri)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MongoDB: {e}")))?;

        client
            .database(database)
            .run_command(bson::doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::Database(format!("MongoDB ping failed: {e}")))?;

        Ok(Self::new(client, database))
    }

    /// Wrap an existing client (useful for testing / DI).
    pub fn new(client: mongodb::Client, database: &str) -> Self {
        let collection = client.database(database).collection("posts");
        Self { client, collection }
    }

    /// Close all pooled connections. The store must not be used afterwards.
    pub async fn close(&self) {
        self.client.clone().shutdown().await;
    }

    fn metadata_collection(&self) -> mongodb::Collection<PostMetadata> {
        self.collection.clone_with_type()
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, AppError> {
        self.collection
            .find_one(bson::doc! { "_id": id.as_object_id() })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_metadata(
        &self,
        id: PostId,
        scope: Option<Scope>,
    ) -> Result<Option<PostMetadata>, AppError> {
        let mut filter = scope.map(scope_filter).unwrap_or_default();
        filter.insert("_id", id.as_object_id());

        self.metadata_collection()
            .find_one(filter)
            .projection(metadata_projection())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_metadata(&self, query: &MetadataQuery) -> Result<Vec<PostMetadata>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let mut filter = scope_filter(query.scope);
        if let Some(topic) = &query.topic {
            filter.insert("topic", topic.as_str());
        }

        let options = FindOptions::builder()
            .projection(metadata_projection())
            .sort(
                query
                    .sort
                    .sort_key()
                    .map(|(field, order)| bson::doc! { field: order }),
            )
            .limit((query.limit > 0).then_some(query.limit))
            .skip((query.skip > 0).then_some(query.skip))
            .build();

        let cursor = self
            .metadata_collection()
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count(&self, scope: Scope, include_deleted: bool) -> Result<u64, AppError> {
        let mut filter = bson::doc! { "public": scope.is_public() };
        if !include_deleted {
            filter.insert("deleted", false);
        }

        self.collection
            .count_documents(filter)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(&self, post: &Post) -> Result<PostId, AppError> {
        let result = self
            .collection
            .insert_one(post)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        result
            .inserted_id
            .as_object_id()
            .map(PostId::from)
            .ok_or_else(|| AppError::Database("Inserted id is not an ObjectId".into()))
    }

    async fn update(
        &self,
        id: PostId,
        update: PostUpdate,
    ) -> Result<Option<Visibility>, AppError> {
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .projection(bson::doc! { "_id": 1, "public": 1, "deleted": 1 })
            .build();

        let row = self
            .collection
            .clone_with_type::<VisibilityRow>()
            .find_one_and_update(bson::doc! { "_id": id.as_object_id() }, update_document(update)?)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(|row| Visibility {
            public: row.public,
            deleted: row.deleted,
        }))
    }

    async fn list_visibility(&self) -> Result<Vec<(PostId, Visibility)>, AppError> {
        use futures::TryStreamExt;

        let rows: Vec<VisibilityRow> = self
            .collection
            .clone_with_type::<VisibilityRow>()
            .find(bson::doc! {})
            .projection(bson::doc! { "_id": 1, "public": 1, "deleted": 1 })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    Visibility {
                        public: row.public,
                        deleted: row.deleted,
                    },
                )
            })
            .collect())
    }
}
