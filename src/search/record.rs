use serde::{Deserialize, Serialize};

use crate::db::models::{CoverImage, PostMetadata};

/// Denormalized projection of a post, as stored in the search index.
///
/// Present in the index only while its post is public and not deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexRecord {
    /// Primary key: the 24-hex post id.
    #[serde(rename = "objectID")]
    pub object_id: String,
    /// Post title.
    pub name: String,
    /// Resolved topic display name, empty if the topic is unknown.
    pub topic: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Public URL of the post.
    pub url: String,
    /// Cover image URL, empty without a cover.
    pub image: String,
    /// Unix timestamp (seconds).
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Unix timestamp (seconds).
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

/// Builds the public links embedded in index records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    site_url: String,
    image_base_url: String,
}

impl LinkBuilder {
    pub fn new(site_url: impl Into<String>, image_base_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into().trim_end_matches('/').to_string(),
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn post_url(&self, slug: &str) -> String {
        format!("{}/{}", self.site_url, slug.trim_start_matches('/'))
    }

    pub fn cover_image_url(&self, cover: Option<&CoverImage>) -> String {
        match cover {
            Some(cover) if !cover.path.is_empty() => {
                format!("{}/{}.webp", self.image_base_url, cover.path.trim_start_matches('/'))
            }
            _ => String::new(),
        }
    }
}

/// Project post metadata into an index record.
pub fn build_index_record(
    meta: &PostMetadata,
    topic_name: String,
    links: &LinkBuilder,
) -> SearchIndexRecord {
    SearchIndexRecord {
        object_id: meta.id.to_hex(),
        name: meta.title.clone(),
        topic: topic_name,
        description: meta.desc.clone(),
        tags: meta.tags.clone(),
        url: links.post_url(&meta.slug),
        image: links.cover_image_url(meta.cover_image.as_ref()),
        created_at: meta.created_at.timestamp(),
        updated_at: meta.updated_at.timestamp(),
    }
}
