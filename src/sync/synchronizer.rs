use std::sync::Arc;

use crate::config::ExecutionMode;
use crate::db::models::PostId;
use crate::db::store::PostStore;
use crate::error::{SyncError, SyncStage};
use crate::search::client::SearchIndex;
use crate::search::record::{build_index_record, LinkBuilder};
use crate::topics::catalog::TopicCatalog;

/// Keeps search-index membership of a post in line with its effective visibility.
///
/// Holds no mutable state. Concurrent reconciliations of the same post are not
/// serialized; the last index write wins.
pub struct PostSynchronizer {
    mode: ExecutionMode,
    store: Arc<dyn PostStore>,
    index: Arc<dyn SearchIndex>,
    topics: Arc<dyn TopicCatalog>,
    links: LinkBuilder,
}

impl PostSynchronizer {
    pub fn new(
        mode: ExecutionMode,
        store: Arc<dyn PostStore>,
        index: Arc<dyn SearchIndex>,
        topics: Arc<dyn TopicCatalog>,
        links: LinkBuilder,
    ) -> Self {
        Self {
            mode,
            store,
            index,
            topics,
            links,
        }
    }

    /// Make the index hold a record for `id` iff `effective_public`.
    ///
    /// Must be called after the mutation has been committed to the store.
    /// Outside production this is a no-op. Failures are logged and returned,
    /// never retried.
    pub async fn reconcile(&self, id: PostId, effective_public: bool) -> Result<(), SyncError> {
        if !self.mode.is_production() {
            tracing::debug!(post_id = %id, effective_public, "Skipping index sync outside production");
            return Ok(());
        }

        let result = if effective_public {
            self.publish(id).await
        } else {
            self.withdraw(id).await
        };

        result.inspect_err(|e| {
            tracing::error!(
                post_id = %e.post_id(),
                stage = %e.stage(),
                error = %e,
                "Search index reconciliation failed"
            );
        })
    }

    async fn publish(&self, id: PostId) -> Result<(), SyncError> {
        let meta = match self.store.find_metadata(id, None).await {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                return Err(SyncError::FetchFailed {
                    post_id: id,
                    reason: "post not found".into(),
                })
            }
            Err(e) => {
                return Err(SyncError::FetchFailed {
                    post_id: id,
                    reason: e.to_string(),
                })
            }
        };

        let topic_name = self.topics.resolve_name(&meta.topic);
        if topic_name.is_empty() {
            tracing::warn!(
                post_id = %id,
                stage = %SyncStage::TopicResolve,
                topic = %meta.topic,
                "Unknown topic, indexing with empty topic name"
            );
        }

        let record = build_index_record(&meta, topic_name, &self.links);
        self.index
            .put(&record)
            .await
            .map_err(|e| SyncError::IndexWriteFailed {
                post_id: id,
                reason: e.to_string(),
            })?;

        tracing::debug!(post_id = %id, url = %record.url, "Index record written");
        Ok(())
    }

    async fn withdraw(&self, id: PostId) -> Result<(), SyncError> {
        self.index
            .delete(&id.to_hex())
            .await
            .map_err(|e| SyncError::IndexDeleteFailed {
                post_id: id,
                reason: e.to_string(),
            })?;

        tracing::debug!(post_id = %id, "Index record removed");
        Ok(())
    }
}
