use async_trait::async_trait;
use meilisearch_sdk::errors::ErrorCode;
use meilisearch_sdk::task_info::TaskInfo;

use crate::error::AppError;
use crate::search::record::SearchIndexRecord;

/// Name of the primary key attribute of the index.
pub const PRIMARY_KEY: &str = "objectID";

/// Trait for search index writes, enabling mock testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert a record, replacing any existing record with the same id.
    async fn put(&self, record: &SearchIndexRecord) -> Result<(), AppError>;

    /// Remove a record. Removing a missing record is not an error.
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<Option<SearchIndexRecord>, AppError>;

    /// Configure the search index (filterable/searchable/sortable attributes).
    /// Should be called once on startup.
    async fn configure_index(&self) -> Result<(), AppError>;
}

/// Meilisearch implementation of the SearchIndex.
pub struct MeilisearchIndex {
    client: meilisearch_sdk::client::Client,
    index_name: String,
}

impl MeilisearchIndex {
    /// Create a client for the given instance and index.
    pub fn connect(
        url: &str,
        api_key: Option<String>,
        index_name: &str,
    ) -> Result<Self, AppError> {
        let client = meilisearch_sdk::client::Client::new(url, api_key)
            .map_err(|e| AppError::Search(format!("Failed to create Meilisearch client: {e}")))?;

        Ok(Self {
            client,
            index_name: index_name.to_string(),
        })
    }

    fn index(&self) -> meilisearch_sdk::indexes::Index {
        self.client.index(&self.index_name)
    }

    /// Wait until Meilisearch has processed a write task. A failed task is an
    /// error unless its code is listed in `tolerated`.
    async fn settle(
        &self,
        task: TaskInfo,
        action: &str,
        tolerated: &[ErrorCode],
    ) -> Result<(), AppError> {
        let task = task
            .wait_for_completion(&self.client, None, None)
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch {action} task error: {e}")))?;

        if task.is_failure() {
            let error = task.unwrap_failure();
            if !tolerated.contains(&error.error_code) {
                return Err(AppError::Search(format!(
                    "Meilisearch {action} task failed: {error}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for MeilisearchIndex {
    async fn put(&self, record: &SearchIndexRecord) -> Result<(), AppError> {
        let task = self
            .index()
            .add_or_replace(&[record], Some(PRIMARY_KEY))
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch index error: {e}")))?;

        self.settle(task, "index", &[]).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let task = self
            .index()
            .delete_document(id)
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch delete error: {e}")))?;

        // Nothing to remove from an index that was never created.
        self.settle(task, "delete", &[ErrorCode::IndexNotFound]).await
    }

    async fn get(&self, id: &str) -> Result<Option<SearchIndexRecord>, AppError> {
        use meilisearch_sdk::errors::Error;

        match self.index().get_document::<SearchIndexRecord>(id).await {
            Ok(record) => Ok(Some(record)),
            Err(Error::Meilisearch(e))
                if matches!(
                    e.error_code,
                    ErrorCode::DocumentNotFound | ErrorCode::IndexNotFound
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(AppError::Search(format!("Meilisearch get error: {e}"))),
        }
    }

    async fn configure_index(&self) -> Result<(), AppError> {
        let index = self.index();

        let task = index
            .set_filterable_attributes(["topic", "tags"])
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch config error: {e}")))?;
        self.settle(task, "config", &[]).await?;

        let task = index
            .set_searchable_attributes(["name", "description", "tags", "topic"])
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch config error: {e}")))?;
        self.settle(task, "config", &[]).await?;

        let task = index
            .set_sortable_attributes(["createdAt", "updatedAt"])
            .await
            .map_err(|e| AppError::Search(format!("Meilisearch config error: {e}")))?;
        self.settle(task, "config", &[]).await
    }
}
