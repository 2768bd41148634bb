use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::db::models::Scope;
use crate::error::AppError;
use crate::topics::catalog::Topic;

#[derive(Debug, Deserialize)]
pub struct TopicParams {
    /// `public`, `private`, or absent for every topic.
    pub scope: Option<String>,
}

/// Axum handler for `GET /api/v1/topics`.
pub async fn list_topics_handler(
    State(state): State<AppState>,
    Query(params): Query<TopicParams>,
) -> Result<Json<Vec<Topic>>, AppError> {
    let topics = state.topics.all();
    let topics = match params.scope.as_deref() {
        None | Some("all") => topics,
        Some(raw) => {
            let scope: Scope = raw.parse()?;
            topics
                .into_iter()
                .filter(|t| t.public == scope.is_public())
                .collect()
        }
    };
    Ok(Json(topics))
}
