use serde_json::Value;

use crate::client::ApiClient;
use crate::config::{RequestDescriptor, RequestOptions};
use crate::domain::{Habit, HabitInput, TrackingEntry, TrackingKey};
use crate::envelope::{ApiError, ApiResult};
use crate::error::UNKNOWN_ERROR;
use crate::http_client::HttpMethod;

use super::Repository;

/// Habit and tracking endpoints under `/habits`.
///
/// Methods return an [`ApiResult`] so callers match on the outcome instead of
/// inspecting the envelope.
#[derive(Debug, Clone)]
pub struct HabitsRepository {
    inner: Repository,
}

impl HabitsRepository {
    pub const BASE_PATH: &'static str = "/habits";

    pub fn new(client: ApiClient) -> Self {
        Self {
            inner: Repository::new(client, Self::BASE_PATH),
        }
    }

    pub async fn list(&self) -> ApiResult<Vec<Habit>> {
        self.inner.get("", RequestOptions::new()).await.into_result()
    }

    pub async fn get(&self, id: &str) -> ApiResult<Habit> {
        self.inner
            .get(&format!("/{}", urlencoding::encode(id)), RequestOptions::new())
            .await
            .into_result()
    }

    pub async fn create(&self, input: &HabitInput) -> ApiResult<Habit> {
        self.inner.post("", input, RequestOptions::new()).await.into_result()
    }

    pub async fn update(&self, id: &str, input: &HabitInput) -> ApiResult<Habit> {
        self.inner
            .put(&format!("/{}", urlencoding::encode(id)), input, RequestOptions::new())
            .await
            .into_result()
    }

    pub async fn delete(&self, id: &str) -> ApiResult<Value> {
        self.inner
            .delete(&format!("/{}", urlencoding::encode(id)), RequestOptions::new())
            .await
            .into_result()
    }

    /// All tracking entries of the current user, newest first.
    pub async fn tracking(&self) -> ApiResult<Vec<TrackingEntry>> {
        self.inner.get("/tracking", RequestOptions::new()).await.into_result()
    }

    /// Records a completion. The backend upserts on the key.
    pub async fn track(&self, entry: &TrackingEntry) -> ApiResult<TrackingEntry> {
        self.inner
            .post("/tracking", entry, RequestOptions::new())
            .await
            .into_result()
    }

    pub async fn untrack(&self, key: &TrackingKey) -> ApiResult<Value> {
        let body = serde_json::to_value(key).map_err(|error| {
            ApiError::<Value>::new(UNKNOWN_ERROR, format!("failed to encode request body: {error}"))
        })?;
        self.inner
            .execute(RequestDescriptor::new(HttpMethod::Delete, "/tracking").with_body(body))
            .await
            .into_result()
    }

    /// Tracking entries of the last 90 days.
    pub async fn insights(&self) -> ApiResult<Vec<TrackingEntry>> {
        self.inner
            .get("/tracking/insights", RequestOptions::new())
            .await
            .into_result()
    }
}
