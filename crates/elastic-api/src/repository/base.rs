use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::ApiClient;
use crate::config::{RequestDescriptor, RequestOptions};
use crate::envelope::ApiResponse;

/// Client verbs scoped under a fixed path prefix such as `/habits`.
///
/// Envelopes pass through unchanged.
#[derive(Debug, Clone)]
pub struct Repository {
    client: ApiClient,
    base_path: String,
}

impl Repository {
    pub fn new(client: ApiClient, base_path: impl Into<String>) -> Self {
        Self {
            client,
            base_path: base_path.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn path(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.base_path)
    }

    /// Runs `request` with its path placed under the prefix.
    pub async fn execute<T: DeserializeOwned>(&self, mut request: RequestDescriptor) -> ApiResponse<T> {
        request.path = self.path(&request.path);
        self.client.execute(request).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ApiResponse<T> {
        self.client.get(&self.path(path), options).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ApiResponse<T> {
        self.client.delete(&self.path(path), options).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.client.post(&self.path(path), body, options).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.client.put(&self.path(path), body, options).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.client.patch(&self.path(path), body, options).await
    }
}
