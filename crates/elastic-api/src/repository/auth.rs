use crate::client::ApiClient;
use crate::config::RequestOptions;
use crate::domain::{AuthResponse, AuthUser, LoginCredentials, RefreshTokenRequest, RegisterRequest};
use crate::envelope::ApiResponse;

use super::Repository;

/// Endpoints under `/auth`.
#[derive(Debug, Clone)]
pub struct AuthRepository {
    inner: Repository,
}

impl AuthRepository {
    pub const BASE_PATH: &'static str = "/auth";

    pub fn new(client: ApiClient) -> Self {
        Self {
            inner: Repository::new(client, Self::BASE_PATH),
        }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResponse<AuthResponse> {
        self.inner.post("/login", credentials, RequestOptions::new()).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResponse<AuthResponse> {
        self.inner.post("/register", request, RequestOptions::new()).await
    }

    pub async fn refresh_token(&self, request: &RefreshTokenRequest) -> ApiResponse<AuthResponse> {
        self.inner.post("/refresh", request, RequestOptions::new()).await
    }

    pub async fn logout(&self) -> ApiResponse<()> {
        self.inner.post("/logout", &(), RequestOptions::new()).await
    }

    pub async fn current_user(&self) -> ApiResponse<AuthUser> {
        self.inner.get("/me", RequestOptions::new()).await
    }
}
