//! Credential storage and the request interceptor chain.

use std::sync::{Arc, RwLock};

use crate::config::RequestDescriptor;
use crate::error::TransportError;
use crate::http_client::HttpResponse;

/// Hooks run by the client around every call. Defaults pass values through.
pub trait Interceptor: Send + Sync {
    /// Returns the descriptor to send. The input is never mutated.
    fn intercept_request(&self, request: &RequestDescriptor) -> RequestDescriptor {
        request.clone()
    }

    fn intercept_response(&self, response: HttpResponse) -> HttpResponse {
        response
    }

    fn intercept_error(&self, error: TransportError) -> TransportError {
        error
    }
}

/// Access to the current token pair. The storage owns the tokens.
pub trait TokenStorage: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    fn set_tokens(&self, access_token: String, refresh_token: String);

    fn clear_tokens(&self);
}

#[derive(Debug, Default, Clone)]
struct TokenPair {
    access: Option<String>,
    refresh: Option<String>,
}

/// Process-local token storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    tokens: RwLock<TokenPair>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.set_tokens(access_token.into(), refresh_token.into());
        storage
    }

    fn read(&self) -> TokenPair {
        match self.tokens.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self, pair: TokenPair) {
        match self.tokens.write() {
            Ok(mut guard) => *guard = pair,
            Err(poisoned) => *poisoned.into_inner() = pair,
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn access_token(&self) -> Option<String> {
        self.read().access
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().refresh
    }

    fn set_tokens(&self, access_token: String, refresh_token: String) {
        self.write(TokenPair {
            access: Some(access_token),
            refresh: Some(refresh_token),
        });
    }

    fn clear_tokens(&self) {
        self.write(TokenPair::default());
    }
}

/// Adds `Authorization: Bearer <token>` when the storage holds an access token.
#[derive(Clone)]
pub struct AuthInterceptor {
    storage: Arc<dyn TokenStorage>,
}

impl AuthInterceptor {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn TokenStorage> {
        &self.storage
    }
}

impl std::fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInterceptor").finish_non_exhaustive()
    }
}

impl Interceptor for AuthInterceptor {
    fn intercept_request(&self, request: &RequestDescriptor) -> RequestDescriptor {
        let mut intercepted = request.clone();
        if let Some(token) = self.storage.access_token().filter(|token| !token.is_empty()) {
            intercepted
                .options
                .headers
                .insert(String::from("authorization"), format!("Bearer {token}"));
        }
        intercepted
    }
}
