// src/api/auth.rs

use async_trait::async_trait;

use crate::api::{ApiClient, AuthApi, AuthResponse, Credentials};
use crate::infra::errors::Result;

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.post_json("/auth/login", credentials).await
    }

    async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.post_json("/auth/signup", credentials).await
    }
}
