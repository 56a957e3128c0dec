//! Login endpoint.

use super::ApiClient;
use crate::errors::ClientResult;
use crate::models::{LoginRequest, LoginResponse};

impl ApiClient {
    /// POST /users/login - Exchange username and password for a credential.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        tracing::info!("Logging in as {}", request.username);
        self.post("/users/login", request).await
    }
}
