//! User endpoints.

use super::client::segment;
use super::ApiClient;
use crate::errors::ClientResult;
use crate::models::{CreateUserRequest, UpdateUserRequest, User};

impl ApiClient {
    /// GET /users - List all users.
    pub async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.get("/users").await
    }

    /// GET /users/:id - Get a single user.
    pub async fn get_user(&self, id: &str) -> ClientResult<User> {
        self.get(&format!("/users/{}", segment(id))).await
    }

    /// POST /users - Create a new user.
    pub async fn create_user(&self, request: &CreateUserRequest) -> ClientResult<User> {
        self.post("/users", request).await
    }

    /// PUT /users/:id - Update a user.
    pub async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> ClientResult<User> {
        self.put(&format!("/users/{}", segment(id)), request).await
    }

    /// DELETE /users/:id - Delete a user.
    pub async fn delete_user(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/users/{}", segment(id))).await
    }
}
