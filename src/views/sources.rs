//! Backend-backed list sources and their create/update actions.

use std::sync::Arc;

use async_trait::async_trait;

use super::list::{ListSource, ListView};
use crate::api::ApiClient;
use crate::errors::ClientResult;
use crate::models::{MaccmsConfig, MaccmsSetting, Media, MediaFilter, Page, Role, User};
use crate::validation::{validate_maccms, MediaForm, UserForm};

/// Client-side filter for the user list, which the backend returns unpaginated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |r| user.role == r)
            && self.active.map_or(true, |a| user.is_active == a)
    }
}

/// Client-side filter for Maccms sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaccmsFilter {
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UserSource {
    api: Arc<ApiClient>,
}

impl UserSource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for UserSource {
    type Item = User;
    type Filter = UserFilter;

    const NOUN: &'static str = "User";

    async fn fetch_page(&self, filter: &UserFilter, page: u32, limit: u32) -> ClientResult<Page<User>> {
        let users = self.api.list_users().await?;
        let users = users.into_iter().filter(|u| filter.matches(u)).collect();
        Ok(Page::slice(users, page, limit))
    }

    async fn delete_item(&self, id: &str) -> ClientResult<()> {
        self.api.delete_user(id).await
    }

    fn item_id(item: &User) -> &str {
        &item.id
    }
}

#[derive(Debug, Clone)]
pub struct MediaSource {
    api: Arc<ApiClient>,
}

impl MediaSource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for MediaSource {
    type Item = Media;
    type Filter = MediaFilter;

    const NOUN: &'static str = "Media";

    /// Paginated by the backend. The filter's own `limit` wins; the view's page
    /// size only fills in when the filter leaves it at zero.
    async fn fetch_page(&self, filter: &MediaFilter, page: u32, limit: u32) -> ClientResult<Page<Media>> {
        if filter.limit > 0 {
            return self.api.list_media(filter, page).await;
        }
        let filter = MediaFilter {
            limit,
            ..filter.clone()
        };
        self.api.list_media(&filter, page).await
    }

    async fn delete_item(&self, id: &str) -> ClientResult<()> {
        self.api.delete_media(id).await
    }

    fn item_id(item: &Media) -> &str {
        &item.id
    }
}

#[derive(Debug, Clone)]
pub struct MaccmsSource {
    api: Arc<ApiClient>,
}

impl MaccmsSource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ListSource for MaccmsSource {
    type Item = MaccmsConfig;
    type Filter = MaccmsFilter;

    const NOUN: &'static str = "Maccms";

    async fn fetch_page(
        &self,
        filter: &MaccmsFilter,
        page: u32,
        limit: u32,
    ) -> ClientResult<Page<MaccmsConfig>> {
        let configs = self.api.list_maccms().await?;
        let configs = configs
            .into_iter()
            .filter(|c| filter.active.map_or(true, |a| c.active == a))
            .collect();
        Ok(Page::slice(configs, page, limit))
    }

    async fn delete_item(&self, id: &str) -> ClientResult<()> {
        self.api.delete_maccms(id).await
    }

    fn item_id(item: &MaccmsConfig) -> &str {
        &item.id
    }
}

impl ListView<UserSource> {
    pub async fn create(&mut self, form: &UserForm) -> ClientResult<User> {
        let request = form.validate_create()?;
        let api = Arc::clone(&self.source().api);
        self.mutate("User created successfully", async move {
            api.create_user(&request).await
        })
        .await
    }

    pub async fn update(&mut self, id: &str, form: &UserForm) -> ClientResult<User> {
        let request = form.validate_update()?;
        let api = Arc::clone(&self.source().api);
        let id = id.to_string();
        self.mutate("User updated successfully", async move {
            api.update_user(&id, &request).await
        })
        .await
    }
}

impl ListView<MediaSource> {
    pub async fn create(&mut self, form: &MediaForm) -> ClientResult<Media> {
        let request = form.validate()?;
        let api = Arc::clone(&self.source().api);
        self.mutate("Media created successfully", async move {
            api.create_media(&request).await
        })
        .await
    }

    pub async fn update(&mut self, id: &str, form: &MediaForm) -> ClientResult<Media> {
        let request = form.validate()?;
        let api = Arc::clone(&self.source().api);
        let id = id.to_string();
        self.mutate("Media updated successfully", async move {
            api.update_media(&id, &request).await
        })
        .await
    }
}

impl ListView<MaccmsSource> {
    pub async fn create(&mut self, setting: &MaccmsSetting) -> ClientResult<MaccmsConfig> {
        let request = validate_maccms(setting)?;
        let api = Arc::clone(&self.source().api);
        self.mutate("Maccms created successfully", async move {
            api.create_maccms(&request).await
        })
        .await
    }

    pub async fn update(&mut self, id: &str, setting: &MaccmsSetting) -> ClientResult<MaccmsConfig> {
        let request = validate_maccms(setting)?;
        let api = Arc::clone(&self.source().api);
        let id = id.to_string();
        self.mutate("Maccms updated successfully", async move {
            api.update_maccms(&id, &request).await
        })
        .await
    }

    /// Apply default values across every source, then refetch.
    pub async fn configure_setting(&mut self, setting: &MaccmsSetting) -> ClientResult<MaccmsSetting> {
        let request = validate_maccms(setting)?;
        let api = Arc::clone(&self.source().api);
        self.mutate("Maccms settings updated successfully", async move {
            api.configure_maccms_setting(&request).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, active: bool) -> User {
        User {
            id: "u".into(),
            username: "u".into(),
            email: "u@x.io".into(),
            role,
            is_active: active,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_user_filter() {
        let admins = UserFilter {
            role: Some(Role::Admin),
            active: None,
        };
        assert!(admins.matches(&user(Role::Admin, false)));
        assert!(!admins.matches(&user(Role::User, true)));

        let inactive = UserFilter {
            role: None,
            active: Some(false),
        };
        assert!(inactive.matches(&user(Role::User, false)));
        assert!(UserFilter::default().matches(&user(Role::User, true)));
    }
}
