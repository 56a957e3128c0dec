//! The admin console: owns the session, the gate and the backend client.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::errors::{ClientError, ClientResult};
use crate::gate::{AccessGate, Decision};
use crate::models::{LoginRequest, MediaFilter, Preferences, API_URL_KEY};
use crate::session::{Session, SessionManager};
use crate::store::{init_store, LocalStore};
use crate::validation::validate_preferences;
use crate::views::{
    DashboardSummary, ListView, MaccmsSource, MediaDetailView, MediaSource, UserSource,
};

pub struct Console {
    config: Config,
    store: LocalStore,
    sessions: Arc<SessionManager>,
    api: Arc<ApiClient>,
    gate: AccessGate,
    preferences: Preferences,
}

impl Console {
    /// Open the local store, restore any persisted session and mount the gate.
    ///
    /// A stored `apiUrl` preference takes precedence over `config.api_url`.
    pub async fn open(config: Config) -> ClientResult<Self> {
        let pool = init_store(&config.data_path).await?;
        let store = LocalStore::new(pool);

        let mut preferences = store.load_preferences().await?;
        if store.get(API_URL_KEY).await?.is_none() {
            preferences.api_url = config.api_url.clone();
        }

        let sessions = Arc::new(SessionManager::open(store.clone()).await);
        let api = Arc::new(ApiClient::new(
            &preferences.api_url,
            config.request_timeout,
            Arc::clone(&sessions),
        )?);
        let mut gate = AccessGate::new(Arc::clone(&sessions));
        gate.mount().await;

        tracing::info!("Console ready against {}", api.base_url());

        Ok(Self {
            config,
            store,
            sessions,
            api,
            gate,
            preferences,
        })
    }

    pub fn api(&self) -> Arc<ApiClient> {
        Arc::clone(&self.api)
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.sessions.current().await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<Decision> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&request).await?;
        self.gate.complete_login(&response).await
    }

    pub async fn logout(&mut self) -> Decision {
        tracing::info!("Signing out");
        self.gate.logout().await
    }

    /// Navigate to `path`, re-checking the session.
    pub async fn open_route(&mut self, path: &str) -> Decision {
        self.gate.navigate(path).await
    }

    /// Apply the console-wide reaction to a failed call. An authentication
    /// failure ends the session and yields the login redirect.
    pub async fn handle_error(&mut self, err: &ClientError) -> Option<Decision> {
        if err.is_auth() {
            tracing::warn!("Authentication rejected, forcing logout: {}", err);
            return Some(self.gate.logout().await);
        }
        None
    }

    /// Pass `result` through, forcing a logout first when it is an auth failure.
    pub async fn guard<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(e) = &result {
            self.handle_error(e).await;
        }
        result
    }

    pub fn users_view(&self) -> ListView<UserSource> {
        ListView::new(UserSource::new(self.api()), self.preferences.page_size)
    }

    /// Media pages follow the filter's `limit`, not the list page size preference.
    pub fn media_view(&self) -> ListView<MediaSource> {
        ListView::new(MediaSource::new(self.api()), MediaFilter::default().limit)
    }

    pub fn maccms_view(&self) -> ListView<MaccmsSource> {
        ListView::new(MaccmsSource::new(self.api()), self.preferences.page_size)
    }

    pub fn media_detail(&self, media_id: &str) -> MediaDetailView<ApiClient> {
        MediaDetailView::new(media_id, self.api())
    }

    pub async fn dashboard(&mut self) -> ClientResult<DashboardSummary> {
        let result = DashboardSummary::load(&self.api).await;
        self.guard(result).await
    }

    /// Validate and persist preferences. A changed base URL takes effect for
    /// every view created afterwards.
    pub async fn save_preferences(&mut self, prefs: &Preferences) -> ClientResult<()> {
        let prefs = validate_preferences(prefs)?;
        self.store.save_preferences(&prefs).await?;

        if prefs.api_url != self.api.base_url() {
            self.api = Arc::new(ApiClient::new(
                &prefs.api_url,
                self.config.request_timeout,
                Arc::clone(&self.sessions),
            )?);
            tracing::info!("Backend switched to {}", self.api.base_url());
        }
        self.preferences = prefs;
        Ok(())
    }

    pub async fn close(&self) {
        self.sessions.close().await;
    }
}
