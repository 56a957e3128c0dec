//! Session store.
//!
//! Holds the bearer credential and the profile of the signed-in operator. The two
//! are written and removed together, so the store is either fully signed in or
//! fully signed out. Reads never fail: anything unreadable counts as signed out
//! and is cleaned up on the spot.

mod claims;

pub use claims::decode_expiry;

#[cfg(test)]
pub(crate) use claims::test_support;

use chrono::{DateTime, Utc};

use crate::errors::{ClientError, ClientResult};
use crate::models::User;
use crate::store::LocalStore;

/// Storage key of the bearer credential.
pub const TOKEN_KEY: &str = "auto_screenshot_token";
/// Storage key of the serialized profile.
pub const USER_KEY: &str = "auto_screenshot_user";

/// A signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub expires_at: DateTime<Utc>,
    pub profile: User,
}

/// Owner of the persisted session. Constructed once at startup and shared by
/// reference with everything that needs to know who is signed in.
#[derive(Debug)]
pub struct SessionManager {
    store: LocalStore,
}

impl SessionManager {
    /// Attach to the local store, reporting any session left from a previous run.
    pub async fn open(store: LocalStore) -> Self {
        let manager = Self { store };
        match manager.current().await {
            Some(session) => tracing::info!(
                "Restored session for {} (expires {})",
                session.profile.username,
                session.expires_at
            ),
            None => tracing::debug!("No persisted session"),
        }
        manager
    }

    /// Persist a credential and profile together.
    ///
    /// A credential without a readable expiry is rejected and nothing is stored.
    pub async fn set_session(&self, credential: &str, profile: &User) -> ClientResult<Session> {
        let expires_at = decode_expiry(credential).ok_or_else(|| {
            ClientError::Decode("Credential carries no readable expiry".to_string())
        })?;
        let profile_json = serde_json::to_string(profile)?;

        self.store
            .set_many(&[(TOKEN_KEY, credential), (USER_KEY, profile_json.as_str())])
            .await?;

        tracing::info!("Session stored for {} until {}", profile.username, expires_at);

        Ok(Session {
            credential: credential.to_string(),
            expires_at,
            profile: profile.clone(),
        })
    }

    pub async fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now()).await
    }

    /// Whether a complete, unexpired session exists at `now`. An expiry equal to
    /// `now` counts as expired.
    pub async fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.session_at(now).await.is_some()
    }

    pub async fn current(&self) -> Option<Session> {
        self.session_at(Utc::now()).await
    }

    /// The full session if it is valid at `now`; otherwise clears whatever
    /// partial or stale state is stored and returns `None`.
    pub async fn session_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let credential = match self.store.get(TOKEN_KEY).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!("Failed to read credential: {}", e);
                return None;
            }
        };

        let Some(credential) = credential else {
            // A profile without a credential is a half-written session.
            if self.get_profile().await.is_some() {
                self.clear_session().await;
            }
            return None;
        };

        let Some(expires_at) = decode_expiry(&credential) else {
            tracing::warn!("Stored credential is malformed, clearing session");
            self.clear_session().await;
            return None;
        };

        if expires_at <= now {
            tracing::info!("Session expired at {}", expires_at);
            self.clear_session().await;
            return None;
        }

        let Some(profile) = self.get_profile().await else {
            tracing::warn!("Credential stored without a profile, clearing session");
            self.clear_session().await;
            return None;
        };

        Some(Session {
            credential,
            expires_at,
            profile,
        })
    }

    /// The last persisted profile, without any expiry check. A profile that no
    /// longer parses is removed.
    pub async fn get_profile(&self) -> Option<User> {
        let raw = match self.store.get(USER_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read profile: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Stored profile is corrupt, removing it: {}", e);
                if let Err(e) = self.store.remove(USER_KEY).await {
                    tracing::warn!("Failed to remove corrupt profile: {}", e);
                }
                None
            }
        }
    }

    /// The raw stored credential, for the `Authorization` header.
    pub async fn credential(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!("Failed to read credential: {}", e);
                None
            }
        }
    }

    /// Remove credential and profile. Safe to call when already signed out.
    pub async fn clear_session(&self) {
        match self.store.remove_many(&[TOKEN_KEY, USER_KEY]).await {
            Ok(()) => tracing::debug!("Session cleared"),
            Err(e) => tracing::error!("Failed to clear session: {}", e),
        }
    }

    /// Release the underlying store.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::credential_expiring_at;
    use super::*;
    use crate::models::Role;
    use crate::store::test_support::temp_store;
    use chrono::{Duration, TimeZone};

    fn profile(role: Role) -> User {
        User {
            id: "u1".into(),
            username: "kaz".into(),
            email: "kaz@example.com".into(),
            role,
            is_active: true,
            created_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let (store, _dir) = temp_store().await;
        let sessions = SessionManager::open(store).await;
        let expires_at = Utc.timestamp_opt(2_000_000_000, 0).unwrap();

        sessions
            .set_session(&credential_expiring_at(expires_at), &profile(Role::User))
            .await
            .unwrap();

        assert!(
            sessions
                .is_authenticated_at(expires_at - Duration::seconds(1))
                .await
        );
        assert!(!sessions.is_authenticated_at(expires_at).await);
        // Expiry detection destroys the session.
        assert_eq!(sessions.credential().await, None);
        assert_eq!(sessions.get_profile().await, None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (store, _dir) = temp_store().await;
        let sessions = SessionManager::open(store).await;

        sessions.clear_session().await;
        assert!(!sessions.is_authenticated().await);

        sessions
            .set_session(
                &credential_expiring_at(Utc::now() + Duration::hours(1)),
                &profile(Role::Admin),
            )
            .await
            .unwrap();
        assert!(sessions.is_authenticated().await);

        sessions.clear_session().await;
        sessions.clear_session().await;
        assert!(!sessions.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_malformed_credential_is_cleaned_up() {
        let (store, _dir) = temp_store().await;
        store.set(TOKEN_KEY, "garbage").await.unwrap();
        store
            .set(USER_KEY, &serde_json::to_string(&profile(Role::User)).unwrap())
            .await
            .unwrap();
        let sessions = SessionManager::open(store.clone()).await;

        assert!(!sessions.is_authenticated().await);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(store.get(USER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_profile_reads_as_absent() {
        let (store, _dir) = temp_store().await;
        store.set(USER_KEY, "{not json").await.unwrap();
        let sessions = SessionManager::open(store.clone()).await;

        assert_eq!(sessions.get_profile().await, None);
        assert_eq!(store.get(USER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_profile_readable_after_expiry_check_is_skipped() {
        let (store, _dir) = temp_store().await;
        let sessions = SessionManager::open(store).await;
        let user = profile(Role::Admin);

        sessions
            .set_session(&credential_expiring_at(Utc::now() + Duration::hours(1)), &user)
            .await
            .unwrap();

        assert_eq!(sessions.get_profile().await, Some(user));
    }

    #[tokio::test]
    async fn test_set_session_rejects_unreadable_credential() {
        let (store, _dir) = temp_store().await;
        let sessions = SessionManager::open(store.clone()).await;

        let err = sessions
            .set_session("opaque", &profile(Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(store.get(USER_KEY).await.unwrap(), None);
    }
}
