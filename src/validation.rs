//! Client-side form validation.
//!
//! A form that fails validation is never submitted. Each `validate*` method turns
//! raw form input into the request body the backend expects, or a
//! [`ClientError::Validation`] listing every problem found.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ClientError, ClientResult};
use crate::models::{
    CreateUserRequest, Episode, EpisodeRequest, MaccmsSetting, Media, MediaRequest, MediaStatus,
    MediaType, Preferences, Role, UpdateUserRequest, User,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_YEAR: i32 = 1900;

/// Collects field errors for one form.
#[derive(Debug, Default)]
struct Problems(Vec<String>);

impl Problems {
    fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> ClientResult<T> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(ClientError::Validation(self.0.join("; ")))
        }
    }
}

/// True for absolute http(s) URLs.
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Split comma-separated tag input, trimming and dropping blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Edit form prefilled from an existing account. The password stays blank.
impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            password: String::new(),
            role: user.role.as_str().to_string(),
        }
    }
}

impl UserForm {
    fn check_common(&self, problems: &mut Problems) -> Option<Role> {
        problems.check(!self.username.trim().is_empty(), "Username is required");
        if self.email.trim().is_empty() {
            problems.check(false, "Email is required");
        } else {
            problems.check(is_email(self.email.trim()), "Invalid email format");
        }
        let role = Role::parse(self.role.trim());
        problems.check(role.is_some(), "Invalid role");
        role
    }

    /// A new user needs every field, including a password.
    pub fn validate_create(&self) -> ClientResult<CreateUserRequest> {
        let mut problems = Problems::default();
        let role = self.check_common(&mut problems);
        problems.check(!self.password.is_empty(), "Password is required");
        problems.check(
            self.password.is_empty() || self.password.chars().count() >= MIN_PASSWORD_LEN,
            "Password must be at least 6 characters",
        );
        problems.finish(|| CreateUserRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            email: self.email.trim().to_string(),
            role: role.unwrap_or(Role::User),
        })
    }

    /// On edit a blank password means "keep the current one" and is not sent.
    pub fn validate_update(&self) -> ClientResult<UpdateUserRequest> {
        let mut problems = Problems::default();
        let role = self.check_common(&mut problems);
        problems.check(
            self.password.is_empty() || self.password.chars().count() >= MIN_PASSWORD_LEN,
            "Password must be at least 6 characters",
        );
        problems.finish(|| UpdateUserRequest {
            username: Some(self.username.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            role,
            password: (!self.password.is_empty()).then(|| self.password.clone()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MediaForm {
    pub media_type: String,
    pub title: String,
    pub year: i32,
    pub episodes: i64,
    pub duration: u32,
    pub status: String,
    pub ongoing: bool,
    pub tags_input: String,
}

impl Default for MediaForm {
    fn default() -> Self {
        Self {
            media_type: MediaType::ANIME.as_str().to_string(),
            title: String::new(),
            year: chrono::Utc::now().year(),
            episodes: 0,
            duration: 0,
            status: MediaStatus::Pending.as_str().to_string(),
            ongoing: false,
            tags_input: String::new(),
        }
    }
}

impl From<&Media> for MediaForm {
    fn from(media: &Media) -> Self {
        Self {
            media_type: media.media_type.as_str().to_string(),
            title: media.title.clone(),
            year: media.year,
            episodes: i64::from(media.episode_count),
            duration: media.duration,
            status: media.status.as_str().to_string(),
            ongoing: media.ongoing,
            tags_input: media.tags.join(", "),
        }
    }
}

impl MediaForm {
    pub fn validate(&self) -> ClientResult<MediaRequest> {
        self.validate_for_year(chrono::Utc::now().year())
    }

    /// Validate with `current_year` as the reference for the year range.
    pub fn validate_for_year(&self, current_year: i32) -> ClientResult<MediaRequest> {
        let mut problems = Problems::default();
        let media_type = MediaType::parse(self.media_type.trim());
        problems.check(media_type.is_some(), "Media type is required");
        problems.check(!self.title.trim().is_empty(), "Original title is required");
        let status = MediaStatus::parse(self.status.trim());
        problems.check(status.is_some(), "Status is required");
        problems.check(
            (MIN_YEAR..=current_year + 5).contains(&self.year),
            "Year is out of range",
        );
        problems.check(
            self.episodes >= 0 && self.episodes <= i64::from(u32::MAX),
            "Number of episodes must not be negative",
        );

        problems.finish(|| MediaRequest {
            media_type: media_type.unwrap_or(MediaType::ANIME),
            original_title: self.title.trim().to_string(),
            year: self.year,
            episodes: u32::try_from(self.episodes).unwrap_or(0),
            duration: self.duration,
            status: status.unwrap_or(MediaStatus::Pending),
            is_ongoing: self.ongoing,
            tags: parse_tags(&self.tags_input),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct EpisodeForm {
    pub label: String,
    pub video: String,
    pub screenshots: Vec<String>,
}

/// Prefill from an existing episode. A summary has no assets to prefill with,
/// and submitting its empty fields would wipe the stored ones.
impl TryFrom<&Episode> for EpisodeForm {
    type Error = ClientError;

    fn try_from(episode: &Episode) -> ClientResult<Self> {
        let assets = episode.assets().ok_or_else(|| {
            ClientError::Validation(format!(
                "Episode {} must be expanded before editing",
                episode.id()
            ))
        })?;
        Ok(Self {
            label: episode.label().to_string(),
            video: assets.video.unwrap_or_default(),
            screenshots: assets.screenshots,
        })
    }
}

impl EpisodeForm {
    /// Append a screenshot URL; blank input is ignored.
    pub fn add_screenshot(&mut self, input: &str) {
        let input = input.trim();
        if !input.is_empty() {
            self.screenshots.push(input.to_string());
        }
    }

    pub fn remove_screenshot(&mut self, index: usize) {
        if index < self.screenshots.len() {
            self.screenshots.remove(index);
        }
    }

    pub fn validate(&self) -> ClientResult<EpisodeRequest> {
        let mut problems = Problems::default();
        problems.check(
            !self.label.trim().is_empty(),
            "Episode identifier is required",
        );
        let video = self.video.trim();
        problems.check(video.is_empty() || is_url(video), "Must be a valid URL");
        problems.finish(|| EpisodeRequest {
            episode: self.label.trim().to_string(),
            video: video.to_string(),
            screenshots: self.screenshots.clone(),
        })
    }
}

/// Validate a Maccms source or global setting.
pub fn validate_maccms(setting: &MaccmsSetting) -> ClientResult<MaccmsSetting> {
    let mut problems = Problems::default();
    let source_url = setting.source_url.trim();
    if source_url.is_empty() {
        problems.check(false, "URL is required");
    } else {
        problems.check(is_url(source_url), "Must be a valid URL");
    }
    let fetch_url = setting.fetch_url.trim();
    problems.check(
        fetch_url.is_empty() || is_url(fetch_url),
        "Fetch URL must be a valid URL",
    );
    problems.check(setting.schedule_date >= 0, "Date must be a positive number");
    problems.check(setting.cron_interval >= 0, "Cron must be a positive number");
    problems.check(setting.item_quota >= 0, "Quota must be a positive number");

    problems.finish(|| MaccmsSetting {
        source_url: source_url.to_string(),
        fetch_url: fetch_url.to_string(),
        delete_category: setting.delete_category.trim().to_string(),
        ..setting.clone()
    })
}

pub fn validate_preferences(prefs: &Preferences) -> ClientResult<Preferences> {
    let mut problems = Problems::default();
    let api_url = prefs.api_url.trim();
    if api_url.is_empty() {
        problems.check(false, "API URL is required");
    } else {
        problems.check(is_url(api_url), "Must be a valid URL");
    }
    problems.check(prefs.page_size >= 1, "Must be at least 1");
    problems.check(
        !prefs.language.trim().is_empty(),
        "Default language is required",
    );
    problems.check(
        prefs.refresh_interval >= 1,
        "Refresh interval must be at least 1",
    );

    problems.finish(|| Preferences {
        api_url: api_url.to_string(),
        language: prefs.language.trim().to_string(),
        ..prefs.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_form() -> UserForm {
        UserForm {
            username: "kaz".into(),
            email: "kaz@example.com".into(),
            password: "secret1".into(),
            role: "user".into(),
        }
    }

    #[test]
    fn test_user_create_requires_password() {
        let form = UserForm {
            password: String::new(),
            ..user_form()
        };
        let err = form.validate_create().unwrap_err();
        assert_eq!(err, ClientError::Validation("Password is required".into()));
    }

    #[test]
    fn test_user_update_omits_blank_password() {
        let form = UserForm {
            password: String::new(),
            ..user_form()
        };
        let request = form.validate_update().unwrap();
        assert_eq!(request.password, None);
        assert_eq!(request.role, Some(Role::User));
    }

    #[test]
    fn test_user_collects_all_problems() {
        let form = UserForm {
            username: " ".into(),
            email: "nope".into(),
            password: "123".into(),
            role: "root".into(),
        };
        let ClientError::Validation(msg) = form.validate_create().unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("Username is required"));
        assert!(msg.contains("Invalid email format"));
        assert!(msg.contains("Invalid role"));
        assert!(msg.contains("at least 6"));
    }

    #[test]
    fn test_media_year_range_and_tags() {
        let form = MediaForm {
            title: "Kaiju".into(),
            year: 2031,
            tags_input: " action, ,drama ,".into(),
            ..Default::default()
        };
        let request = form.validate_for_year(2026).unwrap();
        assert_eq!(request.tags, vec!["action", "drama"]);

        let too_late = MediaForm {
            year: 2032,
            ..form.clone()
        };
        assert!(too_late.validate_for_year(2026).is_err());

        let too_early = MediaForm { year: 1899, ..form };
        assert!(too_early.validate_for_year(2026).is_err());
    }

    #[test]
    fn test_media_negative_episodes() {
        let form = MediaForm {
            title: "Kaiju".into(),
            year: 2020,
            episodes: -1,
            ..Default::default()
        };
        assert!(form.validate_for_year(2026).is_err());
    }

    #[test]
    fn test_episode_form() {
        let mut form = EpisodeForm {
            label: "S01E01".into(),
            video: "not a url".into(),
            ..Default::default()
        };
        assert!(form.validate().is_err());

        form.video = String::new();
        form.add_screenshot("  ");
        form.add_screenshot(" /s/1.jpg ");
        form.add_screenshot("/s/2.jpg");
        form.remove_screenshot(0);
        form.remove_screenshot(7);
        let request = form.validate().unwrap();
        assert_eq!(request.screenshots, vec!["/s/2.jpg"]);
        assert_eq!(request.video, "");
    }

    #[test]
    fn test_episode_form_needs_detail_shape() {
        let summary = Episode::summary("e1", "S01E01");
        assert!(matches!(
            EpisodeForm::try_from(&summary),
            Err(ClientError::Validation(_))
        ));

        let detail = Episode::Detail {
            id: "e1".into(),
            label: "S01E01".into(),
            video: Some("/v/e1.mp4".into()),
            screenshots: vec!["/s/1.jpg".into()],
        };
        let form = EpisodeForm::try_from(&detail).unwrap();
        assert_eq!(form.video, "/v/e1.mp4");
        assert_eq!(form.screenshots, vec!["/s/1.jpg"]);
    }

    #[test]
    fn test_maccms_validation() {
        let setting = MaccmsSetting {
            source_url: "https://src.example/api.php".into(),
            fetch_url: "ftp://bad".into(),
            ..Default::default()
        };
        assert!(validate_maccms(&setting).is_err());

        let setting = MaccmsSetting {
            fetch_url: String::new(),
            ..setting
        };
        assert_eq!(validate_maccms(&setting).unwrap().item_quota, 10);

        assert!(validate_maccms(&MaccmsSetting::default()).is_err());
    }

    #[test]
    fn test_preferences_validation() {
        assert!(validate_preferences(&Preferences::default()).is_ok());
        let prefs = Preferences {
            page_size: 0,
            ..Default::default()
        };
        assert!(validate_preferences(&prefs).is_err());
    }
}
