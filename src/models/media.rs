//! Media and episode models matching the backend's media documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Catalog entry kind.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MediaType {
    ANIME,
    MANGA,
    NOVEL,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::ANIME => "ANIME",
            MediaType::MANGA => "MANGA",
            MediaType::NOVEL => "NOVEL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ANIME" => Some(MediaType::ANIME),
            "MANGA" => Some(MediaType::MANGA),
            "NOVEL" => Some(MediaType::NOVEL),
            _ => None,
        }
    }
}

/// Moderation status of a catalog entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Pending,
    Approved,
    Hidden,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Pending => "pending",
            MediaStatus::Approved => "approved",
            MediaStatus::Hidden => "hidden",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MediaStatus::Pending),
            "approved" => Some(MediaStatus::Approved),
            "hidden" => Some(MediaStatus::Hidden),
            _ => None,
        }
    }
}

/// Localized title and description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Video and screenshot assets of an episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeAssets {
    pub video: Option<String>,
    pub screenshots: Vec<String>,
}

/// An episode either as listed (summary) or fully loaded (detail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EpisodeWire", into = "EpisodeWire")]
pub enum Episode {
    Summary {
        id: String,
        label: String,
    },
    Detail {
        id: String,
        label: String,
        video: Option<String>,
        screenshots: Vec<String>,
    },
}

impl Episode {
    pub fn summary(id: impl Into<String>, label: impl Into<String>) -> Self {
        Episode::Summary {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Episode::Summary { id, .. } | Episode::Detail { id, .. } => id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Episode::Summary { label, .. } | Episode::Detail { label, .. } => label,
        }
    }

    pub fn is_detail(&self) -> bool {
        matches!(self, Episode::Detail { .. })
    }

    /// Summary fields of `self` combined with fetched assets.
    pub fn with_assets(&self, assets: EpisodeAssets) -> Self {
        Episode::Detail {
            id: self.id().to_string(),
            label: self.label().to_string(),
            video: assets.video,
            screenshots: assets.screenshots,
        }
    }

    /// Assets carried by a detail episode.
    pub fn assets(&self) -> Option<EpisodeAssets> {
        match self {
            Episode::Summary { .. } => None,
            Episode::Detail {
                video, screenshots, ..
            } => Some(EpisodeAssets {
                video: video.clone(),
                screenshots: screenshots.clone(),
            }),
        }
    }
}

/// JSON shape of an episode. A present `video` or `screenshots` key, even
/// null, marks the detail shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeWire {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub episode: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub video: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub screenshots: Option<Option<Vec<String>>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<EpisodeWire> for Episode {
    fn from(wire: EpisodeWire) -> Self {
        if wire.video.is_none() && wire.screenshots.is_none() {
            return Episode::Summary {
                id: wire.id,
                label: wire.episode,
            };
        }
        Episode::Detail {
            id: wire.id,
            label: wire.episode,
            video: wire.video.flatten().filter(|v| !v.is_empty()),
            screenshots: wire.screenshots.flatten().unwrap_or_default(),
        }
    }
}

impl From<Episode> for EpisodeWire {
    fn from(episode: Episode) -> Self {
        match episode {
            Episode::Summary { id, label } => EpisodeWire {
                id,
                episode: label,
                video: None,
                screenshots: None,
            },
            Episode::Detail {
                id,
                label,
                video,
                screenshots,
            } => EpisodeWire {
                id,
                episode: label,
                video: Some(video),
                screenshots: Some(Some(screenshots)),
            },
        }
    }
}

/// Request body for adding or updating an episode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeRequest {
    pub episode: String,
    pub video: String,
    pub screenshots: Vec<String>,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(rename = "_id")]
    pub id: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
    #[serde(rename = "originalTitle")]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub year: i32,
    #[serde(rename = "episodes", default)]
    pub episode_count: u32,
    #[serde(default)]
    pub duration: u32,
    pub status: MediaStatus,
    #[serde(rename = "isOngoing", default)]
    pub ongoing: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "episodesList", default)]
    pub episodes: Vec<Episode>,
    #[serde(rename = "pv", default)]
    pub view_count: u64,
    #[serde(rename = "averageRating", default)]
    pub rating: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Media {
    pub fn episode(&self, episode_id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.id() == episode_id)
    }
}

/// Request body for creating or updating a media entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    pub media_type: MediaType,
    pub original_title: String,
    pub year: i32,
    pub episodes: u32,
    pub duration: u32,
    pub status: MediaStatus,
    pub is_ongoing: bool,
    pub tags: Vec<String>,
}

/// Query for `GET /api/media`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFilter {
    pub media_type: Option<MediaType>,
    pub status: Option<MediaStatus>,
    pub ongoing: Option<bool>,
    pub tags: Vec<String>,
    pub sort: Option<String>,
    pub limit: u32,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            media_type: None,
            status: None,
            ongoing: None,
            tags: Vec::new(),
            sort: Some("createdAt:desc".to_string()),
            limit: 10,
        }
    }
}

impl MediaFilter {
    /// Query pairs in the order the backend documents them.
    pub fn query_pairs(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(media_type) = self.media_type {
            pairs.push(("mediaType", media_type.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(ongoing) = self.ongoing {
            pairs.push(("isOngoing", ongoing.to_string()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        if page > 0 {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_episode_shape_from_wire() {
        let summary: Episode = serde_json::from_value(json!({"_id": "e1", "episode": "S01E01"})).unwrap();
        assert_eq!(summary, Episode::summary("e1", "S01E01"));

        // Presence of the key marks detail even when null.
        let detail: Episode =
            serde_json::from_value(json!({"_id": "e2", "episode": "S01E02", "video": null})).unwrap();
        assert_eq!(
            detail,
            Episode::Detail {
                id: "e2".into(),
                label: "S01E02".into(),
                video: None,
                screenshots: vec![],
            }
        );

        let empty: Episode =
            serde_json::from_value(json!({"_id": "e3", "episode": "S01E03", "screenshots": []})).unwrap();
        assert!(empty.is_detail());
    }

    #[test]
    fn test_summary_serializes_without_assets() {
        let value = serde_json::to_value(Episode::summary("e1", "S01E01")).unwrap();
        assert_eq!(value, json!({"_id": "e1", "episode": "S01E01"}));
    }

    #[test]
    fn test_media_wire_names() {
        let media: Media = serde_json::from_value(json!({
            "_id": "m1",
            "mediaType": "ANIME",
            "originalTitle": "Kaiju",
            "year": 2021,
            "episodes": 12,
            "status": "approved",
            "isOngoing": true,
            "tags": ["action"],
            "episodesList": [{"_id": "e1", "episode": "1"}],
            "pv": 42,
            "averageRating": 4.5,
            "translations": {"en": {"title": "Kaiju", "description": "Big"}}
        }))
        .unwrap();
        assert_eq!(media.title, "Kaiju");
        assert_eq!(media.episode_count, 12);
        assert!(media.ongoing);
        assert_eq!(media.view_count, 42);
        assert_eq!(media.translations["en"].description, "Big");
        assert_eq!(media.episode("e1").map(Episode::label), Some("1"));
    }

    #[test]
    fn test_filter_query_pairs() {
        let filter = MediaFilter {
            media_type: Some(MediaType::ANIME),
            ongoing: Some(false),
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        assert_eq!(
            filter.query_pairs(2),
            vec![
                ("mediaType", "ANIME".to_string()),
                ("isOngoing", "false".to_string()),
                ("tags", "a,b".to_string()),
                ("sort", "createdAt:desc".to_string()),
                ("limit", "10".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }
}
