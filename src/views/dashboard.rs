//! Dashboard summary.

use crate::api::ApiClient;
use crate::errors::ClientResult;
use crate::models::{Media, MediaFilter, MediaStatus};

/// How many recent media the dashboard shows.
pub const RECENT_MEDIA: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub users: usize,
    pub media_total: u64,
    pub maccms_sources: usize,
    pub recent: Vec<Media>,
    /// Sum of view counts over `recent`.
    pub recent_views: u64,
    pub pending: usize,
    pub approved: usize,
    pub hidden: usize,
}

impl DashboardSummary {
    /// Fetch users, the newest media page and Maccms sources concurrently.
    pub async fn load(api: &ApiClient) -> ClientResult<Self> {
        let filter = MediaFilter {
            limit: RECENT_MEDIA,
            ..Default::default()
        };
        let (users, media, maccms) = tokio::try_join!(
            api.list_users(),
            api.list_media(&filter, 1),
            api.list_maccms()
        )?;

        let summary = Self::from_parts(users.len(), media.total, maccms.len(), media.items);
        tracing::debug!(
            "Dashboard: {} users, {} media, {} sources",
            summary.users,
            summary.media_total,
            summary.maccms_sources
        );
        Ok(summary)
    }

    pub fn from_parts(users: usize, media_total: u64, maccms_sources: usize, recent: Vec<Media>) -> Self {
        let count = |status: MediaStatus| recent.iter().filter(|m| m.status == status).count();
        Self {
            users,
            media_total,
            maccms_sources,
            recent_views: recent.iter().map(|m| m.view_count).sum(),
            pending: count(MediaStatus::Pending),
            approved: count(MediaStatus::Approved),
            hidden: count(MediaStatus::Hidden),
            recent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn media(id: &str, status: &str, pv: u64) -> Media {
        serde_json::from_value(json!({
            "_id": id,
            "mediaType": "ANIME",
            "originalTitle": id,
            "status": status,
            "pv": pv
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_counts_recent_media() {
        let summary = DashboardSummary::from_parts(
            3,
            42,
            2,
            vec![
                media("a", "pending", 10),
                media("b", "approved", 5),
                media("c", "approved", 0),
                media("d", "hidden", 1),
            ],
        );

        assert_eq!(summary.recent_views, 16);
        assert_eq!((summary.pending, summary.approved, summary.hidden), (1, 2, 1));
        assert_eq!(summary.media_total, 42);
    }
}
