//! View models behind each console screen.

mod dashboard;
mod generation;
mod list;
mod media_detail;
mod notice;
mod sources;
mod table;

pub use dashboard::{DashboardSummary, RECENT_MEDIA};
pub use generation::Generation;
pub use list::{ListSource, ListView, LoadOutcome};
pub use media_detail::{DetailState, ExpandOutcome, MediaDetailView, MediaRecordSource};
pub use notice::{Notice, Notices, Severity, AUTO_DISMISS_SECS};
pub use sources::{MaccmsFilter, MaccmsSource, MediaSource, UserFilter, UserSource};
pub use table::{Table, EMPTY_ROW};
