//! Data models for the admin client.
//!
//! Field names follow the backend's JSON documents so requests and responses
//! round-trip without hand-written mapping.

mod maccms;
mod media;
mod pagination;
mod preferences;
mod user;

pub use maccms::*;
pub use media::*;
pub use pagination::*;
pub use preferences::*;
pub use user::*;
