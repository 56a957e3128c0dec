//! REST API client.
//!
//! One file per backend resource, each adding methods to [`ApiClient`].

mod auth;
mod client;
mod maccms;
mod media;
mod users;

pub use client::ApiClient;
pub use media::EpisodeDetailResponse;
