//! Screenshot admin console
//!
//! Client core for the media screenshot admin backend: a persisted session,
//! an access gate re-checked on every navigation, lazy episode hydration and
//! list views that refetch after every write.

pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod gate;
pub mod hydrator;
pub mod models;
pub mod session;
pub mod store;
pub mod validation;
pub mod views;

pub use app::Console;
pub use errors::{ClientError, ClientResult};
