//! Advault API Library
//!
//! HTTP surface over the ingestion pipeline: process one or many ad URLs,
//! read stored ads, serve stored videos.

mod api_doc;
mod handlers;
mod telemetry;

pub mod error;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
