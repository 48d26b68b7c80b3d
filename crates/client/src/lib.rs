//! HTTP implementations of the storefront's remote collaborators.

pub mod storefront;
pub mod weather;

use thiserror::Error;

pub use storefront::{StorefrontClient, SubmitError};
pub use weather::OpenWeatherProvider;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
    #[error("invalid base url `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },
}
