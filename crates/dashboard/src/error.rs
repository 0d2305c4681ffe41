//! Error types of the dashboard controllers.
//!
//! Every variant is meant to be handled at the controller boundary: a
//! failure turns into a toast and leaves the panel usable.

use mapfood_core::InvalidTransition;
use mapfood_core::validation::ValidationErrors;
use thiserror::Error;

use crate::api::{ApiError, InvalidPeriod};
use crate::config::ConfigError;
use crate::session::MissingSessionError;

/// Loading a listing failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport or server failure; the cache was left unchanged.
    #[error("failed to load {kind}: {source}")]
    Api {
        kind: &'static str,
        #[source]
        source: ApiError,
    },

    /// The controller was disposed before the response arrived.
    #[error("request cancelled: controller disposed")]
    Cancelled,
}

/// A status transition or edit was not applied.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Another change to the same entity has not finished yet.
    #[error("a change to {kind} {id} is already in progress")]
    InFlight { kind: &'static str, id: String },

    /// The entity is not part of the loaded data.
    #[error("{kind} {id} is not loaded")]
    NotLoaded { kind: &'static str, id: String },

    /// The lifecycle policy does not allow the action.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The submitted form failed validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The backend rejected or failed the request.
    #[error("failed to update {kind} {id}: {source}")]
    Api {
        kind: &'static str,
        id: String,
        #[source]
        source: ApiError,
    },

    /// The controller was disposed before the response arrived.
    #[error("request cancelled: controller disposed")]
    Cancelled,
}

impl MutationError {
    /// Whether the request reached the backend.
    #[must_use]
    pub const fn was_sent(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Cancelled)
    }
}

/// Top-level error for front ends driving the controllers.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] MissingSessionError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Period(#[from] InvalidPeriod),

    #[error("Not found: {0}")]
    NotFound(String),
}
