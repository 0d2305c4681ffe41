//! MapFood Dashboard - controller library for the MapFood dashboards.
//!
//! Drives the administrator, store-director and customer dashboards against
//! the MapFood backend without any rendering layer: a front end (the `mapfood`
//! CLI, or a UI) calls controller operations and renders what they hold.
//!
//! # Architecture
//!
//! ```text
//! QueryState ──▶ FetchOrchestrator ──▶ BackendApi
//!                      │
//!                      ▼
//!               ResourceCache ◀── MutationCoordinator ◀── ConfirmationGate
//! ```
//!
//! Every controller owns its query, cache, fetch orchestrator, mutation
//! coordinator and a [`CancelToken`]. Failures never escape a controller as
//! panics: each one becomes a typed error for the caller plus one toast.
//!
//! # Modules
//!
//! - [`api`] - Typed backend endpoints and the reqwest client
//! - [`config`] - Environment configuration
//! - [`session`] - The signed-in user
//! - [`listing`] - Query, fetch ordering and cache of a listing
//! - [`mutation`] - Per-entity mutation serialization and reconciliation
//! - [`gate`] - Confirmation workflow for destructive actions
//! - [`controllers`] - One controller per dashboard page

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cancel;
pub mod config;
pub mod controllers;
pub mod error;
pub mod gate;
pub mod listing;
pub mod mutation;
pub mod notify;
pub mod session;

pub use api::{ApiError, BackendApi, HttpBackend};
pub use cancel::CancelToken;
pub use config::{ApiConfig, ConfigError, DashboardConfig};
pub use error::{DashboardError, FetchError, MutationError};
pub use gate::{ConfirmationGate, GateOutcome, GateState, Pending};
pub use listing::{FetchOutcome, ListingController};
pub use mutation::{Mutation, MutationCoordinator, MutationOutcome, Reconcile};
pub use notify::{MemoryNotifier, Notifier, Toast, ToastLevel, TracingNotifier};
pub use session::{CurrentUser, MissingSessionError, SessionFile};
