//! MapFood Core - Shared domain library.
//!
//! This crate provides the types and policies used by every MapFood dashboard
//! component:
//! - `dashboard` - Listing, mutation and confirmation controllers
//! - `cli` - Command-line front end for the dashboards
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure policies - no I/O, no
//! HTTP clients, no async runtime. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money and status domains
//! - [`entity`] - Server-owned records and their partial updates
//! - [`lifecycle`] - Allowed transitions and action eligibility
//! - [`query`] - Search, filter and page state of a listing
//! - [`validation`] - Client-side form rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entity;
pub mod lifecycle;
pub mod query;
pub mod types;
pub mod validation;

pub use entity::Resource;
pub use lifecycle::{InvalidTransition, Lifecycle};
pub use types::*;
