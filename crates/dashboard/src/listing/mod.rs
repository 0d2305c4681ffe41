//! Paged, searchable, filterable listings.

mod cache;
mod controller;
mod fetch;

pub use cache::{Page, ResourceCache};
pub use controller::ListingController;
pub use fetch::{FetchOrchestrator, FetchOutcome, ListingSource, Sequencer, Settle, Ticket};
