//! Server-owned records mirrored by the dashboards.
//!
//! Field names follow the backend's JSON (a mix of `snake_case` and
//! `camelCase`); the Rust side always uses `snake_case`. Every entity
//! implements [`Resource`], which is what lets the dashboard cache patch an
//! item in place.

mod account;
mod food;
mod order;
mod revenue;
mod shop;

use core::fmt;
use core::hash::Hash;

use serde::{Deserialize, Serialize};

pub use account::{Account, AccountPatch, AccountProfile, RoleRef};
pub use food::{Food, FoodPatch};
pub use order::{
    LineItemFood, Order, OrderCustomer, OrderLineItem, OrderPatch, OrderShop, Receiver,
};
pub use revenue::{FoodSale, RevenueReport, RevenueShop, RevenueSummary};
pub use shop::{Address, AddressPatch, Shop, ShopOwner, ShopPatch};

/// An entity that can be cached by id and patched in place.
pub trait Resource: Clone + Send + Sync + 'static {
    /// Typed identifier of the entity.
    type Id: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    /// Partial update: the fields a mutation request sends.
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    /// Short lowercase name used in logs and messages.
    const KIND: &'static str;

    /// The entity's id.
    fn id(&self) -> &Self::Id;

    /// Overwrite exactly the fields present in `patch`.
    fn apply_patch(&mut self, patch: &Self::Patch);
}

/// A reference to another record, either as a bare id or populated.
///
/// The backend populates references on some endpoints and not on others, so
/// both shapes must decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<I> {
    /// Bare id.
    Id(I),
    /// Populated record; only the id and display name are kept.
    Populated {
        #[serde(rename = "_id")]
        id: I,
        #[serde(default)]
        name: Option<String>,
    },
}

impl<I> Reference<I> {
    /// The referenced id, whichever shape was sent.
    #[must_use]
    pub const fn id(&self) -> &I {
        match self {
            Self::Id(id) | Self::Populated { id, .. } => id,
        }
    }

    /// Display name when the reference was populated.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated { name, .. } => name.as_deref(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CategoryId;

    #[test]
    fn test_reference_decodes_both_shapes() {
        let bare: Reference<CategoryId> = serde_json::from_str("\"c1\"").unwrap();
        assert_eq!(bare.id().as_str(), "c1");
        assert_eq!(bare.name(), None);

        let populated: Reference<CategoryId> =
            serde_json::from_str(r#"{"_id":"c1","name":"FOOD"}"#).unwrap();
        assert_eq!(populated.id().as_str(), "c1");
        assert_eq!(populated.name(), Some("FOOD"));
    }
}
