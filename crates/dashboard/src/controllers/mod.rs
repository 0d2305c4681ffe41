//! One controller per dashboard page.
//!
//! Each controller owns its listing (query, cache, fetch, mutations), one
//! [`ConfirmationGate`] per destructive action, and a handle to the backend.
//! Controllers that act on behalf of the signed-in user take a
//! [`CurrentUser`](crate::session::CurrentUser) at construction and cannot be
//! built without one.

mod accounts;
mod foods;
mod orders;
mod revenue;
mod shop_profile;
mod shops;

pub use accounts::{AccountSource, AccountsController, ROLES, role_id, role_name};
pub use foods::{FoodSource, FoodsController};
pub use orders::{OrderSource, OrderTab, OrdersController};
pub use revenue::RevenueController;
pub use shop_profile::{ProfileSource, ShopProfileController};
pub use shops::{ShopSource, ShopsController};

use mapfood_core::{InvalidTransition, Lifecycle, Resource};

use crate::error::MutationError;
use crate::gate::{ConfirmationGate, Pending};
use crate::listing::{ListingController, ListingSource};

/// Gate target of a status transition.
pub type Transition<R> = Pending<<R as Resource>::Id, <R as Lifecycle>::Action>;

/// The single action a two-state toggle offers right now.
fn toggle_action<R: Lifecycle>(entity: &R) -> Result<R::Action, InvalidTransition> {
    entity
        .allowed_actions()
        .into_iter()
        .next()
        .ok_or_else(|| InvalidTransition {
            kind: <R as Lifecycle>::KIND,
            from: entity.status().to_string(),
            action: "toggle".to_owned(),
        })
}

/// Check `action` against the cached entity and open `gate` on it.
///
/// Refusals are toasted and nothing is opened.
async fn open_transition<R, S>(
    listing: &ListingController<R, S>,
    gate: &ConfirmationGate<Transition<R>>,
    id: &R::Id,
    action: Option<R::Action>,
    label: impl FnOnce(&R) -> String + Send,
) -> Result<Transition<R>, MutationError>
where
    R: Resource + Lifecycle,
    R::Action: Send,
    S: ListingSource<R>,
{
    let entity = listing.entity(id).await.map_err(|e| listing.refuse(e))?;
    let action = match action {
        Some(action) => action,
        None => toggle_action(&entity).map_err(|e| listing.refuse(e))?,
    };
    entity.apply(action).map_err(|e| listing.refuse(e))?;

    let pending = Pending {
        id: id.clone(),
        action,
        label: label(&entity),
    };
    if !gate.open(pending.clone()) {
        return Err(listing.refuse(MutationError::InFlight {
            kind: <R as Resource>::KIND,
            id: id.to_string(),
        }));
    }
    Ok(pending)
}

/// Re-check a confirmed transition against the latest cached entity.
///
/// The entity may have changed between opening the gate and confirming it.
async fn recheck<R, S>(
    listing: &ListingController<R, S>,
    pending: &Transition<R>,
) -> Result<(R, R::Status), MutationError>
where
    R: Resource + Lifecycle,
    S: ListingSource<R>,
{
    let entity = listing
        .entity(&pending.id)
        .await
        .map_err(|e| listing.refuse(e))?;
    let next = entity
        .apply(pending.action)
        .map_err(|e| listing.refuse(e))?;
    Ok((entity, next))
}
