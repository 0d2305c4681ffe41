//! Menu management (store director).
//!
//! The backend returns the owner's whole menu in one response, so search is
//! applied in memory and never refetches.

use std::sync::Arc;

use mapfood_core::entity::{Food, FoodPatch};
use mapfood_core::lifecycle::FoodAction;
use mapfood_core::query::{QuerySnapshot, QueryState};
use mapfood_core::validation::FoodForm;
use mapfood_core::{FoodId, UserId};
use tracing::instrument;

use super::{Transition, open_transition, recheck};
use crate::api::{ApiError, BackendApi};
use crate::error::{FetchError, MutationError};
use crate::gate::{ConfirmationGate, GateOutcome};
use crate::listing::{FetchOutcome, ListingController, ListingSource, Page};
use crate::mutation::{Mutation, MutationOutcome, Reconcile};
use crate::notify::Notifier;
use crate::session::CurrentUser;

/// The signed-in owner's full menu.
pub struct FoodSource<B> {
    api: Arc<B>,
    owner: UserId,
}

impl<B: BackendApi> ListingSource<Food> for FoodSource<B> {
    const LOCAL_QUERY: bool = true;

    async fn fetch(&self, _query: &QuerySnapshot) -> Result<Page<Food>, ApiError> {
        let foods = self.api.owner_foods(&self.owner).await?;
        Ok(Page::single(foods))
    }

    fn matches(item: &Food, query: &QuerySnapshot) -> bool {
        query.search_term().is_none_or(|term| item.matches(term))
    }
}

pub struct FoodsController<B: BackendApi> {
    api: Arc<B>,
    listing: ListingController<Food, FoodSource<B>>,
    availability: ConfirmationGate<Transition<Food>>,
}

impl<B: BackendApi> FoodsController<B> {
    #[must_use]
    pub fn new(api: Arc<B>, user: &CurrentUser, notifier: Arc<dyn Notifier>) -> Self {
        let source = FoodSource {
            api: api.clone(),
            owner: user.id.clone(),
        };
        Self {
            listing: ListingController::new(source, QueryState::new(), notifier),
            api,
            availability: ConfirmationGate::new(),
        }
    }

    pub const fn listing(&self) -> &ListingController<Food, FoodSource<B>> {
        &self.listing
    }

    pub const fn availability_gate(&self) -> &ConfirmationGate<Transition<Food>> {
        &self.availability
    }

    /// Filter the menu by name or description.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the menu is filtered in memory.
    pub async fn search(&self, term: &str) -> Result<FetchOutcome, FetchError> {
        self.listing.set_search(term).await
    }

    /// Open the availability toggle for `id`.
    ///
    /// # Errors
    ///
    /// `NotLoaded` when the item is not in the menu, `InFlight` while
    /// another toggle is being confirmed.
    #[instrument(skip(self), fields(food_id = %id))]
    pub async fn request_availability(&self, id: &FoodId) -> Result<Transition<Food>, MutationError> {
        open_transition(&self.listing, &self.availability, id, None, |food: &Food| {
            food.name.clone()
        })
        .await
    }

    pub fn cancel_availability(&self) -> bool {
        self.availability.cancel()
    }

    /// Send the pending availability change and patch the cached flag.
    #[instrument(skip(self))]
    pub async fn confirm_availability(&self) -> GateOutcome<Result<MutationOutcome, MutationError>> {
        self.availability
            .confirm(|pending| async move {
                let (_, next) = recheck(&self.listing, &pending).await?;
                let patch = FoodPatch::availability(next.is_available());
                let state = match pending.action {
                    FoodAction::MarkAvailable => "back on the menu",
                    FoodAction::MarkUnavailable => "marked as sold out",
                };
                let mutation = Mutation::new(pending.id.clone(), Reconcile::Patch(patch.clone()))
                    .with_messages(
                        format!("{} {state}", pending.label),
                        format!("Could not {} {}", pending.action, pending.label),
                    );
                self.listing
                    .mutate(mutation, self.api.update_food(&pending.id, &patch))
                    .await
            })
            .await
    }

    /// Validate and save the edit form, patching exactly the sent fields.
    ///
    /// # Errors
    ///
    /// `Invalid` when the form does not validate (nothing is sent),
    /// `NotLoaded` when the item is not in the menu, otherwise see
    /// [`ListingController::mutate`].
    #[instrument(skip(self, form), fields(food_id = %id))]
    pub async fn edit(&self, id: &FoodId, form: &FoodForm) -> Result<MutationOutcome, MutationError> {
        let patch = form.validate()?;
        self.listing
            .entity(id)
            .await
            .map_err(|e| self.listing.refuse(e))?;
        let name = patch.name.clone().unwrap_or_default();
        let mutation = Mutation::new(id.clone(), Reconcile::Patch(patch.clone())).with_messages(
            format!("{name} updated"),
            format!("Could not update {name}"),
        );
        self.listing
            .mutate(mutation, self.api.update_food(id, &patch))
            .await
    }

    pub fn dispose(&self) {
        self.listing.dispose();
    }
}
