//! Shop moderation (administrator).
//!
//! Status changes can move a shop out of the active status filter, so every
//! successful mutation here is reconciled by refetching the current query.

use std::sync::Arc;

use mapfood_core::entity::{Shop, ShopPatch};
use mapfood_core::query::{FILTER_ALL, QuerySnapshot, QueryState};
use mapfood_core::validation::ShopForm;
use mapfood_core::{ShopId, ShopStatus};
use tracing::instrument;

use super::{Transition, open_transition, recheck};
use crate::api::{ApiError, BackendApi, ListParams};
use crate::error::{FetchError, MutationError};
use crate::gate::{ConfirmationGate, GateOutcome};
use crate::listing::{FetchOutcome, ListingController, ListingSource, Page};
use crate::mutation::{Mutation, MutationOutcome, Reconcile};
use crate::notify::Notifier;

/// Server-paged shop listing.
pub struct ShopSource<B> {
    api: Arc<B>,
}

impl<B: BackendApi> ListingSource<Shop> for ShopSource<B> {
    async fn fetch(&self, query: &QuerySnapshot) -> Result<Page<Shop>, ApiError> {
        let page = self.api.list_shops(&ListParams::from(query)).await?;
        Ok(Page {
            items: page.shops,
            total_pages: page.total_pages,
        })
    }
}

pub struct ShopsController<B: BackendApi> {
    api: Arc<B>,
    listing: ListingController<Shop, ShopSource<B>>,
    toggle: ConfirmationGate<Transition<Shop>>,
}

impl<B: BackendApi> ShopsController<B> {
    #[must_use]
    pub fn new(api: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            listing: ListingController::new(
                ShopSource { api: api.clone() },
                QueryState::new().with_filter("status", FILTER_ALL),
                notifier,
            ),
            api,
            toggle: ConfirmationGate::new(),
        }
    }

    pub const fn listing(&self) -> &ListingController<Shop, ShopSource<B>> {
        &self.listing
    }

    pub const fn toggle_gate(&self) -> &ConfirmationGate<Transition<Shop>> {
        &self.toggle
    }

    /// # Errors
    ///
    /// See [`ListingController::set_filter`].
    pub async fn filter_by_status(&self, status: Option<ShopStatus>) -> Result<FetchOutcome, FetchError> {
        let value = status.map_or(FILTER_ALL, |s| s.as_str());
        self.listing.set_filter("status", value).await
    }

    /// Open the status toggle for `id`.
    ///
    /// # Errors
    ///
    /// `NotLoaded` when the shop is not on the current page, `InFlight`
    /// while another toggle is being confirmed.
    #[instrument(skip(self), fields(shop_id = %id))]
    pub async fn request_toggle(&self, id: &ShopId) -> Result<Transition<Shop>, MutationError> {
        open_transition(&self.listing, &self.toggle, id, None, |shop: &Shop| shop.name.clone()).await
    }

    pub fn cancel_toggle(&self) -> bool {
        self.toggle.cancel()
    }

    /// Send the pending toggle, then refetch.
    #[instrument(skip(self))]
    pub async fn confirm_toggle(&self) -> GateOutcome<Result<MutationOutcome, MutationError>> {
        self.toggle
            .confirm(|pending| async move {
                let (_, next) = recheck(&self.listing, &pending).await?;
                let patch = ShopPatch::status(next);
                let mutation = Mutation::new(pending.id.clone(), Reconcile::Refetch).with_messages(
                    format!("Shop {} is now {next}", pending.label),
                    format!("Could not {} shop {}", pending.action, pending.label),
                );
                self.listing
                    .mutate(mutation, self.api.update_shop(&pending.id, &patch))
                    .await
            })
            .await
    }

    /// Validate and save the admin edit form, then refetch.
    ///
    /// # Errors
    ///
    /// `Invalid` with every failing field when the form does not validate
    /// (nothing is sent), `NotLoaded` when the shop is not on the current
    /// page, otherwise see [`ListingController::mutate`].
    #[instrument(skip(self, form), fields(shop_id = %id))]
    pub async fn edit(&self, id: &ShopId, form: &ShopForm) -> Result<MutationOutcome, MutationError> {
        let patch = form.validate()?;
        let shop = self.listing.entity(id).await.map_err(|e| self.listing.refuse(e))?;
        let mutation = Mutation::new(id.clone(), Reconcile::Refetch).with_messages(
            format!("Shop {} updated", shop.name),
            format!("Could not update shop {}", shop.name),
        );
        self.listing
            .mutate(mutation, self.api.update_shop(id, &patch))
            .await
    }

    pub fn dispose(&self) {
        self.listing.dispose();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::controllers::testing::StubBackend;
    use crate::notify::MemoryNotifier;

    fn shop(id: &str, status: &str) -> Shop {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "name": format!("Shop {id}"),
            "description": "Noodles",
            "address": {"street": "1 Le Loi", "ward": "Ben Nghe", "district": "1", "city": "HCM"},
            "phone": "0901234567",
            "img": "https://img.example.com/s.png",
            "status": status
        }))
        .unwrap()
    }

    async fn setup() -> (Arc<StubBackend>, ShopsController<StubBackend>) {
        let api = Arc::new(StubBackend::default());
        api.shops.lock().unwrap().push(shop("s1", "ACTIVE"));
        let controller = ShopsController::new(api.clone(), Arc::new(MemoryNotifier::new()));
        controller.listing().load().await.unwrap();
        (api, controller)
    }

    #[tokio::test]
    async fn test_toggle_refetches() {
        let (api, controller) = setup().await;
        let pending = controller.request_toggle(&ShopId::new("s1")).await.unwrap();
        assert_eq!(pending.label, "Shop s1");

        // The stub backend keeps serving the old record; the refetch is what
        // matters here.
        let outcome = controller.confirm_toggle().await.completed().unwrap().unwrap();
        assert_eq!(outcome, MutationOutcome::RefetchRequired);
        assert_eq!(
            api.calls(),
            vec!["list_shops 1", "update_shop s1", "list_shops 1"]
        );
    }

    #[tokio::test]
    async fn test_invalid_edit_sends_nothing() {
        let (api, controller) = setup().await;
        let mut form = ShopForm::from_shop(&shop("s1", "ACTIVE"), true);
        form.phone = "0901".to_owned();
        form.address.ward = String::new();

        let err = controller.edit(&ShopId::new("s1"), &form).await.unwrap_err();
        let MutationError::Invalid(errors) = err else {
            panic!("expected validation errors, got {err:?}");
        };
        assert!(errors.for_field("phone").is_some());
        assert!(errors.for_field("address.ward").is_some());
        assert_eq!(api.calls(), vec!["list_shops 1"]);
    }

    #[tokio::test]
    async fn test_cancel_toggle_sends_nothing() {
        let (api, controller) = setup().await;
        controller.request_toggle(&ShopId::new("s1")).await.unwrap();
        assert!(controller.cancel_toggle());
        assert!(controller.confirm_toggle().await.is_ignored());
        assert_eq!(api.calls(), vec!["list_shops 1"]);
    }
}
