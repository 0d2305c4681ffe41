//! The store director's own shop profile.

use std::sync::Arc;

use mapfood_core::UserId;
use mapfood_core::entity::Shop;
use mapfood_core::query::{QuerySnapshot, QueryState};
use mapfood_core::validation::ShopForm;
use tracing::instrument;

use crate::api::{ApiError, BackendApi};
use crate::error::{FetchError, MutationError};
use crate::listing::{FetchOutcome, ListingController, ListingSource, Page};
use crate::mutation::{Mutation, MutationOutcome, Reconcile};
use crate::notify::Notifier;
use crate::session::CurrentUser;

/// The one shop owned by the signed-in user.
pub struct ProfileSource<B> {
    api: Arc<B>,
    owner: UserId,
}

impl<B: BackendApi> ListingSource<Shop> for ProfileSource<B> {
    const LOCAL_QUERY: bool = true;

    async fn fetch(&self, _query: &QuerySnapshot) -> Result<Page<Shop>, ApiError> {
        let shop = self.api.owner_shop(&self.owner).await?;
        Ok(Page::single(vec![shop]))
    }
}

pub struct ShopProfileController<B: BackendApi> {
    api: Arc<B>,
    owner: UserId,
    listing: ListingController<Shop, ProfileSource<B>>,
}

impl<B: BackendApi> ShopProfileController<B> {
    #[must_use]
    pub fn new(api: Arc<B>, user: &CurrentUser, notifier: Arc<dyn Notifier>) -> Self {
        let source = ProfileSource {
            api: api.clone(),
            owner: user.id.clone(),
        };
        Self {
            listing: ListingController::new(source, QueryState::new(), notifier),
            owner: user.id.clone(),
            api,
        }
    }

    /// # Errors
    ///
    /// See [`ListingController::load`].
    pub async fn load(&self) -> Result<FetchOutcome, FetchError> {
        self.listing.load().await
    }

    /// The loaded profile.
    pub async fn shop(&self) -> Option<Shop> {
        self.listing.items().await.into_iter().next()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.listing.is_loading()
    }

    /// Prefilled edit form, once the profile is loaded.
    pub async fn form(&self) -> Option<ShopForm> {
        self.shop().await.map(|shop| ShopForm::from_shop(&shop, false))
    }

    /// Validate and save the form, merging the sent fields into the held
    /// profile on success.
    ///
    /// # Errors
    ///
    /// `Invalid` when the form does not validate (nothing is sent),
    /// `NotLoaded` before the profile has loaded, otherwise see
    /// [`ListingController::mutate`].
    #[instrument(skip(self, form), fields(owner_id = %self.owner))]
    pub async fn edit(&self, form: &ShopForm) -> Result<MutationOutcome, MutationError> {
        let patch = form.validate()?;
        let Some(shop) = self.shop().await else {
            return Err(self.listing.refuse(MutationError::NotLoaded {
                kind: "shop profile",
                id: self.owner.to_string(),
            }));
        };

        let mutation = Mutation::new(shop.id, Reconcile::Patch(patch.clone()))
            .with_messages("Shop profile updated", "Could not update shop profile");
        self.listing
            .mutate(mutation, self.api.update_owner_shop(&self.owner, &patch))
            .await
    }

    pub fn dispose(&self) {
        self.listing.dispose();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mapfood_core::ShopStatus;

    use super::*;
    use crate::controllers::testing::StubBackend;
    use crate::notify::{MemoryNotifier, Toast};

    fn shop() -> Shop {
        serde_json::from_value(serde_json::json!({
            "_id": "s1",
            "name": "Pho Hoa",
            "description": "Since 1968",
            "address": {
                "street": "260C Pasteur", "ward": "8", "district": "3",
                "city": "HCM", "province": "South"
            },
            "phone": "0283829794",
            "img": "https://img.example.com/pho.png",
            "rating": 4.5,
            "status": "ACTIVE"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_edit_merges_sent_fields() {
        let api = Arc::new(StubBackend::default());
        api.shops.lock().unwrap().push(shop());
        let notifier = Arc::new(MemoryNotifier::new());
        let user = CurrentUser::new("owner-1", None);
        let controller = ShopProfileController::new(api.clone(), &user, notifier.clone());

        assert!(controller.edit(&ShopForm::default()).await.is_err());
        controller.load().await.unwrap();

        let mut form = controller.form().await.unwrap();
        form.name = "Pho Hoa Pasteur".to_owned();
        controller.edit(&form).await.unwrap();

        let held = controller.shop().await.unwrap();
        assert_eq!(held.name, "Pho Hoa Pasteur");
        assert_eq!(held.rating, Some(4.5));
        assert_eq!(held.status, ShopStatus::Active);
        assert_eq!(api.calls().last().unwrap(), "update_owner_shop owner-1");
        assert_eq!(notifier.drain(), vec![Toast::success("Shop profile updated")]);
    }

    #[tokio::test]
    async fn test_not_loaded_is_refused() {
        let api = Arc::new(StubBackend::default());
        let controller =
            ShopProfileController::new(api, &CurrentUser::new("owner-1", None), Arc::new(MemoryNotifier::new()));
        let mut form = ShopForm::from_shop(&shop(), false);
        form.name = "Renamed".to_owned();

        let err = controller.edit(&form).await.unwrap_err();
        assert!(matches!(err, MutationError::NotLoaded { .. }));
    }
}
