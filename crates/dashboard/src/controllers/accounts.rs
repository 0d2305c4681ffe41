//! Account management (administrator).

use std::sync::Arc;

use mapfood_core::entity::{Account, AccountPatch};
use mapfood_core::lifecycle::AccountAction;
use mapfood_core::query::{FILTER_ALL, QuerySnapshot, QueryState};
use mapfood_core::validation::AccountForm;
use mapfood_core::{AccountId, AccountStatus, RoleId, RoleName};
use tracing::{info, instrument};

use super::{Transition, open_transition, recheck};
use crate::api::{ApiError, BackendApi, ListParams};
use crate::error::{FetchError, MutationError};
use crate::gate::{ConfirmationGate, GateOutcome};
use crate::listing::{FetchOutcome, ListingController, ListingSource, Page};
use crate::mutation::{Mutation, MutationOutcome, Reconcile};
use crate::notify::{Notifier, Toast};

/// Fixed role set: backend role id and role name.
pub const ROLES: &[(&str, RoleName)] = &[
    ("68e44bdbd727678bb423310c", RoleName::Admin),
    ("68e44bdbd727678bb4233108", RoleName::Customer),
    ("68e44bdbd727678bb4233109", RoleName::SellerStaff),
];

/// Role name of a role id from the fixed set.
#[must_use]
pub fn role_name(id: &RoleId) -> Option<RoleName> {
    ROLES
        .iter()
        .find(|(known, _)| *known == id.as_str())
        .map(|(_, name)| *name)
}

/// Backend role id of a role name.
#[must_use]
pub fn role_id(name: RoleName) -> Option<&'static str> {
    ROLES
        .iter()
        .find(|(_, known)| *known == name)
        .map(|(id, _)| *id)
}

/// Server-paged account listing.
pub struct AccountSource<B> {
    api: Arc<B>,
}

impl<B: BackendApi> ListingSource<Account> for AccountSource<B> {
    async fn fetch(&self, query: &QuerySnapshot) -> Result<Page<Account>, ApiError> {
        let page = self.api.list_accounts(&ListParams::from(query)).await?;
        Ok(Page {
            items: page.accounts,
            total_pages: page.total_pages,
        })
    }
}

/// Controller of the admin accounts page.
pub struct AccountsController<B: BackendApi> {
    api: Arc<B>,
    listing: ListingController<Account, AccountSource<B>>,
    toggle: ConfirmationGate<Transition<Account>>,
}

impl<B: BackendApi> AccountsController<B> {
    #[must_use]
    pub fn new(api: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
        let query = QueryState::new()
            .with_filter("role", FILTER_ALL)
            .with_filter("status", FILTER_ALL);
        Self {
            listing: ListingController::new(AccountSource { api: api.clone() }, query, notifier),
            api,
            toggle: ConfirmationGate::new(),
        }
    }

    pub const fn listing(&self) -> &ListingController<Account, AccountSource<B>> {
        &self.listing
    }

    pub const fn toggle_gate(&self) -> &ConfirmationGate<Transition<Account>> {
        &self.toggle
    }

    /// Show one role only, or every role with `None`.
    ///
    /// # Errors
    ///
    /// See [`ListingController::set_filter`].
    pub async fn filter_by_role(&self, role: Option<RoleName>) -> Result<FetchOutcome, FetchError> {
        let value = role.and_then(role_id).unwrap_or(FILTER_ALL);
        self.listing.set_filter("role", value).await
    }

    /// # Errors
    ///
    /// See [`ListingController::set_filter`].
    pub async fn filter_by_status(
        &self,
        status: Option<AccountStatus>,
    ) -> Result<FetchOutcome, FetchError> {
        let value = status.map_or(FILTER_ALL, |s| s.as_str());
        self.listing.set_filter("status", value).await
    }

    /// Role name of a listed account, resolving bare role ids.
    #[must_use]
    pub fn role_of(account: &Account) -> Option<RoleName> {
        let role = account.role.as_ref()?;
        role.name.or_else(|| role_name(&role.id))
    }

    /// Open the status toggle for `id`.
    ///
    /// # Errors
    ///
    /// `NotLoaded` when the account is not on the current page,
    /// `InFlight` while another toggle is being confirmed.
    #[instrument(skip(self), fields(account_id = %id))]
    pub async fn request_toggle(&self, id: &AccountId) -> Result<Transition<Account>, MutationError> {
        open_transition(&self.listing, &self.toggle, id, None, |account: &Account| {
            account.email.clone()
        })
        .await
    }

    /// Back out of the pending toggle.
    pub fn cancel_toggle(&self) -> bool {
        self.toggle.cancel()
    }

    /// Send the pending toggle and patch the cached status.
    #[instrument(skip(self))]
    pub async fn confirm_toggle(&self) -> GateOutcome<Result<MutationOutcome, MutationError>> {
        self.toggle
            .confirm(|pending| async move {
                let (_, next) = recheck(&self.listing, &pending).await?;
                let patch = AccountPatch::status(next);
                let verb = match pending.action {
                    AccountAction::Activate => "activated",
                    AccountAction::Deactivate => "deactivated",
                };
                let mutation = Mutation::new(pending.id.clone(), Reconcile::Patch(patch.clone()))
                    .with_messages(
                        format!("Account {} {verb}", pending.label),
                        format!("Could not {} account {}", pending.action, pending.label),
                    );
                self.listing
                    .mutate(mutation, self.api.update_account(&pending.id, &patch))
                    .await
            })
            .await
    }

    /// Save the edit form, sending only the fields that changed.
    ///
    /// Returns `Ok(None)` without contacting the backend when nothing
    /// changed.
    ///
    /// # Errors
    ///
    /// `NotLoaded` when the account is not on the current page, otherwise see
    /// [`ListingController::mutate`].
    #[instrument(skip(self, form), fields(account_id = %id))]
    pub async fn edit(
        &self,
        id: &AccountId,
        form: &AccountForm,
    ) -> Result<Option<MutationOutcome>, MutationError> {
        let account = self
            .listing
            .entity(id)
            .await
            .map_err(|e| self.listing.refuse(e))?;
        let patch = form.diff(&account);
        if patch.is_empty() {
            info!("Account edit has no changes");
            self.listing.notify(Toast::info("No changes to save"));
            return Ok(None);
        }

        let mutation = Mutation::new(id.clone(), Reconcile::Patch(patch.clone())).with_messages(
            format!("Account {} updated", account.email),
            format!("Could not update account {}", account.email),
        );
        self.listing
            .mutate(mutation, self.api.update_account(id, &patch))
            .await
            .map(Some)
    }

    /// Drop everything still in flight.
    pub fn dispose(&self) {
        self.listing.dispose();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::controllers::testing::StubBackend;
    use crate::notify::{MemoryNotifier, ToastLevel};

    fn account(id: &str, status: &str) -> Account {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "email": format!("{id}@example.com"),
            "status": status,
            "role_id": {"_id": "68e44bdbd727678bb4233108"},
            "user": {"full_name": "Lan", "phone": "0901234567"}
        }))
        .unwrap()
    }

    async fn setup() -> (Arc<StubBackend>, Arc<MemoryNotifier>, AccountsController<StubBackend>) {
        let api = Arc::new(StubBackend::default());
        api.accounts
            .lock()
            .unwrap()
            .extend([account("a1", "ACTIVE"), account("a2", "PENDING")]);
        let notifier = Arc::new(MemoryNotifier::new());
        let controller = AccountsController::new(api.clone(), notifier.clone());
        controller.listing().load().await.unwrap();
        (api, notifier, controller)
    }

    #[test]
    fn test_role_lookup() {
        assert_eq!(
            role_name(&RoleId::new("68e44bdbd727678bb423310c")),
            Some(RoleName::Admin)
        );
        assert_eq!(role_name(&RoleId::new("unknown")), None);
        assert_eq!(role_id(RoleName::SellerStaff), Some("68e44bdbd727678bb4233109"));
    }

    #[tokio::test]
    async fn test_role_of_resolves_bare_id() {
        let (_api, _notifier, controller) = setup().await;
        let a1 = controller.listing().entity(&AccountId::new("a1")).await.unwrap();
        assert_eq!(AccountsController::<StubBackend>::role_of(&a1), Some(RoleName::Customer));
    }

    #[tokio::test]
    async fn test_toggle_deactivates_active_account() {
        let (api, notifier, controller) = setup().await;
        let pending = controller.request_toggle(&AccountId::new("a1")).await.unwrap();
        assert_eq!(pending.action, AccountAction::Deactivate);

        let outcome = controller.confirm_toggle().await.completed().unwrap().unwrap();
        assert_eq!(outcome, MutationOutcome::Patched);
        assert_eq!(api.calls().last().unwrap(), "update_account a1");

        let a1 = controller.listing().entity(&AccountId::new("a1")).await.unwrap();
        assert_eq!(a1.status, AccountStatus::Pending);
        assert_eq!(
            notifier.drain(),
            vec![Toast::success("Account a1@example.com deactivated")]
        );
    }

    #[tokio::test]
    async fn test_edit_without_changes_sends_nothing() {
        let (api, notifier, controller) = setup().await;
        let a1 = controller.listing().entity(&AccountId::new("a1")).await.unwrap();
        let form = AccountForm::from_account(&a1);

        let outcome = controller.edit(&AccountId::new("a1"), &form).await.unwrap();
        assert!(outcome.is_none());
        assert!(!api.calls().iter().any(|c| c.starts_with("update_account")));
        let toasts = notifier.drain();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Info);
    }

    #[tokio::test]
    async fn test_edit_patches_changed_name_only() {
        let (_api, _notifier, controller) = setup().await;
        let id = AccountId::new("a2");
        let before = controller.listing().entity(&id).await.unwrap();
        let mut form = AccountForm::from_account(&before);
        form.full_name = "Lan Nguyen".to_owned();

        controller.edit(&id, &form).await.unwrap();
        let after = controller.listing().entity(&id).await.unwrap();
        assert_eq!(after.full_name(), Some("Lan Nguyen"));
        assert_eq!(after.status, before.status);
        assert_eq!(after.phone(), before.phone());
    }

    #[tokio::test]
    async fn test_rejected_toggle_keeps_status() {
        let (api, notifier, controller) = setup().await;
        *api.reject_updates.lock().unwrap() = true;
        controller.request_toggle(&AccountId::new("a1")).await.unwrap();

        let result = controller.confirm_toggle().await.completed().unwrap();
        assert!(matches!(result, Err(MutationError::Api { .. })));
        let a1 = controller.listing().entity(&AccountId::new("a1")).await.unwrap();
        assert_eq!(a1.status, AccountStatus::Active);
        assert_eq!(notifier.drain()[0].level, ToastLevel::Error);
        assert!(controller.toggle_gate().is_open());
    }
}
