//! `mapfood accounts ...`

use mapfood_core::entity::Account;
use mapfood_core::query::FILTER_ALL;
use mapfood_core::validation::AccountForm;
use mapfood_core::{AccountId, AccountStatus, RoleName};
use mapfood_dashboard::controllers::{AccountsController, role_id};
use mapfood_dashboard::{FetchOutcome, HttpBackend, MutationError};

use super::{CommandError, Context, finish, page_footer};

/// List one page of accounts.
pub async fn list(
    ctx: &Context,
    search: Option<&str>,
    role: Option<RoleName>,
    status: Option<AccountStatus>,
    page: u32,
) -> Result<(), CommandError> {
    let controller = AccountsController::new(ctx.api.clone(), ctx.notifier());
    let listing = controller.listing();
    listing
        .stage(|query| {
            query.set_search(search.unwrap_or_default());
            query.set_filter("role", role.and_then(role_id).unwrap_or(FILTER_ALL));
            query.set_filter("status", status.map_or(FILTER_ALL, |s| s.as_str()));
        })
        .await;
    listing.load().await?;
    if page > 1 && listing.go_to_page(page).await? == FetchOutcome::Skipped {
        tracing::warn!(page, "Page out of range, showing page {}", listing.page().await);
    }

    let accounts = listing.items().await;
    for account in &accounts {
        let role = AccountsController::<HttpBackend>::role_of(account)
            .map_or("-", |r| r.as_str());
        println!(
            "{:<26} {:<32} {:<13} {:<8} {}",
            account.id.as_str(),
            account.email,
            role,
            account.status.as_str(),
            account.display_name()
        );
    }
    page_footer(listing.page().await, listing.total_pages().await, accounts.len());
    Ok(())
}

/// Activate or deactivate an account after confirmation.
pub async fn toggle(ctx: &Context, id: &str) -> Result<(), CommandError> {
    let controller = AccountsController::new(ctx.api.clone(), ctx.notifier());
    let id = AccountId::new(id);
    load_until_found(&controller, &id).await?;

    let pending = controller.request_toggle(&id).await?;
    if ctx.confirm(&format!("{pending}?")).await? {
        finish(controller.confirm_toggle().await)
    } else {
        controller.cancel_toggle();
        Ok(())
    }
}

/// Edit an account; only what differs from the current record is sent.
pub async fn edit(
    ctx: &Context,
    id: &str,
    name: Option<String>,
    status: Option<AccountStatus>,
) -> Result<(), CommandError> {
    let controller = AccountsController::new(ctx.api.clone(), ctx.notifier());
    let id = AccountId::new(id);
    let account = load_until_found(&controller, &id).await?;

    let mut form = AccountForm::from_account(&account);
    if let Some(name) = name {
        form.full_name = name;
    }
    if let Some(status) = status {
        form.status = status;
    }
    controller.edit(&id, &form).await?;
    Ok(())
}

/// Walk the unfiltered listing until the account shows up.
async fn load_until_found(
    controller: &AccountsController<HttpBackend>,
    id: &AccountId,
) -> Result<Account, CommandError> {
    let listing = controller.listing();
    listing.load().await?;
    loop {
        if let Ok(account) = listing.entity(id).await {
            return Ok(account);
        }
        if listing.next_page().await? == FetchOutcome::Skipped {
            return Err(listing
                .refuse(MutationError::NotLoaded {
                    kind: "account",
                    id: id.to_string(),
                })
                .into());
        }
    }
}
