//! `mapfood shops ...`

use mapfood_core::query::FILTER_ALL;
use mapfood_core::{ShopId, ShopStatus};
use mapfood_dashboard::controllers::ShopsController;
use mapfood_dashboard::{FetchOutcome, MutationError};

use super::{CommandError, Context, finish, page_footer};

/// List one page of shops.
pub async fn list(
    ctx: &Context,
    search: Option<&str>,
    status: Option<ShopStatus>,
    page: u32,
) -> Result<(), CommandError> {
    let controller = ShopsController::new(ctx.api.clone(), ctx.notifier());
    let listing = controller.listing();
    listing
        .stage(|query| {
            query.set_search(search.unwrap_or_default());
            query.set_filter("status", status.map_or(FILTER_ALL, |s| s.as_str()));
        })
        .await;
    listing.load().await?;
    if page > 1 {
        listing.go_to_page(page).await?;
    }

    let shops = listing.items().await;
    for shop in &shops {
        println!(
            "{:<26} {:<30} {:<8} {:<12} {}",
            shop.id.as_str(),
            shop.name,
            shop.status.as_str(),
            shop.phone,
            shop.address
        );
    }
    page_footer(listing.page().await, listing.total_pages().await, shops.len());
    Ok(())
}

/// Activate or deactivate a shop after confirmation.
pub async fn toggle(ctx: &Context, id: &str) -> Result<(), CommandError> {
    let controller = ShopsController::new(ctx.api.clone(), ctx.notifier());
    let id = ShopId::new(id);
    let listing = controller.listing();

    listing.load().await?;
    while listing.entity(&id).await.is_err() {
        if listing.next_page().await? == FetchOutcome::Skipped {
            return Err(listing
                .refuse(MutationError::NotLoaded {
                    kind: "shop",
                    id: id.to_string(),
                })
                .into());
        }
    }

    let pending = controller.request_toggle(&id).await?;
    if ctx.confirm(&format!("{pending}?")).await? {
        finish(controller.confirm_toggle().await)
    } else {
        controller.cancel_toggle();
        Ok(())
    }
}
