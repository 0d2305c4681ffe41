//! `mapfood foods ...`

use mapfood_core::FoodId;
use mapfood_dashboard::controllers::FoodsController;

use super::{CommandError, Context, finish};

/// List the signed-in owner's menu.
pub async fn list(ctx: &Context, search: Option<&str>) -> Result<(), CommandError> {
    let user = ctx.current_user()?;
    let controller = FoodsController::new(ctx.api.clone(), &user, ctx.notifier());
    controller.listing().load().await?;
    if let Some(term) = search {
        controller.search(term).await?;
    }

    for food in controller.listing().items().await {
        let availability = if food.is_available { "available" } else { "sold out" };
        println!(
            "{:<26} {:<30} {:>14} {:>4}% {}",
            food.id.as_str(),
            food.name,
            food.effective_price().display(),
            food.discount,
            availability
        );
    }
    Ok(())
}

/// Flip the availability of a menu item after confirmation.
pub async fn availability(ctx: &Context, id: &str) -> Result<(), CommandError> {
    let user = ctx.current_user()?;
    let controller = FoodsController::new(ctx.api.clone(), &user, ctx.notifier());
    controller.listing().load().await?;

    let pending = controller.request_availability(&FoodId::new(id)).await?;
    if ctx.confirm(&format!("{pending}?")).await? {
        finish(controller.confirm_availability().await)
    } else {
        controller.cancel_availability();
        Ok(())
    }
}
