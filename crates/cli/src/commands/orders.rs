//! `mapfood orders ...`

use mapfood_core::lifecycle::OrderAction;
use mapfood_core::{Lifecycle, OrderId};
use mapfood_dashboard::controllers::{OrderTab, OrdersController};

use super::{CommandError, Context, finish};

/// List the signed-in customer's orders under one tab.
pub async fn list(ctx: &Context, tab: OrderTab) -> Result<(), CommandError> {
    let user = ctx.current_user()?;
    let controller = OrdersController::new(ctx.api.clone(), &user, ctx.notifier());
    controller.listing().load().await?;
    controller.select_tab(tab).await?;

    for order in controller.listing().items().await {
        let payment = order.payment_status.map_or("-", |p| p.label());
        let shop = order.shop.as_ref().map_or("-", |s| s.name.as_str());
        let cancellable = if order.can(OrderAction::Cancel) {
            " (cancellable)"
        } else {
            ""
        };
        println!(
            "{:<26} {:<14} {:<24} {:<18} {:<8} {:>14}{cancellable}",
            order.id.as_str(),
            order.order_code,
            shop,
            order.status.label(),
            payment,
            order.total_amount.display(),
        );
    }
    Ok(())
}

/// Cancel an order awaiting payment after confirmation.
pub async fn cancel(ctx: &Context, id: &str, reason: Option<&str>) -> Result<(), CommandError> {
    let user = ctx.current_user()?;
    let controller = OrdersController::new(ctx.api.clone(), &user, ctx.notifier());
    controller.listing().load().await?;

    let pending = controller.request_cancel(&OrderId::new(id)).await?;
    if ctx.confirm(&format!("{pending}?")).await? {
        finish(controller.confirm_cancel(reason).await)
    } else {
        controller.dismiss_cancel();
        Ok(())
    }
}
