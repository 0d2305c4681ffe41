//! `mapfood revenue`

use mapfood_dashboard::DashboardError;
use mapfood_dashboard::api::RevenuePeriod;
use mapfood_dashboard::controllers::RevenueController;

use super::{CommandError, Context};

/// Print the revenue report of one month, the current one by default.
pub async fn show(ctx: &Context, month: Option<u32>, year: Option<i32>) -> Result<(), CommandError> {
    let current = RevenuePeriod::current();
    let period = RevenuePeriod::new(
        month.unwrap_or_else(|| current.month()),
        year.unwrap_or_else(|| current.year()),
    )
    .map_err(DashboardError::from)?;

    let user = ctx.current_user()?;
    let controller = RevenueController::new(ctx.api.clone(), &user, period, ctx.notifier());
    controller.load().await?;

    let Some(report) = controller.report().await else {
        return Ok(());
    };
    let shop = report.shop.as_ref().map_or("your shop", |s| s.name.as_str());
    println!("Revenue of {shop} for {period}");
    println!("  Total revenue:    {}", report.summary.total_revenue);
    println!("  Orders:           {}", report.summary.total_orders);
    println!("  Foods sold:       {}", report.summary.total_foods_sold);
    println!("  Unique customers: {}", report.summary.unique_customers);
    if let Some(best) = report.best_seller() {
        println!("  Best seller:      {} ({} sold)", best.food_name, best.total_sold);
    }
    if !report.food_sales.is_empty() {
        println!();
        for sale in &report.food_sales {
            println!(
                "  {:<30} {:>6} {:>16}",
                sale.food_name,
                sale.total_sold,
                sale.total_revenue.display()
            );
        }
    }
    Ok(())
}
