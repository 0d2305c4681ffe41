//! `mapfood profile show`

use mapfood_dashboard::controllers::ShopProfileController;

use super::{CommandError, Context};

/// Print the signed-in owner's shop profile.
pub async fn show(ctx: &Context) -> Result<(), CommandError> {
    let user = ctx.current_user()?;
    let controller = ShopProfileController::new(ctx.api.clone(), &user, ctx.notifier());
    controller.load().await?;

    if let Some(shop) = controller.shop().await {
        println!("{} ({})", shop.name, shop.status);
        println!("  {}", shop.description);
        println!("  Address: {}", shop.address);
        println!("  Phone:   {}", shop.phone);
        if let Some(rating) = shop.rating {
            println!("  Rating:  {rating:.1}");
        }
        if !shop.img.is_empty() {
            println!("  Image:   {}", shop.img);
        }
    }
    Ok(())
}
