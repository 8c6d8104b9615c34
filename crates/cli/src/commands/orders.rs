//! Checkout and order history commands.

use emporium_storefront::Storefront;
use emporium_storefront::error::StorefrontError;

use super::load_view;

/// `emporium checkout`
#[allow(clippy::print_stdout)]
pub async fn checkout(storefront: &Storefront, verify_stock: bool) -> Result<(), StorefrontError> {
    if verify_stock {
        let unavailable = storefront.checkout().verify_stock().await?;
        if !unavailable.is_empty() {
            let ids: Vec<String> = unavailable.iter().map(ToString::to_string).collect();
            println!("Not enough stock for product(s): {}", ids.join(", "));
            return Ok(());
        }
    }

    let order = storefront.checkout().place_order().await?;
    println!(
        "Order #{} placed ({}), total {}.",
        order.id,
        order.status,
        order.total_amount.display()
    );
    Ok(())
}

/// `emporium orders`
#[allow(clippy::print_stdout)]
pub async fn list(storefront: &Storefront) -> Result<(), StorefrontError> {
    let Some(orders) = load_view(storefront.orders().mine()).await else {
        return Ok(());
    };
    let orders = orders?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }
    for order in &orders {
        let placed = order
            .created_at_utc()
            .map_or_else(|| order.created_at.clone(), |at| at.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "#{:<6} {:<10} {:>10}  {}",
            order.id,
            order.status,
            order.total_amount.display(),
            placed
        );
        for line in &order.items {
            println!(
                "         {} x product {} @ {}",
                line.quantity,
                line.product_id,
                line.unit_price.display()
            );
        }
    }
    Ok(())
}
