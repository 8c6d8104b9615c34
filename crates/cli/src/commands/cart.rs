//! Cart commands. The cart lives in the local state file.

use emporium_core::ProductId;
use emporium_storefront::Storefront;
use emporium_storefront::error::StorefrontError;

use super::load_view;

/// `emporium cart show`
#[allow(clippy::print_stdout)]
pub fn show(storefront: &Storefront) {
    let cart = storefront.cart();
    let items = cart.items();
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for item in &items {
        println!(
            "{:>6}  {:<32} {:>4} x {:>9} = {:>10}",
            item.product_id,
            item.name,
            item.quantity,
            item.unit_price.display(),
            item.line_total().display()
        );
    }
    println!("{} item(s), total {}", cart.item_count(), cart.total().display());
}

/// `emporium cart add`
///
/// Snapshots the product's current name and price into the cart.
#[allow(clippy::print_stdout)]
pub async fn add(
    storefront: &Storefront,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), StorefrontError> {
    if !storefront.session().is_authenticated() {
        println!("Please log in to add items to your cart.");
        return Ok(());
    }

    let Some(product) = load_view(storefront.gateway().get_product(product_id)).await else {
        return Ok(());
    };
    let product = product?;

    storefront
        .cart()
        .add_item(product.id, product.name.clone(), product.price, quantity);
    println!("Added {quantity} x {} to your cart.", product.name);
    Ok(())
}

/// `emporium cart update`
pub fn update(storefront: &Storefront, product_id: ProductId, quantity: i64) {
    storefront.cart().update_quantity(product_id, quantity);
    show(storefront);
}

/// `emporium cart remove`
pub fn remove(storefront: &Storefront, product_id: ProductId) {
    storefront.cart().remove_item(product_id);
    show(storefront);
}

/// `emporium cart clear`
#[allow(clippy::print_stdout)]
pub fn clear(storefront: &Storefront) {
    storefront.cart().clear();
    println!("Cart cleared.");
}
