//! Catalog commands: browsing and product management.

use emporium_core::{Price, ProductId};
use emporium_storefront::Storefront;
use emporium_storefront::error::StorefrontError;
use emporium_storefront::models::{Product, ProductCreate, ProductUpdate};

use super::load_view;

/// `emporium products`
#[allow(clippy::print_stdout)]
pub async fn list(storefront: &Storefront, category: Option<&str>) -> Result<(), StorefrontError> {
    let Some(products) = load_view(storefront.catalog().products(category)).await else {
        return Ok(());
    };
    let products = products?;

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }
    for product in &products {
        println!(
            "{:>6}  {:<32}  {:>10}  {}",
            product.id,
            product.name,
            product.price.display(),
            product.category
        );
    }
    Ok(())
}

/// `emporium product <id>`
pub async fn show(storefront: &Storefront, id: &str) -> Result<(), StorefrontError> {
    let Some(product) = load_view(storefront.catalog().product(id)).await else {
        return Ok(());
    };
    print_product(&product?);
    Ok(())
}

/// `emporium admin create`
#[allow(clippy::print_stdout)]
pub async fn create(
    storefront: &Storefront,
    name: String,
    description: String,
    price: Price,
    category: String,
) -> Result<(), StorefrontError> {
    let product = storefront
        .catalog()
        .create_product(ProductCreate {
            name,
            description,
            price,
            category,
        })
        .await?;
    println!("Created product {}", product.id);
    print_product(&product);
    Ok(())
}

/// `emporium admin update`
#[allow(clippy::print_stdout)]
pub async fn update(
    storefront: &Storefront,
    id: ProductId,
    name: Option<String>,
    description: Option<String>,
    price: Option<Price>,
    category: Option<String>,
) -> Result<(), StorefrontError> {
    let product = storefront
        .catalog()
        .update_product(
            id,
            ProductUpdate {
                name,
                description,
                price,
                category,
            },
        )
        .await?;
    println!("Updated product {}", product.id);
    print_product(&product);
    Ok(())
}

/// `emporium admin delete`
#[allow(clippy::print_stdout)]
pub async fn delete(storefront: &Storefront, id: ProductId) -> Result<(), StorefrontError> {
    storefront.catalog().delete_product(id).await?;
    println!("Deleted product {id}");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_product(product: &Product) {
    println!("{} (#{})", product.name, product.id);
    println!("  Price:    {}", product.price.display());
    if !product.category.is_empty() {
        println!("  Category: {}", product.category);
    }
    if !product.description.is_empty() {
        println!("  {}", product.description);
    }
}
