//! Account commands.

use emporium_storefront::Storefront;
use emporium_storefront::error::StorefrontError;
use emporium_storefront::services::auth::Registration;

/// `emporium login`
#[allow(clippy::print_stdout)]
pub async fn login(storefront: &Storefront, email: &str, password: &str) -> Result<(), StorefrontError> {
    let user = storefront.auth().login(email, password).await?;
    println!("Welcome back, {}.", display_name(&user.name, user.email.as_str()));
    Ok(())
}

/// `emporium register`
#[allow(clippy::print_stdout)]
pub async fn register(
    storefront: &Storefront,
    email: String,
    name: String,
    phone: Option<String>,
    password: String,
) -> Result<(), StorefrontError> {
    let user = storefront
        .auth()
        .register(Registration {
            email,
            name,
            phone,
            password: password.into(),
        })
        .await?;
    println!("Account created. Signed in as {}.", user.email);
    Ok(())
}

/// `emporium logout`
#[allow(clippy::print_stdout)]
pub fn logout(storefront: &Storefront) {
    storefront.auth().logout();
    println!("Signed out.");
}

/// `emporium whoami`
#[allow(clippy::print_stdout)]
pub fn whoami(storefront: &Storefront) {
    match storefront.session().user() {
        Some(user) => {
            println!("{} <{}> (#{})", display_name(&user.name, user.email.as_str()), user.email, user.id);
            if let Some(phone) = &user.phone {
                println!("  Phone: {phone}");
            }
        }
        None => println!("Not signed in."),
    }
}

fn display_name<'a>(name: &'a str, email: &'a str) -> &'a str {
    if name.trim().is_empty() { email } else { name }
}
