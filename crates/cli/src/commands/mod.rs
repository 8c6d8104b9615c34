//! Subcommand implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::future::Future;

use emporium_storefront::scope::ViewScope;

/// Load a page the way a mounted view does: Ctrl-C unmounts the view and
/// whatever the fetch returns afterwards is dropped.
async fn load_view<F: Future>(fut: F) -> Option<F::Output> {
    let scope = ViewScope::mount();
    let load = scope.load(fut);
    tokio::pin!(load);

    tokio::select! {
        output = &mut load => output,
        _ = tokio::signal::ctrl_c() => {
            scope.unmount();
            tracing::info!("Interrupted, discarding page load");
            load.await
        }
    }
}
