//! Page-scoped loading.
//!
//! A view mounts a [`ViewScope`] and runs its fetches through
//! [`ViewScope::load`]. Once the view unmounts (explicitly or by dropping
//! the scope) every pending load resolves to `None` right away and the
//! fetch's eventual result is discarded. The request itself is not
//! cancelled on the wire.

use std::future::Future;

use tokio::sync::watch;

/// Lifetime of one mounted view.
#[derive(Debug)]
pub struct ViewScope {
    mounted: watch::Sender<bool>,
}

impl ViewScope {
    /// Mount a new view.
    #[must_use]
    pub fn mount() -> Self {
        let (mounted, _) = watch::channel(true);
        Self { mounted }
    }

    /// Whether the view is still mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        *self.mounted.borrow()
    }

    /// Unmount the view, discarding all pending loads.
    pub fn unmount(&self) {
        self.mounted.send_replace(false);
    }

    /// Run `fut` on behalf of this view.
    ///
    /// Resolves to `Some(output)` if the view is still mounted when `fut`
    /// completes, and to `None` as soon as the view unmounts otherwise. The
    /// returned future does not borrow the scope.
    pub fn load<F>(&self, fut: F) -> impl Future<Output = Option<F::Output>> + use<F>
    where
        F: Future,
    {
        let mut mounted = self.mounted.subscribe();
        async move {
            tokio::select! {
                biased;
                // Err means the scope was dropped, which also unmounts.
                _ = mounted.wait_for(|m| !*m) => None,
                output = fut => Some(output),
            }
        }
    }
}
