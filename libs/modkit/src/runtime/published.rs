//! Atomically replaceable application handle.

use std::sync::Arc;

use arc_swap::ArcSwap;

use super::composer::{Application, Composer};
use crate::error::CompositionError;

/// The application currently served.
///
/// Readers call [`Self::load`] per request and never block; a single writer swaps in
/// a freshly composed application. Readers holding the previous one keep it alive
/// until they drop it.
pub struct PublishedApp {
    current: ArcSwap<Application>,
}

impl PublishedApp {
    #[must_use]
    pub fn new(app: Application) -> Self {
        Self {
            current: ArcSwap::from_pointee(app),
        }
    }

    #[must_use]
    pub fn load(&self) -> Arc<Application> {
        self.current.load_full()
    }

    /// Publish `app`, returning the one it replaced.
    pub fn replace(&self, app: Application) -> Arc<Application> {
        let previous = self.current.swap(Arc::new(app));
        tracing::info!(modules = ?self.current.load().modules(), "Application republished");
        previous
    }

    /// Compose with `composer` and publish the result.
    ///
    /// # Errors
    /// Returns the composition error; the current application stays published.
    pub fn rebuild(&self, composer: &Composer) -> Result<Arc<Application>, CompositionError> {
        match composer.compose() {
            Ok(app) => Ok(self.replace(app)),
            Err(e) => {
                tracing::warn!(error = %e, "Rebuild failed, keeping current application");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for PublishedApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishedApp")
            .field("modules", &self.current.load().modules())
            .finish()
    }
}
