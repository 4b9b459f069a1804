use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    api::{ApiClient, HttpApiClient},
    configuration::Settings,
    models::{find_by_title, Product},
    routes::{PaymentCallback, Route},
    storage::{FileStorage, KeyValueStore},
    stores::{CartStore, SessionStore},
    Result,
};

/// Owns the session and the cart for the lifetime of the process.
///
/// The cart follows the session's identity, so both are always built
/// together over the same storage
pub struct Storefront<A, S> {
    session: SessionStore<A, S>,
    cart: CartStore<S>,
}

impl<A: ApiClient, S: KeyValueStore> Storefront<A, S> {
    /// Builds both stores and restores any persisted session
    #[tracing::instrument(skip(api, storage))]
    pub async fn build(api: A, storage: Arc<S>, timeout: Duration) -> Self {
        let session = SessionStore::restore(api, storage.clone(), timeout).await;
        let cart = CartStore::new(storage, session.subscribe());
        Self { session, cart }
    }

    pub fn session(&self) -> &SessionStore<A, S> {
        &self.session
    }

    pub fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    /// Resolves a location to the route that should be rendered for the
    /// current identity
    #[tracing::instrument(skip(self))]
    pub fn navigate(&self, location: &str) -> Route {
        let requested = Route::parse(location);
        let user = self.session.current_user();
        let resolved = requested.clone().resolve(user.as_ref());
        if resolved != requested {
            debug!(requested = %requested, resolved = %resolved, "redirected");
        }
        resolved
    }

    /// Product shown on a detail page, if the title is in the catalog
    pub fn product_for(&self, route: &Route) -> Option<&'static Product> {
        match route {
            Route::ProductDetail { title } => find_by_title(title),
            _ => None,
        }
    }

    /// Handles the payment gateway redirect. A successful payment empties
    /// the cart
    #[tracing::instrument(skip(self))]
    pub fn complete_payment(&self, query: &str) -> Route {
        let route = PaymentCallback::redirect_for(query);
        if route == Route::OrderSuccess {
            self.cart.clear();
            info!("order placed, cart cleared");
        }
        route
    }
}

/// Storefront over the configured HTTP API and on-disk storage
pub async fn build_storefront(settings: &Settings) -> Result<Storefront<HttpApiClient, FileStorage>> {
    let api = HttpApiClient::from_settings(&settings.api)?;
    let storage = Arc::new(FileStorage::open(&settings.storage.path)?);
    Ok(Storefront::build(api, storage, settings.api.timeout()).await)
}
