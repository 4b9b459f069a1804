use std::convert::TryFrom;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::{
    models::{CartItem, Notification, Product, ProductInput, User},
    storage::{cart_key, KeyValueStore},
    Result,
};

const LOGIN_REQUIRED: &str = "Please log in to manage your cart";

#[derive(Debug, Default)]
struct CartState {
    /// Email of the identity the items belong to
    owner: Option<String>,
    items: Vec<CartItem>,
}

/// The active identity's cart, written through to storage on every change.
///
/// The store follows the session by watching its identity channel: before
/// any read or mutation it checks whether the identity changed, and if so
/// swaps in the persisted cart of the new identity (or an empty cart when
/// nobody is logged in). Logging out never touches persisted carts.
///
/// Mutations don't fail, they return a [`Notification`] describing what
/// happened. Rejected mutations leave the cart untouched
pub struct CartStore<S> {
    storage: Arc<S>,
    identity: watch::Receiver<Option<User>>,
    state: Mutex<CartState>,
}

impl<S: KeyValueStore> CartStore<S> {
    pub fn new(storage: Arc<S>, identity: watch::Receiver<Option<User>>) -> Self {
        let store = Self {
            storage,
            identity,
            state: Mutex::new(CartState::default()),
        };
        {
            let mut state = store.lock();
            store.sync(&mut state);
        }
        store
    }

    #[tracing::instrument(skip(self, product), fields(store = "cart", product = %product.name))]
    pub fn add_to_cart(&self, product: &Product) -> Notification {
        self.mutate(|items| {
            match items.iter_mut().find(|item| item.is_for(&product.name)) {
                Some(item) => {
                    item.quantity = item.quantity.saturating_add(1);
                    Notification::success(format!("Updated {} quantity in cart", product.name))
                }
                None => {
                    items.push(CartItem::from(product));
                    Notification::success(format!("{} added to cart", product.name))
                }
            }
        })
    }

    /// Normalizes a loosely-shaped product before adding it.
    ///
    /// Input without a usable identifier, name or price is rejected with
    /// `MalformedProduct` and the cart isn't touched
    pub fn try_add_to_cart(&self, input: ProductInput) -> Result<Notification> {
        let product = Product::try_from(input).map_err(|e| {
            warn!(err = ?e, "rejected malformed product");
            e
        })?;
        Ok(self.add_to_cart(&product))
    }

    #[tracing::instrument(skip(self), fields(store = "cart"))]
    pub fn update_cart_item(&self, product_name: &str, quantity: i64) -> Notification {
        if quantity < 1 {
            debug!(quantity, "rejected quantity below one");
            return Notification::warning("Quantity must be at least 1");
        }
        let quantity = match u32::try_from(quantity) {
            Ok(quantity) => quantity,
            Err(_) => return Notification::warning("That quantity is too large"),
        };

        self.mutate(|items| {
            match items.iter_mut().find(|item| item.is_for(product_name)) {
                Some(item) => {
                    item.quantity = quantity;
                    Notification::success("Cart updated")
                }
                None => Notification::warning(format!("{} is not in your cart", product_name)),
            }
        })
    }

    #[tracing::instrument(skip(self), fields(store = "cart"))]
    pub fn remove_from_cart(&self, product_name: &str) -> Notification {
        self.mutate(|items| {
            items.retain(|item| !item.is_for(product_name));
            Notification::info(format!("{} removed from cart", product_name))
        })
    }

    /// Empties the cart, ie. once an order has gone through
    #[tracing::instrument(skip(self), fields(store = "cart"))]
    pub fn clear(&self) -> Notification {
        self.mutate(|items| {
            items.clear();
            Notification::info("Cart cleared")
        })
    }

    /// Re-reads the active identity's cart from storage, picking up writes
    /// made by other stores sharing the same storage handle
    #[tracing::instrument(skip(self), fields(store = "cart"))]
    pub fn reload(&self) {
        let mut state = self.lock();
        self.sync(&mut state);
        state.items = match &state.owner {
            Some(owner) => self.load(owner),
            None => Vec::new(),
        };
    }

    pub fn items(&self) -> Vec<CartItem> {
        let mut state = self.lock();
        self.sync(&mut state);
        state.items.clone()
    }

    /// Total number of units, what the cart badge shows
    pub fn item_count(&self) -> u64 {
        self.items().iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn total(&self) -> f64 {
        self.items().iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Email of the identity whose cart is loaded
    pub fn owner(&self) -> Option<String> {
        let mut state = self.lock();
        self.sync(&mut state);
        state.owner.clone()
    }
}

/// Private API
impl<S: KeyValueStore> CartStore<S> {
    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swaps the in-memory cart when the identity changed since the last call
    fn sync(&self, state: &mut CartState) {
        let email = self.identity.borrow().as_ref().map(|u| u.email.clone());
        if email == state.owner {
            return;
        }
        debug!(from = ?state.owner, to = ?email, "identity changed, switching cart");
        state.items = match &email {
            Some(email) => self.load(email),
            None => Vec::new(),
        };
        state.owner = email;
    }

    fn load(&self, owner: &str) -> Vec<CartItem> {
        let raw = match self.storage.get(&cart_key(owner)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(err = ?e, "failed to read persisted cart, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<CartItem>>(&raw) {
            Ok(items) => normalize(items),
            Err(e) => {
                warn!(err = ?e, "persisted cart is malformed, starting empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, owner: &str, items: &[CartItem]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.storage.set(&cart_key(owner), &raw)
    }

    /// Runs `change` against the active cart and persists the result.
    ///
    /// Anonymous carts can't be changed. If persisting fails the change is
    /// rolled back so memory never gets ahead of storage
    fn mutate<F>(&self, change: F) -> Notification
    where
        F: FnOnce(&mut Vec<CartItem>) -> Notification,
    {
        let mut state = self.lock();
        self.sync(&mut state);
        let owner = match state.owner.clone() {
            Some(owner) => owner,
            None => {
                debug!("rejected cart change while anonymous");
                return Notification::warning(LOGIN_REQUIRED);
            }
        };

        let previous = state.items.clone();
        let notification = change(&mut state.items);
        if notification.is_rejection() || state.items == previous {
            return notification;
        }

        if let Err(e) = self.persist(&owner, &state.items) {
            error!(err = ?e, "failed to persist cart, rolling back");
            state.items = previous;
            return Notification::error(format!("Your cart could not be saved: {}", e));
        }
        notification
    }
}

/// Persisted carts may have been edited by hand or written by an older
/// client, so duplicates are merged and empty lines dropped
fn normalize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut normalized: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items.into_iter().filter(|i| i.quantity > 0) {
        match normalized.iter_mut().find(|i| i.is_for(&item.product_name)) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity)
            }
            None => normalized.push(item),
        }
    }
    normalized
}
