mod auth;
mod cart_item;
mod notification;
mod product;
mod token;
mod user;

pub use auth::{AuthResponse, Credentials, Registration};
pub use cart_item::CartItem;
pub use notification::{Notification, NotificationKind};
pub use product::{catalog, find_by_title, Product, ProductId, ProductInput, RawProductId};
pub use token::SessionToken;
pub use user::{AccountId, ProfileUpdate, ProfileUpdatePayload, Role, User};
