mod cart;
mod session;

pub use cart::CartStore;
pub use session::SessionStore;
