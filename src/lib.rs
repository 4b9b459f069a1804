pub mod api;
pub mod configuration;
mod error;
pub mod models;
pub mod routes;
mod startup;
pub mod storage;
pub mod stores;
pub mod telemetry;

#[cfg(test)]
mod test_helpers;

pub use configuration::get_configuration;
pub use error::FarmhubError;
pub use startup::{build_storefront, Storefront};

pub type Result<T> = std::result::Result<T, FarmhubError>;
