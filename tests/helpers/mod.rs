#![allow(dead_code)]
mod api;
mod app;
mod http;
mod math;

pub use api::{CallCounts, FakeApi};
pub use app::{spawn_file_storefront, spawn_storefront, TestStorefront};
pub use http::{RecordedRequest, StubServer};
pub use math::assert_on_decimal;

use lazy_static::lazy_static;
use uuid::Uuid;

use farmhub::telemetry::{generate_subscriber, init_subscriber};

pub const PASSWORD: &str = "correct-horse";

lazy_static! {
    /// To ensure logs are only outputted in tests when required, by default
    /// tests run with no logs being captured
    ///
    /// In order to set logs to be captured during tests run them with:
    /// `TEST_LOG=true cargo test | bunyan`
    pub static ref TRACING: () = {
        let name = String::from("test");
        if std::env::var("TEST_LOG").is_ok() {
            let subscriber = generate_subscriber(name, "debug".into(), std::io::stdout);
            let _ = init_subscriber(subscriber);
        } else {
            let subscriber = generate_subscriber(name, "off".into(), std::io::sink);
            let _ = init_subscriber(subscriber);
        }
    };
}

/// Email no other test will use
pub fn unique_email() -> String {
    format!("{}@farm.test", Uuid::new_v4())
}
