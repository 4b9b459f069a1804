use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// Subscriber for the storefront
///
/// It's filtered based off the standard environment filter, falling back to
/// `env_filter` when `RUST_LOG` isn't set
///
/// This version includes
/// - JsonStorageLayer
/// - BunyanFormattingLayer writing to `sink`
pub fn generate_subscriber<W>(name: String, env_filter: String, sink: W) -> impl Subscriber + Send + Sync
where
    W: MakeWriter + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Initialises the subscriber globally and also sets it to include log statements
///
/// Returns an error instead of panicking so callers that may race to
/// install a subscriber (ie. tests) can decide what to do about it
pub fn init_subscriber(
    subscriber: impl Subscriber + Send + Sync,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
