use farmhub::{
    build_storefront, get_configuration,
    telemetry::{generate_subscriber, init_subscriber},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let configuration = get_configuration()?;

    let subscriber = generate_subscriber(
        configuration.application.name.clone(),
        configuration.application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let storefront = build_storefront(&configuration).await?;

    match storefront.session().current_user() {
        Some(user) => info!(account = %user.id, role = %user.role.to_string(), "session restored"),
        None => info!("no persisted session, browsing anonymously"),
    }
    let cart = storefront.cart();
    info!(
        items = cart.item_count(),
        total = cart.total(),
        "cart loaded"
    );

    Ok(())
}
