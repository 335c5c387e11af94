use advault_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, storage, pipeline, routes)
    let (_state, router) = advault_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    advault_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
