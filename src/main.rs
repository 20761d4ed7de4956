use assessment_backend::{
    config::{get_config, init_config},
    create_router,
    database::clients::SupabaseClients,
    services::token_service::TokenService,
    AppState,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    init_config()?;
    let config = get_config();

    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()?;
    let clients = SupabaseClients::from_config(http_client, config);

    let app_state = AppState::new(
        clients.service(),
        clients.identity(),
        TokenService::from_config(config),
    );
    let app = create_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
