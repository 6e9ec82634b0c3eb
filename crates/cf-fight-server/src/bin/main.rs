use std::sync::Arc;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cf_fight_server::config::Config;
use cf_fight_server::error::ServerError;
use cf_fight_server::judge::CodeforcesClient;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.as_str().to_lowercase()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let judge = CodeforcesClient::new(&config.cf_api_base, config.judge_timeout)?;
    info!(
        api = %config.cf_api_base,
        timeout_secs = config.judge_timeout.as_secs(),
        solo_refresh = ?config.solo_refresh,
        "judge client ready"
    );

    let addr = config.bind_address;
    let (app, _state) = cf_fight_server::build_app(config, Arc::new(judge));

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
