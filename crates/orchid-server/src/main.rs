mod api;
mod middleware;
mod payments;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use orchid_shipping::{FallbackPolicy, ProviderClient, ShippingConfig, Tracker};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    payments::PaymentLookup,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = orchid_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = orchid_db::PoolConfig::from_app_config(&config);
    let pool = orchid_db::connect_pool(&config.database_url, pool_config).await?;
    orchid_db::run_migrations(&pool).await?;

    let provider_client = ProviderClient::new(
        config.provider_request_timeout_secs,
        &config.provider_user_agent,
    )?;
    let tracker = Tracker::new(
        provider_client,
        ShippingConfig::from_env(),
        FallbackPolicy::from_flag(config.fallback_on_provider_error),
    );
    let payments = PaymentLookup::new(
        config.payment_intent_url.clone(),
        config.payment_api_key.clone(),
        config.provider_request_timeout_secs,
        &config.provider_user_agent,
    )?;

    let auth = AuthState::from_env(matches!(
        config.env,
        orchid_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            tracker: Arc::new(tracker),
            payments: Arc::new(payments),
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
