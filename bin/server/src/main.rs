use gatehouse_access::{MemoryDirectory, MemoryStore, Provider};
use gatehouse_server::auth::{self, GatewayBuilder, OidcHandshake, Paths};
use gatehouse_server::config::Settings;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let store = Arc::new(MemoryStore::new(chrono::Duration::minutes(
        settings.session.ttl_minutes,
    )));
    store
        .start_sweeper(std::time::Duration::from_secs(
            settings.session.sweep_interval_seconds,
        ))
        .await;

    let directory = Arc::new(MemoryDirectory::new());
    let handshake = Arc::new(OidcHandshake::new().expect("failed to build handshake capability"));

    let mut builder = GatewayBuilder::new()
        .secure_cookies(settings.session.secure_cookies)
        .paths(Paths {
            after_login: settings.paths.after_login.clone(),
            after_logout: settings.paths.after_logout.clone(),
            profile: settings.paths.profile.clone(),
        });
    for entry in &settings.providers {
        let provider = Provider::from_slug(&entry.slug)
            .unwrap_or_else(|| panic!("unknown provider '{}' in configuration", entry.slug));
        builder = builder
            .provider(
                provider,
                &entry.client_id,
                &entry.client_secret,
                &settings.base_url,
                entry.source.as_deref(),
                &entry.scopes,
            )
            .expect("invalid provider configuration");
    }

    tracing::info!("Activating providers...");
    let state = builder
        .build(store.clone(), directory, handshake)
        .await
        .expect("provider activation failed");

    let app = auth::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr)
        .await
        .expect("failed to bind to address");
    tracing::info!("listening on http://{}", settings.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(store))
        .await
        .expect("server error");
}

async fn shutdown_signal(store: Arc<MemoryStore>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    store.stop_sweeper().await;
    tracing::info!("shutting down");
}
