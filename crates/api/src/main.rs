//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use messaging::InMemoryMessageBus;
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use relay::OutboxRelay;
use saga::ResponseListener;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: OrderStore + 'static>(
    config: Config,
    store: Arc<S>,
    bus: Arc<InMemoryMessageBus>,
) {
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Background workers: outbox relay out, response listener in.
    let relay_task = OutboxRelay::new(store.clone(), bus.clone(), config.relay.clone()).spawn();
    let listener = ResponseListener::start(store.clone(), bus.as_ref())
        .await
        .expect("failed to subscribe to response topics");

    let state = api::create_state(store);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener_socket = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener_socket, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    relay_task.abort();
    listener.shutdown();
    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The in-process bus stands in for a broker; participants subscribe to
    // request topics and publish responses on the same bus.
    let bus = Arc::new(InMemoryMessageBus::new());

    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to PostgreSQL");
            let store = PostgresOrderStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            serve(config, Arc::new(store), bus).await;
        }
        None => {
            let store = Arc::new(InMemoryOrderStore::new());
            let (restaurant_id, product_id) = api::seed_demo_restaurant(store.as_ref())
                .await
                .expect("failed to seed demo restaurant");
            tracing::info!(
                %restaurant_id,
                %product_id,
                "using in-memory store with a seeded demo restaurant"
            );
            serve(config, store, bus).await;
        }
    }
}
