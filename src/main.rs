use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyrace::{api, config::Config, state::AppState, words::WordList};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyrace=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting keyrace...");

    let config = Config::from_env();

    let words = WordList::load(&config.words_file)
        .unwrap_or_else(|e| panic!("Failed to load word list from {}: {}", config.words_file, e));

    let state = AppState::new(words);

    let app = Router::new()
        .route("/api/get/update", get(api::update))
        .route("/api/post/createRoom", post(api::create_room))
        .route("/api/post/exit", post(api::exit))
        .route("/api/post/join", post(api::join))
        .route("/api/post/start", post(api::start))
        .route("/api/post/testData", post(api::test_data))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
