mod config;
mod db;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use services::session::{CookieSessionManager, SessionConfig, SessionKeys};
use services::users::PgUserStore;
use services::verifier::GoogleTokenVerifier;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");

    let keys = config.session_keys.clone().unwrap_or_else(|| {
        tracing::warn!("SESSION_SIGN_KEY/SESSION_ENCRYPT_KEY not set; sessions will not survive a restart");
        SessionKeys::generate()
    });
    let sessions = CookieSessionManager::new(SessionConfig { keys, secure: config.cookie_secure });

    let state = state::AppState::new(
        config.google_client_id.clone(),
        Arc::new(GoogleTokenVerifier::new(config.tokeninfo_url.clone())),
        Arc::new(PgUserStore::new(pool)),
        Arc::new(sessions),
    );

    let app = routes::app(state, config.frontend_origin.clone());
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, "menu-planner-api listening");
    axum::serve(listener, app).await.expect("server failed");
}
