use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deeds::{app, config::Config, db, session::SessionStore, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deeds=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::load();

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");
  let sessions = SessionStore::new(config.session);
  let state = AppState::new(pool, sessions, config.password.as_str());

  let bind_addr = config.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config.port);

  axum::serve(listener, app(state))
    .await
    .expect("Server failed to start");
}
