use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use clap::Parser;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tawzi::auth::{session, Role};
use tawzi::config::{Cli, Config};
use tawzi::error::AppResult;
use tawzi::state::AppState;
use tawzi::users::{self, NewUser, UserFilter, UserRepository};
use tawzi::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    std::fs::create_dir_all(config.uploads_path())?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    let purged = session::purge_expired(&pool)?;
    if purged > 0 {
        tracing::info!("Purged {} expired sessions", purged);
    }

    let state = AppState::new(pool, config.clone());
    users::ensure_bootstrap_owner(
        &state.users(),
        &config.auth.bootstrap_username,
        &config.auth.bootstrap_password,
    )
    .await?;

    let mut app = routes::router(&config);

    // Test-only seed endpoint: creates a user + session, returns session cookie
    if std::env::var("TAWZI_TEST_SEED").is_ok() {
        tracing::warn!("TAWZI_TEST_SEED is set; /test/seed is mounted");
        app = app.route("/test/seed", get(test_seed));
    }

    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Test-only: seed an owner + session and return the session cookie.
/// Only mounted when TAWZI_TEST_SEED env var is set.
async fn test_seed(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let repo = state.users();
    let existing = repo
        .list(&UserFilter {
            search: Some("testowner".into()),
            role: Some(Role::Owner),
        })
        .await?
        .into_iter()
        .find(|u| u.username == "testowner");

    let user = match existing {
        Some(user) => user,
        None => {
            repo.create(&NewUser {
                username: "testowner".into(),
                password: "testowner".into(),
                role: Role::Owner,
                is_active: true,
            })
            .await?
        }
    };

    let hours = state.config.auth.session_hours;
    let token = session::create_session(&state.db, &user.id, hours)?;

    Ok((
        [(
            header::SET_COOKIE,
            session::session_cookie(&state.config.auth.cookie_name, &token, hours),
        )],
        Json(serde_json::json!({ "user_id": user.id, "username": user.username })),
    ))
}
