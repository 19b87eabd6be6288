use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};
use log::{debug, info};
use simplelog::SimpleLogger;
use sqlx::mysql::MySqlPool;

mod auth;
mod config;
mod controllers;
mod db;
mod errors;
mod models;

use crate::auth::TokenCodec;
use crate::config::Config;

// Shared immutable state
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenCodec,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // set up logging facility
    let _ = SimpleLogger::init(config.log_level, simplelog::Config::default());
    info!("Starting..");
    debug!("listen address: {}", config.listen_addr);

    let pool = MySqlPool::connect(&config.database_url).await?;

    // The server key only lives inside the token codec
    let state = AppState {
        tokens: TokenCodec::new(config.server_key),
    };

    // Define routes
    let app = Router::new()
        .route("/games", get(controllers::general::list_games).post(controllers::general::new_game))
        .route("/games/:id", get(controllers::general::get_game).delete(controllers::general::delete_game))
        .route("/games/:id/join", post(controllers::general::join_game))
        .route("/games/:id/current", get(controllers::game::get_current))
        .route("/games/:id/set-ships", patch(controllers::game::set_ships))
        .route("/games/:id/fire", patch(controllers::game::fire))
        .route("/games/:id/last-fire", get(controllers::game::last_fire))
        .route("/games/:id/cheat", get(controllers::cheat::cheat))
        .with_state(state)
        .layer(Extension(pool));

    // Start the server
    info!("Listening on {}", config.listen_addr);
    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
