use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_macros::debug_handler;
use log::info;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::MySqlPool;

use crate::auth::{check_access, BearerHeader};
use crate::controllers::modify;
use crate::db;
use crate::errors::GameError;
use crate::models::{game::Status, position::Position};
use crate::AppState;

// The answer to a shot
#[derive(Serialize, Debug)]
pub struct FireResponse {
    pub position: Position,
    pub hit: bool,
    pub status: Status,
}

// handler returning the caller's view of an ongoing game: own ships and own shots
pub async fn get_current(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Extension(pool): Extension<MySqlPool>,
    bearer: BearerHeader,
) -> Result<impl IntoResponse, GameError> {
    info!("current game request for {}", game_id);

    let game = db::find(&pool, &game_id).await?;
    let role = check_access(&state.tokens, &game_id, &bearer)?;

    Ok(Json(json!(game.player_view(role))))
}

// handler for placing the caller's fleet. A malformed body is rejected like an invalid fleet.
#[debug_handler]
pub async fn set_ships(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Extension(pool): Extension<MySqlPool>,
    bearer: BearerHeader,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, GameError> {
    info!("set ships request for {}", game_id);

    let game = db::find(&pool, &game_id).await?;
    let role = check_access(&state.tokens, &game_id, &bearer)?;
    let Json(fleet) = body?;

    let (game, _) = modify(&pool, game, |game| game.set_ships(role, &fleet)).await?;
    info!("Game {}: {} placed ships", game_id, role);

    Ok((StatusCode::OK, Json(json!(game.summary()))))
}

// handler for firing at the opponent, the body is a [col, row] array
#[debug_handler]
pub async fn fire(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Extension(pool): Extension<MySqlPool>,
    bearer: BearerHeader,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, GameError> {
    info!("fire request for {}", game_id);

    let game = db::find(&pool, &game_id).await?;
    let role = check_access(&state.tokens, &game_id, &bearer)?;
    let Json(target) = body?;

    let (game, shot) = modify(&pool, game, |game| game.fire(role, &target)).await?;
    info!(
        "Game {}: {} fired at {:?}, hit: {}",
        game_id, role, shot.position, shot.hit
    );

    Ok(Json(FireResponse {
        position: shot.position,
        hit: shot.hit,
        status: game.status,
    }))
}

// handler returning the last shot fired at the caller, null when there is none yet
pub async fn last_fire(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Extension(pool): Extension<MySqlPool>,
    bearer: BearerHeader,
) -> Result<impl IntoResponse, GameError> {
    info!("last fire request for {}", game_id);

    let game = db::find(&pool, &game_id).await?;
    let role = check_access(&state.tokens, &game_id, &bearer)?;

    Ok(Json(json!(game.last_fire_at(role))))
}
