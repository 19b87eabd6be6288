use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use log::info;
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;

use crate::auth::{check_access, BearerHeader};
use crate::controllers::modify;
use crate::db;
use crate::errors::GameError;
use crate::models::game::{Game, Role, Status, Summary};
use crate::AppState;

// Returned to a player that joined a game; the token authenticates all its later requests
#[derive(Serialize, Debug)]
pub struct JoinResponse {
    pub game_id: String,
    pub player: Role,
    pub token: String,
}

// handler listing all games
pub async fn list_games(Extension(pool): Extension<MySqlPool>) -> Result<impl IntoResponse, GameError> {
    info!("list games request");

    let games = db::list(&pool).await?;
    let summaries: Vec<Summary> = games.iter().map(Game::summary).collect();
    Ok(Json(json!(summaries)))
}

// handler for creating a new game. Nobody has joined yet.
pub async fn new_game(Extension(pool): Extension<MySqlPool>) -> Result<impl IntoResponse, GameError> {
    info!("new game request");

    let mut game = Game::new();
    db::insert(&pool, &mut game).await?;
    info!("Game {} created", game.game_id);

    Ok((StatusCode::CREATED, Json(json!(game.summary()))))
}

// handler for deleting a game, only a player of that game may do so
pub async fn delete_game(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Extension(pool): Extension<MySqlPool>,
    bearer: BearerHeader,
) -> Result<impl IntoResponse, GameError> {
    info!("delete game request for {}", game_id);

    // unknown games answer 404 whatever the token
    db::find(&pool, &game_id).await?;
    let role = check_access(&state.tokens, &game_id, &bearer)?;

    db::delete(&pool, &game_id).await?;
    info!("Game {} deleted by {}", game_id, role);
    Ok(StatusCode::NO_CONTENT)
}

// handler for joining a game. The first caller becomes player1, the second player2.
pub async fn join_game(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Extension(pool): Extension<MySqlPool>,
) -> Result<impl IntoResponse, GameError> {
    info!("join game request for {}", game_id);

    let game = db::find(&pool, &game_id).await?;
    let (_, role) = modify(&pool, game, |game| game.join()).await?;
    info!("Game {} joined as {}", game_id, role);

    let token = state.tokens.issue(&game_id, role);
    Ok(Json(JoinResponse { game_id, player: role, token }))
}

// handler returning the full record of a finished game
pub async fn get_game(
    Path(game_id): Path<String>,
    Extension(pool): Extension<MySqlPool>,
) -> Result<impl IntoResponse, GameError> {
    info!("get game request for {}", game_id);

    let game = db::find(&pool, &game_id).await?;
    if !matches!(game.status, Status::Finished { .. }) {
        return Err(GameError::ForbiddenOperation("match not finished"));
    }
    Ok(Json(game))
}
