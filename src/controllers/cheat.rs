use axum::{
    extract::{Path, State, TypedHeader},
    response::IntoResponse,
    Extension, Json,
};
use log::{info, warn};
use sqlx::MySqlPool;

use crate::auth::BearerHeader;
use crate::db;
use crate::errors::GameError;
use crate::AppState;

// Developer handler dumping a whole game, both fleets included. Needs the
// privileged token of that game instead of a player token.
pub async fn cheat(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Extension(pool): Extension<MySqlPool>,
    bearer: BearerHeader,
) -> Result<impl IntoResponse, GameError> {
    info!("cheat request for {}", game_id);

    let token = bearer.as_ref().map(|TypedHeader(header)| header.token()).ok_or(GameError::AuthFailure)?;
    state.tokens.verify_privileged(&game_id, token).map_err(|err| {
        warn!("Refused cheat request for {}", game_id);
        err
    })?;

    let game = db::find(&pool, &game_id).await?;
    Ok(Json(game))
}
