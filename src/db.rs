use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use sqlx::{types::Json, MySqlPool};
use uuid::Uuid;

use crate::errors::GameError;
use crate::models::fleet::Fleet;
use crate::models::game::{Game, Shot, Status};

// One row of the `game` table. Fleets, shot logs and status are JSON columns;
// an unset fleet is stored as `{}`, never NULL.
#[derive(sqlx::FromRow, Debug)]
pub struct GameRow {
    pub id: u64,
    pub game_id: String,
    pub created_at: DateTime<Utc>,
    pub player_1_ships: Json<Fleet>,
    pub player_1_shots: Json<Vec<Shot>>,
    pub player_2_ships: Json<Fleet>,
    pub player_2_shots: Json<Vec<Shot>>,
    pub status: Json<Status>,
    pub version: u32,
}

impl From<GameRow> for Game {
    fn from(row: GameRow) -> Game {
        Game {
            id: row.id,
            game_id: row.game_id,
            timestamp: row.created_at,
            player_1_ships: row.player_1_ships.0,
            player_1_shots: row.player_1_shots.0,
            player_2_ships: row.player_2_ships.0,
            player_2_shots: row.player_2_shots.0,
            status: row.status.0,
            version: row.version,
        }
    }
}

impl From<&Game> for GameRow {
    fn from(game: &Game) -> GameRow {
        GameRow {
            id: game.id,
            game_id: game.game_id.clone(),
            created_at: game.timestamp,
            player_1_ships: Json(game.player_1_ships.clone()),
            player_1_shots: Json(game.player_1_shots.clone()),
            player_2_ships: Json(game.player_2_ships.clone()),
            player_2_shots: Json(game.player_2_shots.clone()),
            status: Json(game.status),
            version: game.version,
        }
    }
}

// Stores a new game and fills in its storage key
pub async fn insert(pool: &MySqlPool, game: &mut Game) -> Result<(), GameError> {
    let sql = "INSERT INTO game (game_id, created_at, player_1_ships, player_1_shots, player_2_ships, player_2_shots, status, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
    let result = sqlx::query(sql)
        .bind(&game.game_id)
        .bind(game.timestamp)
        .bind(Json(&game.player_1_ships))
        .bind(Json(&game.player_1_shots))
        .bind(Json(&game.player_2_ships))
        .bind(Json(&game.player_2_shots))
        .bind(Json(&game.status))
        .bind(game.version)
        .execute(pool)
        .await
        .map_err(|err| {
            error!("Error creating game: {:?}", err);
            GameError::from(err)
        })?;

    game.id = result.last_insert_id();
    debug!("Game {} stored with id {}", game.game_id, game.id);
    Ok(())
}

pub async fn find(pool: &MySqlPool, game_id: &str) -> Result<Game, GameError> {
    // ids we never hand out cannot exist
    if Uuid::parse_str(game_id).is_err() {
        return Err(GameError::NotFound(game_id.to_string()));
    }

    let sql = "SELECT * FROM game WHERE game_id = ?";
    let row: Option<GameRow> = sqlx::query_as(sql)
        .bind(game_id)
        .fetch_optional(pool)
        .await
        .map_err(|err| {
            error!("Error fetching game {}: {:?}", game_id, err);
            GameError::from(err)
        })?;

    row.map(Game::from)
        .ok_or_else(|| GameError::NotFound(game_id.to_string()))
}

pub async fn list(pool: &MySqlPool) -> Result<Vec<Game>, GameError> {
    let sql = "SELECT * FROM game ORDER BY created_at";
    let rows: Vec<GameRow> = sqlx::query_as(sql)
        .fetch_all(pool)
        .await
        .map_err(|err| {
            error!("Error listing games: {:?}", err);
            GameError::from(err)
        })?;
    Ok(rows.into_iter().map(Game::from).collect())
}

/// Writes back every mutable column, provided nobody else updated the row
/// since `game` was loaded. Losing that race gives `Conflict`.
pub async fn update(pool: &MySqlPool, game: &mut Game) -> Result<(), GameError> {
    let sql = "UPDATE game SET player_1_ships = ?, player_1_shots = ?, player_2_ships = ?, player_2_shots = ?, status = ?, version = version + 1 WHERE game_id = ? AND version = ?";
    let result = sqlx::query(sql)
        .bind(Json(&game.player_1_ships))
        .bind(Json(&game.player_1_shots))
        .bind(Json(&game.player_2_ships))
        .bind(Json(&game.player_2_shots))
        .bind(Json(&game.status))
        .bind(&game.game_id)
        .bind(game.version)
        .execute(pool)
        .await
        .map_err(|err| {
            error!("Error updating game {}: {:?}", game.game_id, err);
            GameError::from(err)
        })?;

    if result.rows_affected() == 0 {
        warn!("Game {} changed concurrently (version {})", game.game_id, game.version);
        return Err(GameError::Conflict);
    }
    game.version += 1;
    Ok(())
}

pub async fn delete(pool: &MySqlPool, game_id: &str) -> Result<(), GameError> {
    let sql = "DELETE FROM game WHERE game_id = ?";
    let result = sqlx::query(sql)
        .bind(game_id)
        .execute(pool)
        .await
        .map_err(|err| {
            error!("Error deleting game {}: {:?}", game_id, err);
            GameError::from(err)
        })?;

    if result.rows_affected() == 0 {
        return Err(GameError::NotFound(game_id.to_string()));
    }
    Ok(())
}

// The read-modify-write side of the storage, what `controllers::modify` needs
#[async_trait]
pub trait GameStore {
    async fn load(&self, game_id: &str) -> Result<Game, GameError>;
    async fn save(&self, game: &mut Game) -> Result<(), GameError>;
}

#[async_trait]
impl GameStore for MySqlPool {
    async fn load(&self, game_id: &str) -> Result<Game, GameError> {
        find(self, game_id).await
    }

    async fn save(&self, game: &mut Game) -> Result<(), GameError> {
        update(self, game).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fleet::tests::valid_fleet;
    use crate::models::game::Role;
    use serde_json::json;

    #[test]
    fn fresh_game_round_trips_through_row() {
        let mut game = Game::new();
        game.id = 7;
        let row = GameRow::from(&game);
        assert_eq!(serde_json::to_string(&row.player_1_ships.0).unwrap(), "{}");
        assert_eq!(serde_json::to_string(&row.player_2_shots.0).unwrap(), "[]");
        assert_eq!(Game::from(row), game);
    }

    #[test]
    fn started_game_round_trips_through_row() {
        let mut game = Game::new();
        game.join().unwrap();
        game.join().unwrap();
        game.set_ships(Role::Player1, &valid_fleet()).unwrap();
        game.set_ships(Role::Player2, &valid_fleet()).unwrap();
        game.fire(Role::Player1, &json!([1, 1])).unwrap();
        game.version = 4;

        let restored = Game::from(GameRow::from(&game));
        assert_eq!(restored, game);
        assert_eq!(restored.status, Status::InProgress { turn: Role::Player2 });
    }

    #[test]
    fn json_columns_decode_to_what_was_encoded() {
        let mut game = Game::new();
        game.join().unwrap();
        game.join().unwrap();
        game.set_ships(Role::Player1, &valid_fleet()).unwrap();
        game.set_ships(Role::Player2, &valid_fleet()).unwrap();
        game.fire(Role::Player1, &json!([1, 1])).unwrap();

        let ships = serde_json::to_string(&game.player_1_ships).unwrap();
        let shots = serde_json::to_string(&game.player_1_shots).unwrap();
        let status = serde_json::to_string(&game.status).unwrap();

        assert_eq!(serde_json::from_str::<Fleet>(&ships).unwrap(), game.player_1_ships);
        assert_eq!(serde_json::from_str::<Vec<Shot>>(&shots).unwrap(), game.player_1_shots);
        assert_eq!(serde_json::from_str::<Status>(&status).unwrap(), game.status);
        assert_eq!(status, r#"{"phase":"in_progress","turn":"player2"}"#);
    }

    #[test]
    fn corrupted_shot_log_is_rejected() {
        let decoded = serde_json::from_str::<Vec<Shot>>(r#"[{"position":[0,0],"hit":true}]"#);
        assert!(decoded.is_err());
    }

    #[test]
    fn shot_log_encoding_is_ordered() {
        let mut game = Game::new();
        game.join().unwrap();
        game.join().unwrap();
        game.set_ships(Role::Player1, &valid_fleet()).unwrap();
        game.set_ships(Role::Player2, &valid_fleet()).unwrap();
        game.fire(Role::Player1, &json!([1, 9])).unwrap();
        game.fire(Role::Player2, &json!([3, 2])).unwrap();
        game.fire(Role::Player1, &json!([1, 1])).unwrap();

        let row = GameRow::from(&game);
        assert_eq!(
            serde_json::to_value(&row.player_1_shots.0).unwrap(),
            json!([
                {"position": [1, 9], "hit": false},
                {"position": [1, 1], "hit": true},
            ])
        );
    }
}
