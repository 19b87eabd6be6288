pub mod cheat;
pub mod game;
pub mod general;

use log::warn;

use crate::db::GameStore;
use crate::errors::GameError;
use crate::models::game::Game;

const MAX_WRITE_ATTEMPTS: usize = 3;

// Apply one operation to an already loaded game and write it back. When
// another request updated the same game in between, start over from the
// fresh row so the operation is re-checked against the current phase and turn.
pub async fn modify<S, T>(
    store: &S,
    mut game: Game,
    mut operation: impl FnMut(&mut Game) -> Result<T, GameError>,
) -> Result<(Game, T), GameError>
where
    S: GameStore + Sync,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        if attempt > 1 {
            let game_id = game.game_id.clone();
            game = store.load(&game_id).await?;
        }
        let outcome = operation(&mut game)?;
        match store.save(&mut game).await {
            Ok(()) => return Ok((game, outcome)),
            Err(GameError::Conflict) => {
                warn!("Retrying write on game {} (attempt {})", game.game_id, attempt);
            }
            Err(err) => return Err(err),
        }
    }
    Err(GameError::Conflict)
}
