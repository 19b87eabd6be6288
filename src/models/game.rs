use std::{fmt, str::FromStr};

use bit_vec::BitVec;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::GameError;
use crate::models::fleet::{Fleet, FLEET_CELLS};
use crate::models::position::{Position, GRID_SIZE};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player1,
    Player2,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Player1 => "player1",
            Role::Player2 => "player2",
        }
    }

    pub fn opponent(self) -> Role {
        match self {
            Role::Player1 => Role::Player2,
            Role::Player2 => Role::Player1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player1" => Ok(Role::Player1),
            "player2" => Ok(Role::Player2),
            other => Err(GameError::InvalidPlayer(other.to_string())),
        }
    }
}

// Lifecycle of a match. The phase-specific fields only exist in their phase.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Status {
    New { nb_players: u8 },
    InProgress { turn: Role },
    Finished { winner: Role },
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    pub position: Position,
    pub hit: bool,
}

/// One match between two players. All mutation goes through `join`,
/// `set_ships` and `fire`; a failing call leaves the match untouched.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Game {
    // storage key, 0 until the row is created
    #[serde(skip)]
    pub id: u64,
    pub game_id: String,
    pub timestamp: DateTime<Utc>,
    pub player_1_ships: Fleet,
    pub player_1_shots: Vec<Shot>,
    pub player_2_ships: Fleet,
    pub player_2_shots: Vec<Shot>,
    pub status: Status,
    // optimistic concurrency counter of the stored row
    #[serde(skip)]
    pub version: u32,
}

#[derive(Serialize, Debug)]
pub struct Summary<'a> {
    pub game_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub status: Status,
}

// What a player may see of an ongoing match
#[derive(Serialize, Debug)]
pub struct PlayerView<'a> {
    pub game_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub status: Status,
    pub player: Role,
    pub ships: &'a Fleet,
    pub shots: &'a [Shot],
}

impl Game {
    pub fn new() -> Game {
        Game {
            id: 0,
            game_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            player_1_ships: Fleet::default(),
            player_1_shots: Vec::new(),
            player_2_ships: Fleet::default(),
            player_2_shots: Vec::new(),
            status: Status::New { nb_players: 0 },
            version: 0,
        }
    }

    pub fn ships(&self, role: Role) -> &Fleet {
        match role {
            Role::Player1 => &self.player_1_ships,
            Role::Player2 => &self.player_2_ships,
        }
    }

    /// Shots fired by `role` at the opponent's fleet, oldest first.
    pub fn shots(&self, role: Role) -> &[Shot] {
        match role {
            Role::Player1 => &self.player_1_shots,
            Role::Player2 => &self.player_2_shots,
        }
    }

    /// The most recent shot fired at `role`.
    pub fn last_fire_at(&self, role: Role) -> Option<&Shot> {
        self.shots(role.opponent()).last()
    }

    pub fn summary(&self) -> Summary<'_> {
        Summary {
            game_id: &self.game_id,
            timestamp: self.timestamp,
            status: self.status,
        }
    }

    pub fn player_view(&self, role: Role) -> PlayerView<'_> {
        PlayerView {
            game_id: &self.game_id,
            timestamp: self.timestamp,
            status: self.status,
            player: role,
            ships: self.ships(role),
            shots: self.shots(role),
        }
    }

    /// Registers a new player and returns the role assigned to it.
    pub fn join(&mut self) -> Result<Role, GameError> {
        let nb_players = match self.status {
            Status::New { nb_players } => nb_players,
            _ => return Err(GameError::ForbiddenOperation("match not open for joining")),
        };
        let role = match nb_players {
            0 => Role::Player1,
            1 => Role::Player2,
            _ => return Err(GameError::ForbiddenOperation("match is full")),
        };
        self.status = Status::New { nb_players: nb_players + 1 };
        debug!("Game {}: {} joined", self.game_id, role);
        Ok(role)
    }

    /// Validates and stores the fleet of `role`. Each player submits once;
    /// the second submission starts the match with player1 to move.
    pub fn set_ships(&mut self, role: Role, submission: &Value) -> Result<(), GameError> {
        if !matches!(self.status, Status::New { .. }) {
            return Err(GameError::ForbiddenOperation("match not open for fleet submission"));
        }
        if !self.ships(role).is_empty() {
            return Err(GameError::ForbiddenOperation("fleet already submitted"));
        }

        let fleet = Fleet::validate(submission)?;
        match role {
            Role::Player1 => self.player_1_ships = fleet,
            Role::Player2 => self.player_2_ships = fleet,
        }

        if !self.player_1_ships.is_empty() && !self.player_2_ships.is_empty() {
            self.status = Status::InProgress { turn: Role::Player1 };
            debug!("Game {}: both fleets set, match started", self.game_id);
        }
        Ok(())
    }

    /// Fires at the opponent's fleet. Repeated shots at the same cell are
    /// allowed and logged, but only distinct hit cells count towards the win.
    pub fn fire(&mut self, role: Role, target: &Value) -> Result<Shot, GameError> {
        let turn = match self.status {
            Status::InProgress { turn } => turn,
            _ => return Err(GameError::ForbiddenOperation("match not in progress")),
        };
        if turn != role {
            return Err(GameError::ForbiddenOperation("not your turn"));
        }
        let position = Position::parse(target)?;

        let shot = Shot {
            position,
            hit: self.ships(role.opponent()).contains(&position),
        };
        match role {
            Role::Player1 => self.player_1_shots.push(shot),
            Role::Player2 => self.player_2_shots.push(shot),
        }

        if distinct_hits(self.shots(role)) == FLEET_CELLS {
            self.status = Status::Finished { winner: role };
            debug!("Game {}: {} won", self.game_id, role);
        } else {
            self.status = Status::InProgress { turn: role.opponent() };
        }
        Ok(shot)
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

fn distinct_hits(shots: &[Shot]) -> usize {
    let cells = GRID_SIZE as usize * GRID_SIZE as usize;
    let mut hit = BitVec::from_elem(cells, false);
    for shot in shots.iter().filter(|shot| shot.hit) {
        hit.set(shot.position.index(), true);
    }
    hit.iter().filter(|cell| *cell).count()
}
