pub mod fleet;
pub mod game;
pub mod position;
