use thiserror::Error;

use crate::entity::EntityKind;

/// Recoverable failures raised by park operations. None of these should end a
/// frame; `ParkSim::tick` logs them and carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParkError {
    #[error("position ({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },
    #[error("insufficient funds: need ${needed}, have ${available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("{0:?} cannot be bought")]
    NotForSale(EntityKind),
    #[error("no road network to plan on")]
    NoRoadNetwork,
    #[error("config error: {0}")]
    Config(String),
    #[error("save failed: {0}")]
    Save(String),
    #[error("load failed: {0}")]
    Load(String),
}
