use macroquad::prelude::Vec2;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::entity::EntityId;

/// Grazing patch. Herbivores draw nutrition from it; it slowly regrows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plant {
    pub id: EntityId,
    #[serde(with = "crate::save_load::serde_vec2")]
    pub pos: Vec2,
    pub nutrition: f32,
    pub max_nutrition: f32,
    pub regrow_rate: f32,
}

impl Plant {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            nutrition: config::PLANT_MAX_NUTRITION,
            max_nutrition: config::PLANT_MAX_NUTRITION,
            regrow_rate: config::PLANT_REGROW_RATE,
        }
    }

    pub fn has_food(&self) -> bool {
        self.nutrition > 0.0
    }

    /// Take up to `amount` nutrition. Returns what was actually yielded.
    pub fn consume_from(&mut self, amount: f32) -> f32 {
        let yielded = amount.clamp(0.0, self.nutrition);
        self.nutrition -= yielded;
        yielded
    }

    pub fn regrow(&mut self, dt: f32) {
        self.nutrition = (self.nutrition + self.regrow_rate * dt).min(self.max_nutrition);
    }
}

/// Water source. Never runs dry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pond {
    pub id: EntityId,
    #[serde(with = "crate::save_load::serde_vec2")]
    pub pos: Vec2,
}

impl Pond {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self { id, pos }
    }
}
