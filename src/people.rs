use macroquad::prelude::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config;
use crate::entity::EntityId;

/// Move `pos` toward `target` by at most `step`. Returns true on arrival.
pub fn step_toward(pos: &mut Vec2, target: Vec2, step: f32) -> bool {
    let delta = target - *pos;
    let dist = delta.length();
    if dist <= step {
        *pos = target;
        true
    } else {
        *pos += delta / dist * step;
        false
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tourist {
    pub id: EntityId,
    #[serde(with = "crate::save_load::serde_vec2")]
    pub pos: Vec2,
    /// Jeep currently ridden. Not owned; looked up on the board.
    pub jeep: Option<EntityId>,
    pub seen_animals: HashSet<EntityId>,
    pub timer: f32,
    pub roaming: bool,
    #[serde(with = "crate::save_load::serde_vec2::option")]
    pub exit_target: Option<Vec2>,
}

impl Tourist {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            jeep: None,
            seen_animals: HashSet::new(),
            timer: 0.0,
            roaming: false,
            exit_target: None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.jeep.is_none() && !self.roaming
    }

    pub fn disembark(&mut self, exit: Vec2) {
        self.jeep = None;
        self.roaming = true;
        self.timer = config::TOURIST_ROAM_TIME;
        self.exit_target = Some(exit);
    }

    pub fn is_done(&self) -> bool {
        self.roaming && self.timer <= 0.0
    }

    pub fn reward(&self) -> i64 {
        config::TOURIST_BASE_REWARD + config::TOURIST_REWARD_PER_ANIMAL * self.seen_animals.len() as i64
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ranger {
    pub id: EntityId,
    pub salary: i64,
    #[serde(with = "crate::save_load::serde_vec2")]
    pub pos: Vec2,
    pub vision: f32,
    pub speed: f32,
    /// Poacher being chased.
    pub chasing: Option<EntityId>,
    #[serde(with = "crate::save_load::serde_vec2::option")]
    pub patrol_target: Option<Vec2>,
    pub poachers_caught: u32,
    pub on_duty: bool,
}

impl Ranger {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            salary: config::RANGER_SALARY,
            pos,
            vision: config::RANGER_VISION,
            speed: config::RANGER_SPEED,
            chasing: None,
            patrol_target: None,
            poachers_caught: 0,
            on_duty: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Poacher {
    pub id: EntityId,
    #[serde(with = "crate::save_load::serde_vec2")]
    pub pos: Vec2,
    pub speed: f32,
    pub hunting: bool,
    pub visible: bool,
    pub captured: bool,
    pub kills: u32,
    pub hunt_cooldown: f32,
    #[serde(with = "crate::save_load::serde_vec2::option")]
    pub wander_target: Option<Vec2>,
}

impl Poacher {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            speed: config::POACHER_SPEED,
            hunting: false,
            visible: false,
            captured: false,
            kills: 0,
            hunt_cooldown: config::POACHER_HUNT_COOLDOWN,
            wander_target: None,
        }
    }
}
