// All tunable simulation constants in one place. Distances are in tile units,
// times in simulated seconds, money in whole dollars.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ParkError;

// Board
pub const BOARD_WIDTH: usize = 24;
pub const BOARD_HEIGHT: usize = 16;
pub const MAX_BOARD_WIDTH: usize = 48;
pub const MAX_BOARD_HEIGHT: usize = 32;
pub const GROWTH_MARGIN: i32 = 2;
pub const TERRAIN_NOISE_SCALE: f64 = 0.15;
pub const WATER_RELAX_RATE: f32 = 0.2;

// Simulation
pub const FIXED_DT: f32 = 1.0 / 60.0;
pub const SPEED_LEVELS: [f32; 4] = [1.0, 2.0, 5.0, 10.0];
pub const DAY_LENGTH: f32 = 120.0;
pub const MONTH_LENGTH: f32 = 240.0;

// Spatial hash
pub const SPATIAL_CELL_SIZE: f32 = 2.0;

// Camera (zoom is pixels per tile)
pub const CAMERA_ZOOM_DEFAULT: f32 = 32.0;
pub const CAMERA_ZOOM_MIN: f32 = 8.0;
pub const CAMERA_ZOOM_MAX: f32 = 96.0;
pub const CAMERA_ZOOM_SPEED: f32 = 0.1;
pub const CAMERA_PAN_SPEED: f32 = 600.0;
pub const CAMERA_SMOOTH_SPEED: f32 = 10.0;
pub const PICK_RADIUS: f32 = 0.6;

// Jeeps
pub const JEEP_SPEED: f32 = 1.5;
pub const JEEP_CAPACITY: usize = 4;
pub const JEEP_ARRIVAL_EPSILON: f32 = 0.25;
pub const INITIAL_JEEP_COUNT: usize = 2;

// Animals
pub const NEED_MAX: f32 = 10.0;
pub const NEED_THRESHOLD: f32 = 7.0;
pub const HUNGER_RATE: f32 = 0.08;
pub const THIRST_RATE: f32 = 0.1;
pub const DRINK_RATE: f32 = 2.0;
pub const GRAZE_RATE: f32 = 1.5;
pub const INTERACTION_RANGE: f32 = 1.0;
pub const WANDER_RANGE: f32 = 3.0;
pub const REPRODUCE_COOLDOWN: f32 = 60.0;
pub const MAX_ANIMALS: usize = 120;

// Detection / collision
pub const DETECTION_RADIUS: f32 = 4.5;
pub const ENTITY_RADIUS: f32 = 0.25;
pub const COLLISION_EPSILON: f32 = 1e-4;

// Flora
pub const PLANT_MAX_NUTRITION: f32 = 10.0;
pub const PLANT_REGROW_RATE: f32 = 0.05;

// Rangers
pub const RANGER_SALARY: i64 = 150;
pub const RANGER_HIRE_FEE: i64 = 100;
pub const RANGER_VISION: f32 = 5.0;
pub const RANGER_SPEED: f32 = 2.5;
pub const RANGER_NIGHT_VISION_FACTOR: f32 = 0.6;
pub const CAPTURE_DISTANCE: f32 = 0.5;
/// A ranger this close to its quarry closes the gap in one tick.
pub const RANGER_LUNGE_RANGE: f32 = 1.0;
pub const POACHER_BOUNTY: i64 = 50;

// Poachers
pub const POACHER_SPAWN_INTERVAL: f32 = 45.0;
pub const POACHER_SPEED: f32 = 1.2;
pub const POACHER_HUNT_RADIUS: f32 = 4.0;
pub const POACHER_KILL_RANGE: f32 = 1.0;
pub const POACHER_HUNT_COOLDOWN: f32 = 8.0;

// Tourists
pub const TOURIST_BASE_INTERVAL: f32 = 12.0;
pub const TOURIST_MIN_INTERVAL: f32 = 3.0;
pub const ATTRACTION_SCALE: f32 = 10.0;
pub const TOURIST_QUEUE_CAPACITY: usize = 30;
pub const TOURIST_SPAWN_JITTER: f32 = 0.3;
pub const TOURIST_SIGHT_RADIUS: f32 = 5.0;
pub const TOURIST_ROAM_TIME: f32 = 10.0;
pub const TOURIST_SPEED: f32 = 0.8;
pub const TOURIST_BASE_REWARD: i64 = 200;
pub const TOURIST_REWARD_PER_ANIMAL: i64 = 30;

// Economy
pub const PARK_UPKEEP: i64 = 100;
pub const PARK_BASE_INCOME: i64 = 0;
pub const PLANT_PRICE: i64 = 20;
pub const POND_PRICE: i64 = 80;
pub const JEEP_PRICE: i64 = 300;

/// Game difficulty. Scales poacher pressure, starting funds and the win target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Difficulty::Easy,
            1 => Difficulty::Normal,
            _ => Difficulty::Hard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn poacher_interval(self) -> f32 {
        match self {
            Difficulty::Easy => POACHER_SPAWN_INTERVAL * 1.5,
            Difficulty::Normal => POACHER_SPAWN_INTERVAL,
            Difficulty::Hard => POACHER_SPAWN_INTERVAL * 0.6,
        }
    }

    pub fn starting_funds(self) -> i64 {
        match self {
            Difficulty::Easy => 5000,
            Difficulty::Normal => 3000,
            Difficulty::Hard => 1500,
        }
    }

    /// (months survived, balance) needed to win.
    pub fn win_target(self) -> (u32, i64) {
        match self {
            Difficulty::Easy => (3, 6000),
            Difficulty::Normal => (6, 10000),
            Difficulty::Hard => (12, 20000),
        }
    }
}

/// Run-time settings for a new park. Loaded from JSON when a path is given.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkSettings {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub difficulty: Difficulty,
    pub carnivores_per_species: usize,
    pub herbivores_per_species: usize,
    pub plants: usize,
    pub ponds: usize,
    pub rangers: usize,
    pub jeeps: usize,
}

impl Default for ParkSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            difficulty: Difficulty::Normal,
            carnivores_per_species: 1,
            herbivores_per_species: 3,
            plants: 14,
            ponds: 3,
            rangers: 1,
            jeeps: INITIAL_JEEP_COUNT,
        }
    }
}

impl ParkSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParkError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ParkError::Config(format!("{}: {e}", path.as_ref().display())))?;
        let settings: ParkSettings =
            serde_json::from_str(&text).map_err(|e| ParkError::Config(e.to_string()))?;
        if settings.width < 4 || settings.height < 4 {
            return Err(ParkError::Config(format!(
                "board must be at least 4x4, got {}x{}",
                settings.width, settings.height
            )));
        }
        Ok(settings)
    }
}
