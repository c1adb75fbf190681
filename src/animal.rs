use macroquad::prelude::Vec2;
use ::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::entity::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diet {
    Carnivore,
    Herbivore,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Lion,
    Leopard,
    Hyena,
    Zebra,
    Giraffe,
    Elephant,
    Gazelle,
}

/// Base stats for a species: (speed, value, lifespan seconds).
struct SpeciesStats {
    speed: f32,
    value: i64,
    lifespan: u32,
}

impl Species {
    pub const ALL: [Species; 7] = [
        Species::Lion,
        Species::Leopard,
        Species::Hyena,
        Species::Zebra,
        Species::Giraffe,
        Species::Elephant,
        Species::Gazelle,
    ];

    pub fn diet(self) -> Diet {
        match self {
            Species::Lion | Species::Leopard | Species::Hyena => Diet::Carnivore,
            _ => Diet::Herbivore,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Lion => "Lion",
            Species::Leopard => "Leopard",
            Species::Hyena => "Hyena",
            Species::Zebra => "Zebra",
            Species::Giraffe => "Giraffe",
            Species::Elephant => "Elephant",
            Species::Gazelle => "Gazelle",
        }
    }

    /// Purchase price and tourist value.
    pub fn value(self) -> i64 {
        self.stats().value
    }

    fn stats(self) -> SpeciesStats {
        let (speed, value, lifespan) = match self {
            Species::Lion => (1.4, 900, 900),
            Species::Leopard => (1.6, 800, 800),
            Species::Hyena => (1.3, 400, 700),
            Species::Zebra => (1.2, 300, 800),
            Species::Giraffe => (0.9, 500, 1000),
            Species::Elephant => (0.7, 1200, 1400),
            Species::Gazelle => (1.5, 250, 600),
        };
        SpeciesStats {
            speed,
            value,
            lifespan,
        }
    }
}

/// Behavior state driven by the animal AI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalState {
    Wandering,
    SeekingWater,
    Drinking,
    SeekingFood,
    Eating,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Animal {
    pub id: EntityId,
    pub species: Species,
    #[serde(with = "crate::save_load::serde_vec2")]
    pub pos: Vec2,
    pub speed: f32,
    pub value: i64,
    pub lifespan: u32,
    pub age: f32,
    pub hunger: f32,
    pub thirst: f32,
    pub alive: bool,
    #[serde(with = "crate::save_load::serde_vec2::option")]
    pub target: Option<Vec2>,
    pub state: AnimalState,
    pub reproduce_cooldown: f32,
}

impl Animal {
    pub fn new(id: EntityId, species: Species, pos: Vec2) -> Self {
        let stats = species.stats();
        Self {
            id,
            species,
            pos,
            speed: stats.speed,
            value: stats.value,
            lifespan: stats.lifespan,
            age: 0.0,
            hunger: 0.0,
            thirst: 0.0,
            alive: true,
            target: None,
            state: AnimalState::Wandering,
            reproduce_cooldown: config::REPRODUCE_COOLDOWN,
        }
    }

    /// Start somewhere in the first half of life with a little hunger and thirst.
    pub fn new_rng(id: EntityId, species: Species, pos: Vec2, rng: &mut impl Rng) -> Self {
        let mut animal = Self::new(id, species, pos);
        animal.age = rng.gen_range(0.0..animal.lifespan as f32 * 0.5);
        animal.hunger = rng.gen_range(0.0..4.0);
        animal.thirst = rng.gen_range(0.0..4.0);
        animal.reproduce_cooldown = rng.gen_range(0.0..config::REPRODUCE_COOLDOWN);
        animal
    }

    pub fn diet(&self) -> Diet {
        self.species.diet()
    }

    pub fn is_adult(&self) -> bool {
        self.age >= self.lifespan as f32 / 2.0
    }

    pub fn add_hunger(&mut self, amount: f32) {
        self.hunger = (self.hunger + amount).clamp(0.0, config::NEED_MAX);
    }

    pub fn add_thirst(&mut self, amount: f32) {
        self.thirst = (self.thirst + amount).clamp(0.0, config::NEED_MAX);
    }

    /// Old age, or both needs saturated at the same time.
    pub fn should_die(&self) -> bool {
        self.age >= self.lifespan as f32
            || (self.hunger >= config::NEED_MAX && self.thirst >= config::NEED_MAX)
    }

    /// Advance age and needs; flips `alive` when the animal expires.
    pub fn tick(&mut self, dt: f32) {
        if !self.alive {
            return;
        }
        self.age += dt;
        self.add_hunger(config::HUNGER_RATE * dt);
        self.add_thirst(config::THIRST_RATE * dt);
        self.reproduce_cooldown = (self.reproduce_cooldown - dt).max(0.0);
        if self.should_die() {
            self.alive = false;
        }
    }

    /// Step toward the current target. Returns true once it is reached.
    pub fn step_toward_target(&mut self, dt: f32) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let delta = target - self.pos;
        let dist = delta.length();
        let step = self.speed * dt;
        if dist <= step {
            self.pos = target;
            true
        } else {
            self.pos += delta / dist * step;
            false
        }
    }

    /// Eat another animal. The prey dies; returns the nutrition gained.
    pub fn consume(&mut self, prey: &mut Animal) -> f32 {
        if self.diet() != Diet::Carnivore || !prey.alive {
            return 0.0;
        }
        let nutrition = (prey.age + (config::NEED_MAX - prey.hunger)).min(config::NEED_MAX);
        prey.alive = false;
        self.add_hunger(-nutrition);
        nutrition
    }

    /// Offspring of two adults of the same species, born at the midpoint.
    pub fn reproduce(&self, other: &Animal, id: EntityId) -> Option<Animal> {
        if !self.alive || !other.alive || self.species != other.species {
            return None;
        }
        if !self.is_adult() || !other.is_adult() {
            return None;
        }
        let mut child = Animal::new(id, self.species, (self.pos + other.pos) * 0.5);
        child.lifespan = (self.lifespan + other.lifespan) / 2;
        child.speed = self.speed;
        child.value = self.value;
        Some(child)
    }
}
