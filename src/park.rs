use macroquad::prelude::Vec2;
use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::animal::{Animal, Diet, Species};
use crate::board::{Board, Gate, Spawn};
use crate::capital::Capital;
use crate::config::{self, Difficulty, ParkSettings};
use crate::entity::EntityRef;
use crate::error::ParkError;
use crate::events::{FeedbackSink, ParkEvent};
use crate::grid::TilePos;
use crate::wildlife::{WildlifeAi, WildlifeContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Playing,
    Won,
    Lost,
}

/// Day/night and month bookkeeping, in simulated seconds.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParkClock {
    pub elapsed: f32,
    pub day_time: f32,
    pub month_time: f32,
    pub months: u32,
}

impl ParkClock {
    /// Advance by `dt`. Returns true when a month boundary was crossed.
    fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        self.day_time = (self.day_time + dt) % config::DAY_LENGTH;
        self.month_time += dt;
        if self.month_time >= config::MONTH_LENGTH {
            self.month_time -= config::MONTH_LENGTH;
            self.months += 1;
            true
        } else {
            false
        }
    }
}

/// Cost of buying `what`, or `None` when it is not for sale.
pub fn price(what: Spawn) -> Option<i64> {
    match what {
        Spawn::Animal(species) => Some(species.value()),
        Spawn::Plant => Some(config::PLANT_PRICE),
        Spawn::Pond => Some(config::POND_PRICE),
        Spawn::Jeep => Some(config::JEEP_PRICE),
        Spawn::Ranger => Some(config::RANGER_HIRE_FEE),
        Spawn::Tourist | Spawn::Poacher => None,
    }
}

/// The whole running park: what the window loop, UI and save files talk to.
#[derive(Debug, Serialize, Deserialize)]
pub struct ParkSim {
    pub board: Board,
    pub capital: Capital,
    pub wildlife: WildlifeAi,
    pub clock: ParkClock,
    pub rng: ChaCha8Rng,
    pub difficulty: Difficulty,
    pub tick_count: u64,
    pub paused: bool,
    speed_level: usize,
    outcome: Outcome,
}

impl ParkSim {
    pub fn new(settings: &ParkSettings) -> Result<Self, ParkError> {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let mut board = Board::new(settings.width, settings.height, &mut rng);

        for species in Species::ALL {
            let count = match species.diet() {
                Diet::Carnivore => settings.carnivores_per_species,
                Diet::Herbivore => settings.herbivores_per_species,
            };
            for _ in 0..count {
                let pos = open_point(&board, &mut rng);
                board
                    .animals
                    .spawn_with(|id| Animal::new_rng(id, species, pos, &mut rng));
            }
        }
        for _ in 0..settings.plants {
            let pos = open_point(&board, &mut rng);
            board.spawn(Spawn::Plant, pos)?;
        }
        for _ in 0..settings.ponds {
            let pos = open_point(&board, &mut rng);
            board.spawn(Spawn::Pond, pos)?;
        }
        for _ in 0..settings.rangers {
            let pos = open_point(&board, &mut rng);
            board.spawn(Spawn::Ranger, pos)?;
        }
        let entrance = board.gate_position(Gate::Entrance);
        for _ in 0..settings.jeeps {
            board.spawn(Spawn::Jeep, entrance)?;
        }
        board.refresh_occupancy();

        log::info!(
            "new {} park {}x{} (seed {}), {} animals",
            settings.difficulty.label(),
            board.width(),
            board.height(),
            settings.seed,
            board.animals.len()
        );

        Ok(Self {
            board,
            capital: Capital::new(settings.difficulty.starting_funds()),
            wildlife: WildlifeAi::new(),
            clock: ParkClock::default(),
            rng,
            difficulty: settings.difficulty,
            tick_count: 0,
            paused: false,
            speed_level: 0,
            outcome: Outcome::Playing,
        })
    }

    /// Run one simulation step of `frame_dt` real seconds, scaled by the
    /// current speed. Does nothing while paused or once the game is over.
    pub fn tick(&mut self, frame_dt: f32, sink: &mut dyn FeedbackSink) {
        if self.paused || self.outcome != Outcome::Playing {
            return;
        }
        let dt = frame_dt * self.speed();

        let growth = self.board.update(dt);
        if growth.grew() {
            sink.play(&ParkEvent::BoardGrew {
                width: self.board.width(),
                height: self.board.height(),
            });
        }

        let ctx = WildlifeContext {
            dt,
            night: self.is_night(),
            difficulty: self.difficulty,
        };
        self.wildlife
            .update(&mut self.board, &mut self.capital, ctx, &mut self.rng, sink);

        if self.clock.advance(dt) {
            self.close_month(sink);
        }

        self.board.refresh_occupancy();
        self.tick_count += 1;
    }

    fn close_month(&mut self, sink: &mut dyn FeedbackSink) {
        self.wildlife
            .pay_rangers(&mut self.board, &mut self.capital, sink);
        self.capital.monthly_tick();
        sink.play(&ParkEvent::MonthClosed {
            month: self.clock.months,
            balance: self.capital.balance,
        });

        let (months, balance) = self.difficulty.win_target();
        if self.capital.bankrupt {
            sink.play(&ParkEvent::Bankrupt);
            self.outcome = Outcome::Lost;
            log::info!("park went bankrupt after {} months", self.clock.months);
        } else if self.clock.months >= months && self.capital.balance >= balance {
            self.outcome = Outcome::Won;
            log::info!("park reached its goal after {} months", self.clock.months);
        }
    }

    /// Place an entity for free.
    pub fn spawn(&mut self, what: Spawn, pos: Vec2) -> Result<EntityRef, ParkError> {
        self.board.spawn(what, pos)
    }

    /// Buy and place an entity. Jeeps always start at the entrance.
    pub fn purchase(&mut self, what: Spawn, pos: Vec2) -> Result<EntityRef, ParkError> {
        let cost = price(what).ok_or(ParkError::NotForSale(what.kind()))?;
        let pos = match what {
            Spawn::Jeep => self.board.gate_position(Gate::Entrance),
            _ => pos,
        };
        if !self.board.grid.contains_point(pos) {
            return Err(ParkError::OutOfBounds {
                x: pos.x.floor() as i32,
                y: pos.y.floor() as i32,
            });
        }
        self.capital.deduct(cost)?;
        self.board.spawn(what, pos)
    }

    pub fn speed(&self) -> f32 {
        config::SPEED_LEVELS[self.speed_level]
    }

    pub fn speed_level(&self) -> usize {
        self.speed_level
    }

    /// Select a speed multiplier by index; out-of-range levels clamp.
    pub fn set_time_speed(&mut self, level: usize) {
        self.speed_level = level.min(config::SPEED_LEVELS.len() - 1);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Jump half a day ahead.
    pub fn toggle_day_night(&mut self) {
        self.clock.day_time = (self.clock.day_time + config::DAY_LENGTH * 0.5) % config::DAY_LENGTH;
    }

    pub fn set_difficulty(&mut self, level: u8) {
        self.difficulty = Difficulty::from_level(level);
        log::info!("difficulty set to {}", self.difficulty.label());
    }

    /// Position in the day, 0 at dawn, 0.5 at dusk.
    pub fn day_phase(&self) -> f32 {
        self.clock.day_time / config::DAY_LENGTH
    }

    pub fn is_night(&self) -> bool {
        self.day_phase() >= 0.5
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

/// Random point on a tile animals can stand on.
fn open_point(board: &Board, rng: &mut impl Rng) -> Vec2 {
    let mut pos = board.random_point(rng);
    for _ in 0..16 {
        let blocked = board
            .grid
            .tile(TilePos::containing(pos))
            .is_some_and(|t| t.obstacle);
        if !blocked {
            break;
        }
        pos = board.random_point(rng);
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use macroquad::prelude::vec2;

    fn quiet_settings() -> ParkSettings {
        ParkSettings {
            carnivores_per_species: 0,
            herbivores_per_species: 0,
            plants: 0,
            ponds: 0,
            rangers: 0,
            jeeps: 0,
            ..ParkSettings::default()
        }
    }

    #[test]
    fn new_park_follows_settings() {
        let settings = ParkSettings::default();
        let sim = ParkSim::new(&settings).unwrap();
        assert_eq!(sim.board.animals.len(), 3 + 4 * 3);
        assert_eq!(sim.board.plants.len(), settings.plants);
        assert_eq!(sim.board.ponds.len(), settings.ponds);
        assert_eq!(sim.board.rangers.len(), settings.rangers);
        assert_eq!(sim.board.jeeps.len(), settings.jeeps);
        assert_eq!(sim.capital.balance, Difficulty::Normal.starting_funds());
        assert_eq!(sim.outcome(), Outcome::Playing);
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut sim = ParkSim::new(&quiet_settings()).unwrap();
        sim.pause();
        sim.pause();
        sim.tick(0.1, &mut NullSink);
        assert_eq!(sim.tick_count, 0);
        sim.resume();
        sim.resume();
        sim.tick(0.1, &mut NullSink);
        assert_eq!(sim.tick_count, 1);
    }

    #[test]
    fn speed_scales_simulated_time_once() {
        let mut sim = ParkSim::new(&quiet_settings()).unwrap();
        sim.set_time_speed(2);
        sim.tick(0.1, &mut NullSink);
        assert!((sim.clock.elapsed - 0.5).abs() < 1e-5);

        sim.set_time_speed(99);
        assert_eq!(sim.speed(), *config::SPEED_LEVELS.last().unwrap());
    }

    #[test]
    fn month_end_pays_rangers_and_upkeep() {
        let mut sim = ParkSim::new(&ParkSettings {
            rangers: 2,
            ..quiet_settings()
        })
        .unwrap();
        let start = sim.capital.balance;
        sim.clock.month_time = config::MONTH_LENGTH - 0.01;

        let mut events: Vec<ParkEvent> = Vec::new();
        sim.tick(0.1, &mut events);

        assert_eq!(sim.clock.months, 1);
        assert_eq!(
            sim.capital.balance,
            start - 2 * config::RANGER_SALARY - config::PARK_UPKEEP
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, ParkEvent::MonthClosed { month: 1, .. })));
    }

    #[test]
    fn bankruptcy_ends_the_game() {
        let mut sim = ParkSim::new(&quiet_settings()).unwrap();
        sim.capital.balance = 0;
        sim.clock.month_time = config::MONTH_LENGTH - 0.01;
        let mut events: Vec<ParkEvent> = Vec::new();
        sim.tick(0.1, &mut events);

        assert_eq!(sim.outcome(), Outcome::Lost);
        assert!(events.contains(&ParkEvent::Bankrupt));
        let ticks = sim.tick_count;
        sim.tick(0.1, &mut NullSink);
        assert_eq!(sim.tick_count, ticks);
    }

    #[test]
    fn meeting_the_target_wins() {
        let mut sim = ParkSim::new(&quiet_settings()).unwrap();
        let (months, balance) = sim.difficulty.win_target();
        sim.clock.months = months - 1;
        sim.capital.balance = balance + config::PARK_UPKEEP;
        sim.clock.month_time = config::MONTH_LENGTH - 0.01;
        sim.tick(0.1, &mut NullSink);
        assert_eq!(sim.outcome(), Outcome::Won);
    }

    #[test]
    fn purchase_charges_or_refuses() {
        let mut sim = ParkSim::new(&quiet_settings()).unwrap();
        sim.capital.balance = 100;

        let err = sim.purchase(Spawn::Plant, vec2(-1.0, 2.0)).unwrap_err();
        assert!(matches!(err, ParkError::OutOfBounds { .. }));
        assert_eq!(sim.capital.balance, 100);

        sim.purchase(Spawn::Plant, vec2(3.0, 3.0)).unwrap();
        assert_eq!(sim.capital.balance, 100 - config::PLANT_PRICE);
        assert_eq!(sim.board.plants.len(), 1);

        let err = sim.purchase(Spawn::Animal(Species::Elephant), vec2(3.0, 3.0)).unwrap_err();
        assert!(matches!(err, ParkError::InsufficientFunds { .. }));
        assert!(sim.board.animals.is_empty());

        assert_eq!(
            sim.purchase(Spawn::Poacher, vec2(3.0, 3.0)).unwrap_err(),
            ParkError::NotForSale(crate::entity::EntityKind::Poacher)
        );
    }

    #[test]
    fn day_night_toggle_and_difficulty() {
        let mut sim = ParkSim::new(&quiet_settings()).unwrap();
        assert!(!sim.is_night());
        sim.toggle_day_night();
        assert!(sim.is_night());
        assert!((0.0..1.0).contains(&sim.day_phase()));
        sim.toggle_day_night();
        assert!(!sim.is_night());

        sim.set_difficulty(2);
        assert_eq!(sim.difficulty, Difficulty::Hard);
    }
}
