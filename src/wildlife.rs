use macroquad::prelude::Vec2;
use ::rand::seq::SliceRandom;
use ::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::animal::Species;
use crate::animal_ai::{AnimalAi, AnimalTick};
use crate::board::{Board, Spawn};
use crate::capital::Capital;
use crate::config::{self, Difficulty};
use crate::entity::EntityId;
use crate::events::{FeedbackSink, ParkEvent};
use crate::people::step_toward;
use crate::tourism::{TouristAi, TouristTick};

/// Per-tick inputs that come from the park clock and settings.
#[derive(Clone, Copy, Debug)]
pub struct WildlifeContext {
    pub dt: f32,
    pub night: bool,
    pub difficulty: Difficulty,
}

/// A poacher kill recorded during the poacher pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Poaching {
    pub poacher: EntityId,
    pub animal: EntityId,
    pub species: Species,
}

#[derive(Debug, Default)]
pub struct WildlifeTick {
    pub captured: Vec<EntityId>,
    pub poached: Vec<Poaching>,
    pub animals: AnimalTick,
    pub tourists: TouristTick,
}

/// Coordinates everything that moves on its own: rangers, poachers, and
/// through delegation, animals and tourists.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WildlifeAi {
    pub poacher_timer: f32,
    pub tourists: TouristAi,
    #[serde(skip)]
    pub animals: AnimalAi,
}

impl WildlifeAi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        board: &mut Board,
        capital: &mut Capital,
        ctx: WildlifeContext,
        rng: &mut impl Rng,
        sink: &mut dyn FeedbackSink,
    ) -> WildlifeTick {
        self.maybe_spawn_poacher(board, ctx, rng, sink);

        let captured = update_rangers(board, capital, ctx, rng, sink);
        let poached = update_poachers(board, ctx.dt, rng);

        for &id in &captured {
            board.poachers.despawn(id);
        }
        for kill in &poached {
            if board.animals.despawn(kill.animal).is_some() {
                sink.play(&ParkEvent::AnimalPoached {
                    poacher: kill.poacher,
                    animal: kill.animal,
                    species: kill.species,
                });
            }
        }

        let animals = self.animals.update(board, ctx.dt, rng, sink);
        let tourists = self.tourists.update(board, capital, ctx.dt, rng, sink);

        WildlifeTick {
            captured,
            poached,
            animals,
            tourists,
        }
    }

    fn maybe_spawn_poacher(
        &mut self,
        board: &mut Board,
        ctx: WildlifeContext,
        rng: &mut impl Rng,
        sink: &mut dyn FeedbackSink,
    ) {
        self.poacher_timer += ctx.dt;
        let interval = ctx.difficulty.poacher_interval();
        if self.poacher_timer < interval {
            return;
        }
        self.poacher_timer -= interval;
        let pos = board.random_edge_point(rng);
        match board.spawn(Spawn::Poacher, pos) {
            Ok(poacher) => sink.play(&ParkEvent::PoacherSpawned { poacher: poacher.id }),
            Err(e) => log::warn!("poacher spawn failed: {e}"),
        }
    }

    /// Pay every ranger. Rangers that cannot be paid leave the park.
    pub fn pay_rangers(
        &self,
        board: &mut Board,
        capital: &mut Capital,
        sink: &mut dyn FeedbackSink,
    ) -> Vec<EntityId> {
        let mut dismissed = Vec::new();
        let mut ids = board.rangers.ids();
        ids.sort_unstable();
        for id in ids {
            let Some(ranger) = board.rangers.get_mut(id) else {
                continue;
            };
            if let Err(e) = capital.deduct(ranger.salary) {
                log::warn!("ranger {id} unpaid: {e}");
                ranger.on_duty = false;
                dismissed.push(id);
            }
        }
        for &id in &dismissed {
            board.rangers.despawn(id);
            sink.play(&ParkEvent::RangerDismissed { ranger: id });
        }
        dismissed
    }
}

/// Chase the nearest visible poacher, or patrol. Returns captured poachers.
fn update_rangers(
    board: &mut Board,
    capital: &mut Capital,
    ctx: WildlifeContext,
    rng: &mut impl Rng,
    sink: &mut dyn FeedbackSink,
) -> Vec<EntityId> {
    let mut captured = Vec::new();
    for (_, poacher) in board.poachers.iter_mut() {
        poacher.visible = false;
    }

    let mut ids = board.rangers.ids();
    ids.sort_unstable();
    for id in ids {
        let patrol_point = board.random_point(rng);
        let Some(ranger) = board.rangers.get_mut(id) else {
            continue;
        };
        if !ranger.on_duty {
            continue;
        }
        let vision = if ctx.night {
            ranger.vision * config::RANGER_NIGHT_VISION_FACTOR
        } else {
            ranger.vision
        };

        let target = board
            .poachers
            .iter()
            .filter(|(_, p)| !p.captured)
            .map(|(pid, p)| (pid, p.pos.distance(ranger.pos)))
            .filter(|&(_, d)| d <= vision)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(pid, _)| pid);

        let Some(poacher_id) = target else {
            ranger.chasing = None;
            let goal = *ranger.patrol_target.get_or_insert(patrol_point);
            if step_toward(&mut ranger.pos, goal, ranger.speed * ctx.dt) {
                ranger.patrol_target = None;
            }
            ranger.pos = board.grid.clamp_point(ranger.pos);
            continue;
        };

        let Some(poacher) = board.poachers.get_mut(poacher_id) else {
            continue;
        };
        poacher.visible = true;
        ranger.chasing = Some(poacher_id);
        if ranger.pos.distance(poacher.pos) <= config::RANGER_LUNGE_RANGE {
            ranger.pos = poacher.pos;
        } else {
            step_toward(&mut ranger.pos, poacher.pos, ranger.speed * ctx.dt);
        }
        ranger.pos = board.grid.clamp_point(ranger.pos);

        if ranger.pos.distance(poacher.pos) < config::CAPTURE_DISTANCE {
            poacher.captured = true;
            ranger.poachers_caught += 1;
            ranger.chasing = None;
            capital.add_funds(config::POACHER_BOUNTY);
            sink.play(&ParkEvent::PoacherCaught {
                ranger: id,
                poacher: poacher_id,
                bounty: config::POACHER_BOUNTY,
            });
            captured.push(poacher_id);
        }
    }
    captured
}

/// Poachers stalk the nearest animal and kill when in range and rested.
fn update_poachers(board: &mut Board, dt: f32, rng: &mut impl Rng) -> Vec<Poaching> {
    let mut poached: Vec<Poaching> = Vec::new();
    let mut ids = board.poachers.ids();
    ids.sort_unstable();

    for id in ids {
        let wander_point = board.random_point(rng);
        let Some(poacher) = board.poachers.get_mut(id) else {
            continue;
        };
        if poacher.captured {
            continue;
        }
        poacher.hunt_cooldown = (poacher.hunt_cooldown - dt).max(0.0);

        let already_dead = |aid: EntityId| poached.iter().any(|k| k.animal == aid);
        let prey: Vec<(EntityId, Vec2, f32)> = board
            .animals
            .iter()
            .filter(|(aid, a)| a.alive && !already_dead(*aid))
            .map(|(aid, a)| (aid, a.pos, a.pos.distance(poacher.pos)))
            .filter(|&(_, _, d)| d <= config::POACHER_HUNT_RADIUS)
            .collect();

        let Some(&(_, nearest_pos, _)) = prey.iter().min_by(|a, b| a.2.total_cmp(&b.2)) else {
            poacher.hunting = false;
            let goal = *poacher.wander_target.get_or_insert(wander_point);
            if step_toward(&mut poacher.pos, goal, poacher.speed * dt) {
                poacher.wander_target = None;
            }
            poacher.pos = board.grid.clamp_point(poacher.pos);
            continue;
        };
        poacher.hunting = true;

        let in_range: Vec<EntityId> = prey
            .iter()
            .filter(|&&(_, _, d)| d <= config::POACHER_KILL_RANGE)
            .map(|&(aid, _, _)| aid)
            .collect();

        if poacher.hunt_cooldown <= 0.0 {
            if let Some(&victim) = in_range.choose(rng) {
                if let Some(animal) = board.animals.get_mut(victim) {
                    animal.alive = false;
                    poacher.kills += 1;
                    poacher.hunt_cooldown = config::POACHER_HUNT_COOLDOWN;
                    poached.push(Poaching {
                        poacher: id,
                        animal: victim,
                        species: animal.species,
                    });
                    continue;
                }
            }
        }

        step_toward(&mut poacher.pos, nearest_pos, poacher.speed * dt);
        poacher.pos = board.grid.clamp_point(poacher.pos);
    }
    poached
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::prelude::vec2;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx(dt: f32, night: bool) -> WildlifeContext {
        WildlifeContext {
            dt,
            night,
            difficulty: Difficulty::Normal,
        }
    }

    fn setup(seed: u64) -> (Board, Capital, WildlifeAi, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let board = Board::flat(16, 16, &mut rng);
        (board, Capital::new(1000), WildlifeAi::new(), rng)
    }

    #[test]
    fn ranger_catches_adjacent_poacher_and_earns_bounty() {
        let (mut board, mut capital, mut ai, mut rng) = setup(1);
        let ranger = board.spawn(Spawn::Ranger, vec2(5.0, 5.0)).unwrap().id;
        let poacher = board.spawn(Spawn::Poacher, vec2(5.0, 6.0)).unwrap().id;

        let mut events: Vec<ParkEvent> = Vec::new();
        let tick = ai.update(
            &mut board,
            &mut capital,
            ctx(config::FIXED_DT, false),
            &mut rng,
            &mut events,
        );

        assert_eq!(tick.captured, vec![poacher]);
        assert!(!board.poachers.contains(poacher));
        assert_eq!(capital.balance, 1050);
        assert_eq!(board.rangers.get(ranger).unwrap().poachers_caught, 1);
        assert!(events.contains(&ParkEvent::PoacherCaught {
            ranger,
            poacher,
            bounty: config::POACHER_BOUNTY
        }));
    }

    #[test]
    fn distant_poacher_is_chased_not_caught() {
        let (mut board, mut capital, mut ai, mut rng) = setup(6);
        let ranger = board.spawn(Spawn::Ranger, vec2(5.0, 5.0)).unwrap().id;
        let poacher = board.spawn(Spawn::Poacher, vec2(5.0, 8.0)).unwrap().id;

        let tick = ai.update(
            &mut board,
            &mut capital,
            ctx(config::FIXED_DT, false),
            &mut rng,
            &mut Vec::new(),
        );

        assert!(tick.captured.is_empty());
        assert!(board.poachers.contains(poacher));
        assert_eq!(capital.balance, 1000);
        let r = board.rangers.get(ranger).unwrap();
        assert_eq!(r.chasing, Some(poacher));
        assert!(r.pos.y > 5.0 && r.pos.y < 5.1);
    }

    #[test]
    fn night_shortens_ranger_vision() {
        for (night, expect_chase) in [(false, true), (true, false)] {
            let (mut board, mut capital, mut ai, mut rng) = setup(2);
            let ranger = board.spawn(Spawn::Ranger, vec2(5.0, 5.0)).unwrap().id;
            let poacher = board.spawn(Spawn::Poacher, vec2(5.0, 9.0)).unwrap().id;
            ai.update(&mut board, &mut capital, ctx(0.1, night), &mut rng, &mut Vec::new());
            let chasing = board.rangers.get(ranger).unwrap().chasing;
            assert_eq!(chasing == Some(poacher), expect_chase, "night = {night}");
        }
    }

    #[test]
    fn poacher_kills_animal_in_range() {
        let (mut board, mut capital, mut ai, mut rng) = setup(3);
        let poacher = board.spawn(Spawn::Poacher, vec2(8.0, 8.0)).unwrap().id;
        board.poachers.get_mut(poacher).unwrap().hunt_cooldown = 0.0;
        let zebra = board
            .spawn(Spawn::Animal(Species::Zebra), vec2(8.6, 8.0))
            .unwrap()
            .id;

        let mut events: Vec<ParkEvent> = Vec::new();
        let tick = ai.update(&mut board, &mut capital, ctx(0.1, false), &mut rng, &mut events);

        assert_eq!(
            tick.poached,
            vec![Poaching {
                poacher,
                animal: zebra,
                species: Species::Zebra
            }]
        );
        assert!(!board.animals.contains(zebra));
        assert_eq!(board.poachers.get(poacher).unwrap().kills, 1);
        assert!(events.contains(&ParkEvent::AnimalPoached {
            poacher,
            animal: zebra,
            species: Species::Zebra
        }));
    }

    #[test]
    fn poachers_arrive_on_the_board_edge() {
        let (mut board, mut capital, mut ai, mut rng) = setup(4);
        let interval = Difficulty::Normal.poacher_interval();
        let mut events: Vec<ParkEvent> = Vec::new();
        ai.update(&mut board, &mut capital, ctx(interval, false), &mut rng, &mut events);

        assert_eq!(board.poachers.len(), 1);
        assert!(matches!(events[0], ParkEvent::PoacherSpawned { .. }));
    }

    #[test]
    fn unpaid_rangers_are_dismissed() {
        let (mut board, _, ai, _) = setup(5);
        let mut capital = Capital::new(200);
        let first = board.spawn(Spawn::Ranger, vec2(2.0, 2.0)).unwrap().id;
        let second = board.spawn(Spawn::Ranger, vec2(3.0, 2.0)).unwrap().id;

        let mut events: Vec<ParkEvent> = Vec::new();
        let dismissed = ai.pay_rangers(&mut board, &mut capital, &mut events);

        assert_eq!(dismissed, vec![second]);
        assert_eq!(capital.balance, 200 - config::RANGER_SALARY);
        assert!(board.rangers.contains(first));
        assert!(!board.rangers.contains(second));
        assert_eq!(events, vec![ParkEvent::RangerDismissed { ranger: second }]);
    }
}
