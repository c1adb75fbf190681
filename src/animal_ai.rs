use macroquad::prelude::{vec2, Vec2};
use ::rand::Rng;
use std::collections::HashSet;

use crate::animal::{Animal, AnimalState, Diet};
use crate::board::Board;
use crate::config;
use crate::entity::{EntityId, EntityKind};
use crate::events::{DeathCause, FeedbackSink, ParkEvent};
use crate::grid::TilePos;
use crate::physics::{self, DetectionMap};
use crate::spatial_hash::Detection;

/// Births and deaths produced by one animal pass.
#[derive(Debug, Default)]
pub struct AnimalTick {
    pub born: Vec<EntityId>,
    pub died: Vec<(EntityId, DeathCause)>,
}

/// Drives every animal: needs, detection, state machine, movement,
/// collisions, reproduction and the death sweep.
#[derive(Debug, Default)]
pub struct AnimalAi {
    detections: DetectionMap,
}

impl AnimalAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Neighbors seen by `id` during the last update, nearest first.
    pub fn detections(&self, id: EntityId) -> &[Detection] {
        self.detections.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn update(
        &mut self,
        board: &mut Board,
        dt: f32,
        rng: &mut impl Rng,
        sink: &mut dyn FeedbackSink,
    ) -> AnimalTick {
        for (_, animal) in board.animals.iter_mut() {
            animal.tick(dt);
        }

        let spatial = physics::index_board(board);
        self.detections = physics::detect_all(board, &spatial);

        let mut ids: Vec<EntityId> = self.detections.keys().copied().collect();
        ids.sort_unstable();

        let mut eaten = Vec::new();
        for &id in &ids {
            if let Some(prey) = self.think(board, id, dt, rng) {
                eaten.push(prey);
            }
        }

        for &id in &ids {
            move_animal(board, id, dt, rng);
        }
        let moved = physics::detect_all(board, &physics::index_board(board));
        physics::process_collisions(board, &moved);

        let born = breed(board, sink);
        let died = sweep_dead(board, &eaten, sink);
        for (id, _) in &died {
            self.detections.remove(id);
        }
        AnimalTick { born, died }
    }

    /// Run one step of the behavior state machine. Returns the prey killed,
    /// if any.
    fn think(&self, board: &mut Board, id: EntityId, dt: f32, rng: &mut impl Rng) -> Option<EntityId> {
        let seen = self.detections(id);
        let animal = board.animals.get_mut(id).filter(|a| a.alive)?;

        animal.state = next_state(animal);
        match animal.state {
            AnimalState::Wandering => None,
            AnimalState::SeekingWater => {
                let pond = nearest(seen, EntityKind::Pond, |_| true);
                match pond {
                    Some(d) if d.dist_sq <= config::INTERACTION_RANGE.powi(2) => {
                        animal.state = AnimalState::Drinking;
                        animal.target = None;
                    }
                    Some(d) => animal.target = Some(d.pos),
                    None => explore(animal, rng),
                }
                None
            }
            AnimalState::Drinking => {
                animal.add_thirst(-config::DRINK_RATE * dt);
                if animal.thirst < config::NEED_THRESHOLD {
                    animal.state = AnimalState::Wandering;
                }
                None
            }
            AnimalState::SeekingFood => match animal.diet() {
                Diet::Herbivore => {
                    let plants = &board.plants;
                    let plant = nearest(seen, EntityKind::Plant, |d| {
                        plants.get(d.entity.id).is_some_and(|p| p.has_food())
                    });
                    match plant {
                        Some(d) if d.dist_sq <= config::INTERACTION_RANGE.powi(2) => {
                            animal.state = AnimalState::Eating;
                            animal.target = None;
                        }
                        Some(d) => animal.target = Some(d.pos),
                        None => explore(animal, rng),
                    }
                    None
                }
                Diet::Carnivore => {
                    let animals = &board.animals;
                    let prey = nearest(seen, EntityKind::Animal, |d| {
                        animals
                            .get(d.entity.id)
                            .is_some_and(|a| a.alive && a.diet() == Diet::Herbivore)
                    })
                    .copied();
                    match prey {
                        Some(d) if d.dist_sq <= config::INTERACTION_RANGE.powi(2) => {
                            let (hunter, prey) = board.animals.pair_mut(id, d.entity.id)?;
                            hunter.consume(prey);
                            hunter.state = AnimalState::Wandering;
                            hunter.target = None;
                            return Some(d.entity.id);
                        }
                        Some(d) => {
                            if let Some(hunter) = board.animals.get_mut(id) {
                                hunter.target = Some(d.pos);
                            }
                        }
                        None => {
                            if let Some(hunter) = board.animals.get_mut(id) {
                                explore(hunter, rng);
                            }
                        }
                    }
                    None
                }
            },
            AnimalState::Eating => {
                let plant_id = nearest(seen, EntityKind::Plant, |d| {
                    d.dist_sq <= config::INTERACTION_RANGE.powi(2)
                })
                .map(|d| d.entity.id);
                let eaten = plant_id
                    .and_then(|pid| board.plants.get_mut(pid))
                    .map(|plant| plant.consume_from(config::GRAZE_RATE * dt))
                    .unwrap_or(0.0);
                animal.add_hunger(-eaten);
                if eaten <= 0.0 || animal.hunger < config::NEED_THRESHOLD {
                    animal.state = AnimalState::Wandering;
                }
                None
            }
        }
    }
}

/// Thirst outranks hunger; an animal already drinking or eating keeps at it.
fn next_state(animal: &Animal) -> AnimalState {
    let thirsty = animal.thirst >= config::NEED_THRESHOLD;
    let hungry = animal.hunger >= config::NEED_THRESHOLD;
    match animal.state {
        AnimalState::Drinking | AnimalState::SeekingWater => animal.state,
        AnimalState::Eating if !thirsty => AnimalState::Eating,
        _ if thirsty => AnimalState::SeekingWater,
        _ if hungry => AnimalState::SeekingFood,
        _ => AnimalState::Wandering,
    }
}

fn nearest<'a>(
    seen: &'a [Detection],
    kind: EntityKind,
    accept: impl Fn(&Detection) -> bool,
) -> Option<&'a Detection> {
    seen.iter().find(|d| d.entity.kind == kind && accept(d))
}

/// Head somewhere new when nothing useful is in sight.
fn explore(animal: &mut Animal, rng: &mut impl Rng) {
    if animal.target.is_none() {
        animal.target = Some(wander_point(animal.pos, rng));
    }
}

fn wander_point(from: Vec2, rng: &mut impl Rng) -> Vec2 {
    let r = config::WANDER_RANGE;
    from + vec2(rng.gen_range(-r..=r), rng.gen_range(-r..=r))
}

fn move_animal(board: &mut Board, id: EntityId, dt: f32, rng: &mut impl Rng) {
    let grid = &board.grid;
    let Some(animal) = board.animals.get_mut(id).filter(|a| a.alive) else {
        return;
    };
    if matches!(animal.state, AnimalState::Drinking | AnimalState::Eating) {
        return;
    }
    if animal.target.is_none() && animal.state == AnimalState::Wandering {
        let candidate = grid.clamp_point(wander_point(animal.pos, rng));
        let blocked = grid
            .tile(TilePos::containing(candidate))
            .is_some_and(|t| t.obstacle);
        if !blocked {
            animal.target = Some(candidate);
        }
    }
    if animal.step_toward_target(dt) {
        animal.target = None;
    }
    animal.pos = grid.clamp_point(animal.pos);
}

/// Pairwise scan for mates. Each parent breeds at most once per pass.
fn breed(board: &mut Board, sink: &mut dyn FeedbackSink) -> Vec<EntityId> {
    let living: Vec<EntityId> = board
        .animals
        .iter()
        .filter(|(_, a)| a.alive)
        .map(|(id, _)| id)
        .collect();
    let mut population = living.len();
    let mut used: HashSet<EntityId> = HashSet::new();
    let mut children: Vec<Animal> = Vec::new();

    for (i, &a_id) in living.iter().enumerate() {
        for &b_id in &living[i + 1..] {
            if population >= config::MAX_ANIMALS {
                break;
            }
            if used.contains(&a_id) || used.contains(&b_id) {
                continue;
            }
            let (Some(a), Some(b)) = (board.animals.get(a_id), board.animals.get(b_id)) else {
                continue;
            };
            if a.reproduce_cooldown > 0.0 || b.reproduce_cooldown > 0.0 {
                continue;
            }
            if a.pos.distance(b.pos) > config::DETECTION_RADIUS {
                continue;
            }
            if let Some(child) = a.reproduce(b, a_id) {
                children.push(child);
                used.insert(a_id);
                used.insert(b_id);
                population += 1;
            }
        }
    }

    for id in &used {
        if let Some(parent) = board.animals.get_mut(*id) {
            parent.reproduce_cooldown = config::REPRODUCE_COOLDOWN;
        }
    }

    let mut born = Vec::with_capacity(children.len());
    for mut child in children {
        let species = child.species;
        let id = board.animals.spawn_with(|id| {
            child.id = id;
            child
        });
        sink.play(&ParkEvent::AnimalBorn { animal: id, species });
        born.push(id);
    }
    born
}

/// Remove every animal that died this pass.
fn sweep_dead(
    board: &mut Board,
    eaten: &[EntityId],
    sink: &mut dyn FeedbackSink,
) -> Vec<(EntityId, DeathCause)> {
    let dead: Vec<EntityId> = board
        .animals
        .iter()
        .filter(|(_, a)| !a.alive)
        .map(|(id, _)| id)
        .collect();

    let mut died = Vec::with_capacity(dead.len());
    for id in dead {
        let Some(animal) = board.animals.despawn(id) else {
            continue;
        };
        let cause = if eaten.contains(&id) {
            DeathCause::Predator
        } else if animal.age >= animal.lifespan as f32 {
            DeathCause::OldAge
        } else {
            DeathCause::Starvation
        };
        sink.play(&ParkEvent::AnimalDied {
            animal: id,
            species: animal.species,
            cause,
        });
        died.push((id, cause));
    }
    died
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::Species;
    use crate::board::Spawn;
    use crate::events::NullSink;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup(seed: u64) -> (Board, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let board = Board::flat(16, 16, &mut rng);
        (board, rng)
    }

    fn spawn_animal(board: &mut Board, species: Species, pos: Vec2) -> EntityId {
        board.spawn(Spawn::Animal(species), pos).unwrap().id
    }

    #[test]
    fn thirst_wins_over_hunger() {
        let (mut board, mut rng) = setup(1);
        let zebra = spawn_animal(&mut board, Species::Zebra, vec2(8.0, 8.0));
        {
            let z = board.animals.get_mut(zebra).unwrap();
            z.hunger = 8.0;
            z.thirst = 8.0;
        }
        let mut ai = AnimalAi::new();
        ai.update(&mut board, 0.1, &mut rng, &mut NullSink);
        assert_eq!(board.animals.get(zebra).unwrap().state, AnimalState::SeekingWater);
    }

    #[test]
    fn thirsty_animal_walks_to_pond_and_drinks() {
        let (mut board, mut rng) = setup(2);
        let zebra = spawn_animal(&mut board, Species::Zebra, vec2(5.0, 8.0));
        board.spawn(Spawn::Pond, vec2(7.5, 8.0)).unwrap();
        board.animals.get_mut(zebra).unwrap().thirst = 8.0;

        let mut ai = AnimalAi::new();
        let mut drank = false;
        for _ in 0..200 {
            ai.update(&mut board, 0.1, &mut rng, &mut NullSink);
            let z = board.animals.get(zebra).unwrap();
            drank |= z.state == AnimalState::Drinking;
            if drank && z.state == AnimalState::Wandering {
                break;
            }
        }
        let z = board.animals.get(zebra).unwrap();
        assert!(drank);
        assert!(z.thirst < config::NEED_THRESHOLD);
    }

    #[test]
    fn hungry_herbivore_grazes_the_plant_down() {
        let (mut board, mut rng) = setup(3);
        let gazelle = spawn_animal(&mut board, Species::Gazelle, vec2(8.0, 8.0));
        let plant = board.spawn(Spawn::Plant, vec2(8.6, 8.0)).unwrap().id;
        board.animals.get_mut(gazelle).unwrap().hunger = 9.0;

        let mut ai = AnimalAi::new();
        for _ in 0..30 {
            ai.update(&mut board, 0.1, &mut rng, &mut NullSink);
        }
        assert!(board.animals.get(gazelle).unwrap().hunger < config::NEED_THRESHOLD);
        assert!(board.plants.get(plant).unwrap().nutrition < config::PLANT_MAX_NUTRITION);
    }

    #[test]
    fn carnivore_kills_nearby_herbivore() {
        let (mut board, mut rng) = setup(4);
        let lion = spawn_animal(&mut board, Species::Lion, vec2(8.0, 8.0));
        let zebra = spawn_animal(&mut board, Species::Zebra, vec2(8.7, 8.0));
        board.animals.get_mut(lion).unwrap().hunger = 8.0;

        let mut ai = AnimalAi::new();
        let mut events: Vec<ParkEvent> = Vec::new();
        let tick = ai.update(&mut board, 0.1, &mut rng, &mut events);

        assert_eq!(tick.died, vec![(zebra, DeathCause::Predator)]);
        assert!(!board.animals.contains(zebra));
        assert!(board.animals.get(lion).unwrap().hunger < 1.0);
        assert!(events
            .iter()
            .any(|e| matches!(e, ParkEvent::AnimalDied { cause: DeathCause::Predator, .. })));
    }

    #[test]
    fn adults_off_cooldown_breed_once() {
        let (mut board, mut rng) = setup(5);
        let a = spawn_animal(&mut board, Species::Zebra, vec2(6.0, 8.0));
        let b = spawn_animal(&mut board, Species::Zebra, vec2(7.0, 8.0));
        let giraffe = spawn_animal(&mut board, Species::Giraffe, vec2(6.5, 9.0));
        for id in [a, b, giraffe] {
            let animal = board.animals.get_mut(id).unwrap();
            animal.age = animal.lifespan as f32 * 0.6;
            animal.reproduce_cooldown = 0.0;
        }

        let mut ai = AnimalAi::new();
        let tick = ai.update(&mut board, 0.1, &mut rng, &mut NullSink);
        assert_eq!(tick.born.len(), 1);
        let child = board.animals.get(tick.born[0]).unwrap();
        assert_eq!(child.species, Species::Zebra);
        assert_eq!(child.age, 0.0);
        assert_eq!(board.animals.get(a).unwrap().reproduce_cooldown, config::REPRODUCE_COOLDOWN);
        assert_eq!(board.animals.get(giraffe).unwrap().reproduce_cooldown, 0.0);

        let again = ai.update(&mut board, 0.1, &mut rng, &mut NullSink);
        assert!(again.born.is_empty());
    }

    #[test]
    fn old_animals_are_swept_with_cause() {
        let (mut board, mut rng) = setup(6);
        let old = spawn_animal(&mut board, Species::Gazelle, vec2(4.0, 4.0));
        {
            let animal = board.animals.get_mut(old).unwrap();
            animal.age = animal.lifespan as f32 - 0.05;
        }
        let mut ai = AnimalAi::new();
        let tick = ai.update(&mut board, 0.1, &mut rng, &mut NullSink);
        assert_eq!(tick.died, vec![(old, DeathCause::OldAge)]);
        assert!(board.animals.is_empty());
        assert!(ai.detections(old).is_empty());
    }

    #[test]
    fn movement_never_ends_inside_another_entity() {
        let (mut board, mut rng) = setup(8);
        let zebra = spawn_animal(&mut board, Species::Zebra, vec2(5.0, 5.0));
        let plant = board.spawn(Spawn::Plant, vec2(5.7, 5.0)).unwrap().id;
        board.animals.get_mut(zebra).unwrap().target = Some(vec2(5.7, 5.0));

        let mut ai = AnimalAi::new();
        ai.update(&mut board, 0.5, &mut rng, &mut NullSink);

        let z = board.animals.get(zebra).unwrap();
        let p = board.plants.get(plant).unwrap();
        assert!(z.pos.distance(p.pos) >= config::ENTITY_RADIUS * 2.0 - 1e-4);
        assert!(z.target.is_none());
    }

    #[test]
    fn detections_are_exposed_nearest_first() {
        let (mut board, mut rng) = setup(7);
        let me = spawn_animal(&mut board, Species::Elephant, vec2(8.0, 8.0));
        let far = board.spawn(Spawn::Plant, vec2(11.0, 8.0)).unwrap();
        let near = board.spawn(Spawn::Pond, vec2(9.0, 8.0)).unwrap();
        let mut ai = AnimalAi::new();
        ai.update(&mut board, 0.01, &mut rng, &mut NullSink);
        let seen: Vec<_> = ai.detections(me).iter().map(|d| d.entity).collect();
        let near_idx = seen.iter().position(|e| *e == near).unwrap();
        let far_idx = seen.iter().position(|e| *e == far).unwrap();
        assert!(near_idx < far_idx);
    }
}
