use macroquad::prelude::vec2;
use ::rand::seq::SliceRandom;
use ::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Gate, Spawn};
use crate::capital::Capital;
use crate::config;
use crate::entity::EntityId;
use crate::events::{FeedbackSink, ParkEvent};
use crate::people::step_toward;

/// How interesting the park looks from outside: carnivores count double.
pub fn attraction_score(board: &Board) -> f32 {
    let (carnivores, herbivores) = board.diet_counts();
    (2 * carnivores + herbivores) as f32
}

/// Seconds between tourist batches for a given attraction score.
pub fn spawn_interval(score: f32) -> f32 {
    (config::TOURIST_BASE_INTERVAL / (1.0 + score / config::ATTRACTION_SCALE))
        .clamp(config::TOURIST_MIN_INTERVAL, config::TOURIST_BASE_INTERVAL)
}

/// Tourists per batch, by number of distinct living species.
pub fn batch_size(distinct_species: usize) -> usize {
    match distinct_species {
        0..=3 => 1,
        4..=5 => 2,
        _ => 3,
    }
}

#[derive(Debug, Default)]
pub struct TouristTick {
    pub arrived: usize,
    pub turned_away: usize,
    pub departed: Vec<(EntityId, i64)>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TouristAi {
    pub spawn_timer: f32,
    pub turned_away: u32,
}

impl TouristAi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        board: &mut Board,
        capital: &mut Capital,
        dt: f32,
        rng: &mut impl Rng,
        sink: &mut dyn FeedbackSink,
    ) -> TouristTick {
        let mut tick = TouristTick::default();

        self.spawn_timer += dt;
        let interval = spawn_interval(attraction_score(board));
        if self.spawn_timer >= interval {
            self.spawn_timer -= interval;
            self.spawn_batch(board, rng, &mut tick);
            if tick.arrived > 0 {
                sink.play(&ParkEvent::TouristsArrived {
                    count: tick.arrived,
                });
            }
        }

        assign_jeeps(board, rng);
        sightsee(board);
        disembark_at_exit(board);
        roam(board, dt);

        let done: Vec<EntityId> = board
            .tourists
            .iter()
            .filter(|(_, t)| t.is_done())
            .map(|(id, _)| id)
            .collect();
        for id in done {
            let Some(tourist) = board.tourists.despawn(id) else {
                continue;
            };
            let reward = tourist.reward();
            capital.add_funds(reward);
            sink.play(&ParkEvent::TouristDeparted {
                tourist: id,
                seen: tourist.seen_animals.len(),
                reward,
            });
            tick.departed.push((id, reward));
        }
        tick
    }

    fn spawn_batch(&mut self, board: &mut Board, rng: &mut impl Rng, tick: &mut TouristTick) {
        let mut waiting = board.tourists.iter().filter(|(_, t)| t.is_waiting()).count();
        let entrance = board.gate_position(Gate::Entrance);
        let j = config::TOURIST_SPAWN_JITTER;

        for _ in 0..batch_size(board.distinct_species()) {
            if waiting >= config::TOURIST_QUEUE_CAPACITY {
                self.turned_away += 1;
                tick.turned_away += 1;
                continue;
            }
            let jitter = vec2(rng.gen_range(-j..=j), rng.gen_range(-j..=j));
            let pos = board.grid.clamp_point(entrance + jitter);
            match board.spawn(Spawn::Tourist, pos) {
                Ok(_) => {
                    waiting += 1;
                    tick.arrived += 1;
                }
                Err(e) => log::warn!("could not admit tourist: {e}"),
            }
        }
        if tick.turned_away > 0 {
            log::debug!("queue full, {} tourist(s) turned away", tick.turned_away);
        }
    }
}

/// Seat waiting tourists on any moving jeep with a free seat.
fn assign_jeeps(board: &mut Board, rng: &mut impl Rng) {
    let mut waiting: Vec<EntityId> = board
        .tourists
        .iter()
        .filter(|(_, t)| t.is_waiting())
        .map(|(id, _)| id)
        .collect();
    if waiting.is_empty() {
        return;
    }
    waiting.sort_unstable();

    let mut jeeps = board.jeeps.ids();
    jeeps.shuffle(rng);

    for tourist_id in waiting {
        let seat = jeeps.iter().copied().find(|&jid| {
            board
                .jeeps
                .get(jid)
                .is_some_and(|j| j.has_room() && !j.path_finished())
        });
        let Some(jeep_id) = seat else {
            break;
        };
        let boarded = board
            .jeeps
            .get_mut(jeep_id)
            .is_some_and(|jeep| jeep.board(tourist_id));
        if let (true, Some(tourist)) = (boarded, board.tourists.get_mut(tourist_id)) {
            tourist.jeep = Some(jeep_id);
        }
    }
}

/// Riders move with their jeep and note every animal in sight.
fn sightsee(board: &mut Board) {
    let radius_sq = config::TOURIST_SIGHT_RADIUS * config::TOURIST_SIGHT_RADIUS;
    for (_, tourist) in board.tourists.iter_mut() {
        let Some(jeep) = tourist.jeep.and_then(|jid| board.jeeps.get(jid)) else {
            continue;
        };
        tourist.pos = jeep.pos;
        for (animal_id, animal) in board.animals.iter() {
            if animal.alive && animal.pos.distance_squared(tourist.pos) <= radius_sq {
                tourist.seen_animals.insert(animal_id);
            }
        }
    }
}

fn disembark_at_exit(board: &mut Board) {
    let exit = board.gate_position(Gate::Exit);
    let arrived: Vec<EntityId> = board
        .arrivals()
        .iter()
        .filter(|a| a.gate == Gate::Exit)
        .map(|a| a.jeep)
        .collect();

    for jeep_id in arrived {
        let Some(jeep) = board.jeeps.get_mut(jeep_id) else {
            continue;
        };
        for tourist_id in std::mem::take(&mut jeep.passengers) {
            if let Some(tourist) = board.tourists.get_mut(tourist_id) {
                tourist.disembark(exit);
            }
        }
    }

    // Riders whose jeep vanished get off where they are.
    for (_, tourist) in board.tourists.iter_mut() {
        if tourist.jeep.is_some_and(|jid| !board.jeeps.contains(jid)) {
            tourist.disembark(tourist.pos);
        }
    }
}

fn roam(board: &mut Board, dt: f32) {
    for (_, tourist) in board.tourists.iter_mut() {
        if !tourist.roaming {
            continue;
        }
        tourist.timer -= dt;
        if let Some(target) = tourist.exit_target {
            step_toward(&mut tourist.pos, target, config::TOURIST_SPEED * dt);
        }
        tourist.pos = board.grid.clamp_point(tourist.pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn interval_shrinks_with_attraction_within_bounds() {
        assert_eq!(spawn_interval(0.0), config::TOURIST_BASE_INTERVAL);
        assert_eq!(spawn_interval(10_000.0), config::TOURIST_MIN_INTERVAL);
        let mut last = f32::MAX;
        for score in 0..100 {
            let i = spawn_interval(score as f32);
            assert!(i <= last);
            assert!((config::TOURIST_MIN_INTERVAL..=config::TOURIST_BASE_INTERVAL).contains(&i));
            last = i;
        }
    }

    #[test]
    fn batch_size_tracks_species_variety() {
        let sizes: Vec<usize> = (0..8).map(batch_size).collect();
        assert_eq!(sizes, vec![1, 1, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn done_tourist_pays_base_plus_per_animal() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut board = Board::flat(10, 10, &mut rng);
        let mut capital = Capital::new(1000);
        let id = board.spawn(Spawn::Tourist, vec2(5.0, 5.0)).unwrap().id;
        {
            let t = board.tourists.get_mut(id).unwrap();
            for i in 1..=3 {
                t.seen_animals.insert(EntityId::new(i, 0));
            }
            t.roaming = true;
            t.timer = 0.0;
        }

        let mut ai = TouristAi::new();
        let mut events: Vec<ParkEvent> = Vec::new();
        let tick = ai.update(&mut board, &mut capital, 0.1, &mut rng, &mut events);

        assert_eq!(tick.departed, vec![(id, 290)]);
        assert_eq!(capital.balance, 1290);
        assert!(!board.tourists.contains(id));
        assert!(events.contains(&ParkEvent::TouristDeparted {
            tourist: id,
            seen: 3,
            reward: 290
        }));
    }

    #[test]
    fn full_queue_turns_tourists_away() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut board = Board::flat(10, 10, &mut rng);
        let mut capital = Capital::new(0);
        let entrance = board.gate_position(Gate::Entrance);
        for _ in 0..config::TOURIST_QUEUE_CAPACITY {
            board.spawn(Spawn::Tourist, entrance).unwrap();
        }
        let mut ai = TouristAi::new();
        ai.spawn_timer = config::TOURIST_BASE_INTERVAL;
        let tick = ai.update(&mut board, &mut capital, 0.1, &mut rng, &mut Vec::new());
        assert_eq!(tick.arrived, 0);
        assert_eq!(tick.turned_away, 1);
        assert_eq!(board.tourists.len(), config::TOURIST_QUEUE_CAPACITY);
    }

    #[test]
    fn waiting_tourists_fill_a_moving_jeep() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut board = Board::flat(12, 10, &mut rng);
        let entrance = board.gate_position(Gate::Entrance);
        let jeep = board.spawn(Spawn::Jeep, entrance).unwrap().id;
        board.update(0.01);
        assert!(!board.jeeps.get(jeep).unwrap().path_finished());

        for _ in 0..5 {
            board.spawn(Spawn::Tourist, entrance).unwrap();
        }
        let mut ai = TouristAi::new();
        let mut capital = Capital::new(0);
        ai.update(&mut board, &mut capital, 0.01, &mut rng, &mut Vec::new());

        assert_eq!(board.jeeps.get(jeep).unwrap().passengers.len(), config::JEEP_CAPACITY);
        let waiting = board.tourists.iter().filter(|(_, t)| t.is_waiting()).count();
        assert_eq!(waiting, 1);
    }

    #[test]
    fn rider_tours_then_pays_after_roaming() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut board = Board::flat(12, 10, &mut rng);
        let entrance = board.gate_position(Gate::Entrance);
        board.spawn(Spawn::Jeep, entrance).unwrap();
        board.update(0.01);
        let rider = board.spawn(Spawn::Tourist, entrance).unwrap().id;

        let mut ai = TouristAi::new();
        let mut capital = Capital::new(0);
        let mut paid = None;
        for _ in 0..40_000 {
            board.update(0.05);
            let tick = ai.update(&mut board, &mut capital, 0.05, &mut rng, &mut Vec::new());
            if let Some(&(_, reward)) = tick.departed.iter().find(|(id, _)| *id == rider) {
                paid = Some(reward);
                break;
            }
        }
        assert_eq!(paid, Some(config::TOURIST_BASE_REWARD));
        assert!(capital.balance >= config::TOURIST_BASE_REWARD);
    }
}
