use macroquad::prelude::{vec2, Vec2};
use std::collections::HashMap;

use crate::board::Board;
use crate::config;
use crate::entity::{EntityId, EntityKind, EntityRef};
use crate::spatial_hash::{Detection, SpatialHash};

/// Per-animal neighbor lists, nearest first.
pub type DetectionMap = HashMap<EntityId, Vec<Detection>>;

/// An overlap that was pushed apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    pub animal: EntityId,
    pub other: EntityRef,
    pub depth: f32,
}

/// Build a spatial hash over every tracked entity on the board.
pub fn index_board(board: &Board) -> SpatialHash {
    let mut spatial = SpatialHash::new(
        board.width() as f32,
        board.height() as f32,
        config::SPATIAL_CELL_SIZE,
    );
    spatial.rebuild(&board.entity_positions());
    spatial
}

/// Everything within the detection radius of each living animal.
pub fn detect_all(board: &Board, spatial: &SpatialHash) -> DetectionMap {
    board
        .animals
        .iter()
        .filter(|(_, a)| a.alive)
        .map(|(id, a)| {
            let me = EntityRef::new(EntityKind::Animal, id);
            (id, spatial.query_radius_excluding(a.pos, config::DETECTION_RADIUS, me))
        })
        .collect()
}

fn current_position(board: &Board, entity: EntityRef) -> Option<Vec2> {
    match entity.kind {
        EntityKind::Animal => board.animals.get(entity.id).filter(|a| a.alive).map(|a| a.pos),
        EntityKind::Plant => board.plants.get(entity.id).map(|p| p.pos),
        EntityKind::Pond => board.ponds.get(entity.id).map(|p| p.pos),
        EntityKind::Jeep => board.jeeps.get(entity.id).map(|j| j.pos),
        EntityKind::Tourist => board.tourists.get(entity.id).map(|t| t.pos),
        EntityKind::Ranger => board.rangers.get(entity.id).map(|r| r.pos),
        EntityKind::Poacher => board.poachers.get(entity.id).map(|p| p.pos),
    }
}

/// Push each animal out of anything it overlaps, by exactly the penetration
/// depth, and drop its movement target so it re-plans next tick.
/// `detections` should be taken after this tick's movement.
pub fn process_collisions(board: &mut Board, detections: &DetectionMap) -> Vec<Collision> {
    let min_dist = config::ENTITY_RADIUS * 2.0;
    let mut collisions = Vec::new();

    let mut ids: Vec<&EntityId> = detections.keys().collect();
    ids.sort_unstable();

    for &animal_id in ids {
        for detection in &detections[&animal_id] {
            // Earlier pushes may have moved either side, so judge on current positions.
            let Some(other_pos) = current_position(board, detection.entity) else {
                continue;
            };
            let Some(animal) = board.animals.get_mut(animal_id) else {
                break;
            };
            if !animal.alive {
                break;
            }

            let delta = animal.pos - other_pos;
            let dist = delta.length();
            if dist >= min_dist {
                continue;
            }
            let dir = if dist > config::COLLISION_EPSILON {
                delta / dist
            } else {
                vec2(1.0, 0.0)
            };
            let depth = min_dist - dist;
            animal.pos += dir * depth;
            animal.target = None;
            collisions.push(Collision {
                animal: animal_id,
                other: detection.entity,
                depth,
            });
        }
        if let Some(animal) = board.animals.get_mut(animal_id) {
            animal.pos = board.grid.clamp_point(animal.pos);
        }
    }

    collisions
}
