use macroquad::prelude::{vec2, Vec2};
use ::rand::seq::SliceRandom;
use ::rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::animal::{Animal, Diet, Species};
use crate::config;
use crate::entity::{EntityArena, EntityId, EntityKind, EntityRef};
use crate::error::ParkError;
use crate::flora::{Plant, Pond};
use crate::grid::{Grid, Terrain, TilePos};
use crate::jeep::Jeep;
use crate::people::{Poacher, Ranger, Tourist};
use crate::road::RoadGraph;

/// What to put on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spawn {
    Animal(Species),
    Plant,
    Pond,
    Jeep,
    Tourist,
    Ranger,
    Poacher,
}

impl Spawn {
    pub fn kind(self) -> EntityKind {
        match self {
            Spawn::Animal(_) => EntityKind::Animal,
            Spawn::Plant => EntityKind::Plant,
            Spawn::Pond => EntityKind::Pond,
            Spawn::Jeep => EntityKind::Jeep,
            Spawn::Tourist => EntityKind::Tourist,
            Spawn::Ranger => EntityKind::Ranger,
            Spawn::Poacher => EntityKind::Poacher,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Entrance,
    Exit,
}

/// A jeep reached the end of a leg this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JeepArrival {
    pub jeep: EntityId,
    pub gate: Gate,
}

/// Growth that happened during one `Board::update`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoardTick {
    pub columns_added: u32,
    pub rows_added: u32,
}

impl BoardTick {
    pub fn grew(&self) -> bool {
        self.columns_added > 0 || self.rows_added > 0
    }
}

/// The park: tile grid, road network and every entity collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    pub grid: Grid,
    pub roads: RoadGraph,
    pub entrance: TilePos,
    pub exit: TilePos,
    pub animals: EntityArena<Animal>,
    pub plants: EntityArena<Plant>,
    pub ponds: EntityArena<Pond>,
    pub jeeps: EntityArena<Jeep>,
    pub tourists: EntityArena<Tourist>,
    pub rangers: EntityArena<Ranger>,
    pub poachers: EntityArena<Poacher>,
    #[serde(skip)]
    arrivals: Vec<JeepArrival>,
}

impl Board {
    /// Noise terrain plus an entrance-to-exit road through a few random bends.
    pub fn new(width: usize, height: usize, rng: &mut impl Rng) -> Self {
        let grid = Grid::generate(width, height, rng.gen());
        Self::with_grid(grid, rng)
    }

    /// All-grass board, for deterministic setups.
    #[cfg(test)]
    pub fn flat(width: usize, height: usize, rng: &mut impl Rng) -> Self {
        Self::with_grid(Grid::flat(width, height), rng)
    }

    fn with_grid(grid: Grid, rng: &mut impl Rng) -> Self {
        let (w, h) = (grid.width() as i32, grid.height() as i32);
        let entrance = TilePos::new(0, interior_coord(h, rng));
        let exit = TilePos::new(w - 1, interior_coord(h, rng));

        let mut board = Self {
            grid,
            roads: RoadGraph::new(),
            entrance,
            exit,
            animals: EntityArena::new(),
            plants: EntityArena::new(),
            ponds: EntityArena::new(),
            jeeps: EntityArena::new(),
            tourists: EntityArena::new(),
            rangers: EntityArena::new(),
            poachers: EntityArena::new(),
            arrivals: Vec::new(),
        };

        let interior_x: Vec<i32> = (1..w - 1).collect();
        let bend_count = rng.gen_range(2..=3).min(interior_x.len());
        let mut bend_x: Vec<i32> = interior_x
            .choose_multiple(rng, bend_count)
            .copied()
            .collect();
        bend_x.sort_unstable();

        let mut waypoints = vec![entrance];
        for x in bend_x {
            waypoints.push(TilePos::new(x, interior_coord(h, rng)));
        }
        waypoints.push(exit);
        for pair in waypoints.windows(2) {
            board.lay_road(pair[0], pair[1]);
        }
        board
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn lay_road(&mut self, a: TilePos, b: TilePos) {
        for pos in self.roads.lay_segment(a, b) {
            if let Some(tile) = self.grid.tile_mut(pos) {
                tile.set_terrain(Terrain::Road);
            }
        }
    }

    /// Jeeps that finished a leg during the last update.
    pub fn arrivals(&self) -> &[JeepArrival] {
        &self.arrivals
    }

    pub fn gate_position(&self, gate: Gate) -> Vec2 {
        match gate {
            Gate::Entrance => self.entrance.center(),
            Gate::Exit => self.exit.center(),
        }
    }

    /// Place an entity. Positions outside the grid are rejected.
    pub fn spawn(&mut self, what: Spawn, pos: Vec2) -> Result<EntityRef, ParkError> {
        if !self.grid.contains_point(pos) {
            return Err(ParkError::OutOfBounds {
                x: pos.x.floor() as i32,
                y: pos.y.floor() as i32,
            });
        }
        let id = match what {
            Spawn::Animal(species) => self
                .animals
                .spawn_with(|id| Animal::new(id, species, pos)),
            Spawn::Plant => self.plants.spawn_with(|id| Plant::new(id, pos)),
            Spawn::Pond => {
                if let Some(tile) = self.grid.tile_mut(TilePos::containing(pos)) {
                    if tile.terrain != Terrain::Road {
                        tile.set_terrain(Terrain::Water);
                    }
                }
                self.ponds.spawn_with(|id| Pond::new(id, pos))
            }
            Spawn::Jeep => self.jeeps.spawn_with(|id| Jeep::new(id, pos)),
            Spawn::Tourist => self.tourists.spawn_with(|id| Tourist::new(id, pos)),
            Spawn::Ranger => self.rangers.spawn_with(|id| Ranger::new(id, pos)),
            Spawn::Poacher => self.poachers.spawn_with(|id| Poacher::new(id, pos)),
        };
        Ok(EntityRef::new(what.kind(), id))
    }

    /// Advance jeeps, plants and terrain, then grow the board if a jeep is
    /// close to the east or south edge.
    pub fn update(&mut self, dt: f32) -> BoardTick {
        self.arrivals.clear();
        self.grid.relax_water(dt);
        for (_, plant) in self.plants.iter_mut() {
            plant.regrow(dt);
        }

        for id in self.jeeps.ids() {
            if let Err(e) = self.update_jeep(id, dt) {
                log::warn!("jeep {id} skipped this tick: {e}");
            }
        }

        self.grow_near_jeeps()
    }

    fn update_jeep(&mut self, id: EntityId, dt: f32) -> Result<(), ParkError> {
        let (entrance, exit) = (self.entrance, self.exit);
        let Some(jeep) = self.jeeps.get_mut(id) else {
            return Ok(());
        };

        if !jeep.path_finished() {
            jeep.advance(dt);
            jeep.pos = self.grid.clamp_point(jeep.pos);
            return Ok(());
        }

        let target = if jeep.returning { entrance } else { exit };
        if jeep.pos.distance(target.center()) <= config::JEEP_ARRIVAL_EPSILON {
            let gate = if jeep.returning {
                Gate::Entrance
            } else {
                Gate::Exit
            };
            jeep.returning = !jeep.returning;
            self.arrivals.push(JeepArrival { jeep: id, gate });
        }

        let goal = if jeep.returning { entrance } else { exit };
        let path = self.roads.find_path(TilePos::containing(jeep.pos), goal)?;
        if path.is_empty() {
            log::debug!("jeep {id} has no route to {goal:?}, staying put");
        }
        jeep.set_path(path);
        Ok(())
    }

    fn grow_near_jeeps(&mut self) -> BoardTick {
        let (w, h) = (self.width(), self.height());
        let mut grow_x = false;
        let mut grow_y = false;
        for (_, jeep) in self.jeeps.iter() {
            let tile = TilePos::containing(jeep.pos);
            grow_x |= tile.x >= w as i32 - config::GROWTH_MARGIN;
            grow_y |= tile.y >= h as i32 - config::GROWTH_MARGIN;
        }
        grow_x &= w < config::MAX_BOARD_WIDTH;
        grow_y &= h < config::MAX_BOARD_HEIGHT;

        let mut tick = BoardTick::default();
        if grow_x {
            self.grid.append_column();
            let old_exit = self.exit;
            self.exit = TilePos::new(self.width() as i32 - 1, old_exit.y);
            self.lay_road(old_exit, self.exit);
            tick.columns_added = 1;
        }
        if grow_y {
            self.grid.append_row();
            tick.rows_added = 1;
        }
        if tick.grew() {
            log::debug!("board grew to {}x{}", self.width(), self.height());
        }
        tick
    }

    /// Rebuild per-tile occupancy from current entity positions.
    pub fn refresh_occupancy(&mut self) {
        self.grid.clear_occupancy();
        for (entity, pos) in self.entity_positions() {
            self.grid.occupy(pos, entity);
        }
    }

    /// Every tracked entity with its position.
    pub fn entity_positions(&self) -> Vec<(EntityRef, Vec2)> {
        let mut out = Vec::new();
        out.extend(
            self.animals
                .iter()
                .filter(|(_, a)| a.alive)
                .map(|(id, a)| (EntityRef::new(EntityKind::Animal, id), a.pos)),
        );
        out.extend(self.plants.iter().map(|(id, p)| (EntityRef::new(EntityKind::Plant, id), p.pos)));
        out.extend(self.ponds.iter().map(|(id, p)| (EntityRef::new(EntityKind::Pond, id), p.pos)));
        out.extend(self.jeeps.iter().map(|(id, j)| (EntityRef::new(EntityKind::Jeep, id), j.pos)));
        out.extend(
            self.tourists
                .iter()
                .filter(|(_, t)| t.jeep.is_none())
                .map(|(id, t)| (EntityRef::new(EntityKind::Tourist, id), t.pos)),
        );
        out.extend(self.rangers.iter().map(|(id, r)| (EntityRef::new(EntityKind::Ranger, id), r.pos)));
        out.extend(
            self.poachers
                .iter()
                .filter(|(_, p)| !p.captured)
                .map(|(id, p)| (EntityRef::new(EntityKind::Poacher, id), p.pos)),
        );
        out
    }

    pub fn random_point(&self, rng: &mut impl Rng) -> Vec2 {
        vec2(
            rng.gen_range(0.0..self.width() as f32),
            rng.gen_range(0.0..self.height() as f32),
        )
    }

    /// Random point along one randomly chosen board edge.
    pub fn random_edge_point(&self, rng: &mut impl Rng) -> Vec2 {
        let (w, h) = (self.width() as f32, self.height() as f32);
        let along_x = rng.gen_range(0.0..w);
        let along_y = rng.gen_range(0.0..h);
        let pos = match rng.gen_range(0..4) {
            0 => vec2(along_x, 0.0),
            1 => vec2(along_x, h),
            2 => vec2(0.0, along_y),
            _ => vec2(w, along_y),
        };
        self.grid.clamp_point(pos)
    }

    /// (carnivores, herbivores) currently alive.
    pub fn diet_counts(&self) -> (usize, usize) {
        self.animals
            .iter()
            .filter(|(_, a)| a.alive)
            .fold((0, 0), |(c, h), (_, a)| match a.diet() {
                Diet::Carnivore => (c + 1, h),
                Diet::Herbivore => (c, h + 1),
            })
    }

    pub fn distinct_species(&self) -> usize {
        self.animals
            .iter()
            .filter(|(_, a)| a.alive)
            .map(|(_, a)| a.species)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Random coordinate away from both edges of an axis of length `len`.
fn interior_coord(len: i32, rng: &mut impl Rng) -> i32 {
    if len > 2 {
        rng.gen_range(1..len - 1)
    } else {
        0
    }
}
