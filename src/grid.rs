use macroquad::prelude::{vec2, Vec2};
use noise::{Fbm, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::entity::EntityRef;

/// Integer tile coordinate. Tile (x, y) covers [x, x+1) × [y, y+1) in world units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a world position.
    pub fn containing(pos: Vec2) -> Self {
        Self::new(pos.x.floor() as i32, pos.y.floor() as i32)
    }

    pub fn center(self) -> Vec2 {
        vec2(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    pub fn distance_sq(self, other: TilePos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// Terrain types with different properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Grass,
    Water,
    Hill,
    Forest,
    Road,
}

impl Terrain {
    pub fn is_obstacle(self) -> bool {
        matches!(self, Terrain::Hill)
    }

    fn from_noise(val: f64) -> Self {
        match val {
            v if v < -0.35 => Terrain::Water,
            v if v < 0.25 => Terrain::Grass,
            v if v < 0.45 => Terrain::Forest,
            _ => Terrain::Hill,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tile {
    pub pos: TilePos,
    pub terrain: Terrain,
    pub obstacle: bool,
    pub water_level: f32,
    #[serde(skip)]
    pub occupants: Vec<EntityRef>,
}

impl Tile {
    fn new(pos: TilePos, terrain: Terrain) -> Self {
        Self {
            pos,
            terrain,
            obstacle: terrain.is_obstacle(),
            water_level: if terrain == Terrain::Water { 0.0 } else { 1.0 },
            occupants: Vec::new(),
        }
    }

    pub fn set_terrain(&mut self, terrain: Terrain) {
        self.terrain = terrain;
        self.obstacle = terrain.is_obstacle();
    }

    /// Relax the water level toward its terrain's resting value.
    fn relax(&mut self, dt: f32) {
        let target = match self.terrain {
            Terrain::Grass => 1.0,
            Terrain::Water => 0.0,
            _ => return,
        };
        let step = (config::WATER_RELAX_RATE * dt).min(1.0);
        self.water_level = (self.water_level + (target - self.water_level) * step).clamp(0.0, 1.0);
    }
}

/// Tile grid covering the board. Rows are indexed by y; the grid only grows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
    seed: u32,
}

impl Grid {
    pub fn generate(width: usize, height: usize, seed: u32) -> Self {
        let fbm: Fbm<Perlin> = Fbm::new(seed);
        let rows = (0..height)
            .map(|y| (0..width).map(|x| sample_tile(&fbm, x, y)).collect())
            .collect();
        Self {
            rows,
            width,
            height,
            seed,
        }
    }

    /// Grid of plain grass, for deterministic setups.
    #[cfg(test)]
    pub fn flat(width: usize, height: usize) -> Self {
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| Tile::new(TilePos::new(x as i32, y as i32), Terrain::Grass))
                    .collect()
            })
            .collect();
        Self {
            rows,
            width,
            height,
            seed: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn contains_point(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < self.width as f32 && pos.y < self.height as f32
    }

    /// Clamp a world position to just inside the grid.
    pub fn clamp_point(&self, pos: Vec2) -> Vec2 {
        let max_x = self.width as f32 - 1e-3;
        let max_y = self.height as f32 - 1e-3;
        vec2(pos.x.clamp(0.0, max_x), pos.y.clamp(0.0, max_y))
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&self.rows[pos.y as usize][pos.x as usize])
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&mut self.rows[pos.y as usize][pos.x as usize])
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.rows.iter().flatten()
    }

    /// Append one column on the east edge.
    pub fn append_column(&mut self) {
        let fbm: Fbm<Perlin> = Fbm::new(self.seed);
        let x = self.width;
        for (y, row) in self.rows.iter_mut().enumerate() {
            row.push(sample_tile(&fbm, x, y));
        }
        self.width += 1;
    }

    /// Append one row on the south edge.
    pub fn append_row(&mut self) {
        let fbm: Fbm<Perlin> = Fbm::new(self.seed);
        let y = self.height;
        self.rows
            .push((0..self.width).map(|x| sample_tile(&fbm, x, y)).collect());
        self.height += 1;
    }

    pub fn relax_water(&mut self, dt: f32) {
        for tile in self.rows.iter_mut().flatten() {
            tile.relax(dt);
        }
    }

    pub fn clear_occupancy(&mut self) {
        for tile in self.rows.iter_mut().flatten() {
            tile.occupants.clear();
        }
    }

    pub fn occupy(&mut self, pos: Vec2, entity: EntityRef) {
        if let Some(tile) = self.tile_mut(TilePos::containing(pos)) {
            tile.occupants.push(entity);
        }
    }
}

fn sample_tile(fbm: &Fbm<Perlin>, x: usize, y: usize) -> Tile {
    let nx = x as f64 * config::TERRAIN_NOISE_SCALE;
    let ny = y as f64 * config::TERRAIN_NOISE_SCALE;
    let terrain = Terrain::from_noise(fbm.get([nx, ny]));
    Tile::new(TilePos::new(x as i32, y as i32), terrain)
}
