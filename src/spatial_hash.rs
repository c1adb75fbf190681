use macroquad::prelude::Vec2;

use crate::entity::EntityRef;

/// A neighbor found by a radius query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub entity: EntityRef,
    pub pos: Vec2,
    pub dist_sq: f32,
}

/// Uniform grid of buckets over the board, rebuilt every tick.
pub struct SpatialHash {
    inv_cell_size: f32,
    pub cols: usize,
    pub rows: usize,
    cells: Vec<Vec<(EntityRef, Vec2)>>,
}

impl SpatialHash {
    pub fn new(board_w: f32, board_h: f32, cell_size: f32) -> Self {
        let cols = (board_w / cell_size).ceil().max(1.0) as usize;
        let rows = (board_h / cell_size).ceil().max(1.0) as usize;
        let cells = (0..cols * rows).map(|_| Vec::with_capacity(8)).collect();
        Self {
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            cells,
        }
    }

    fn cell_of(&self, pos: Vec2) -> (usize, usize) {
        let cx = ((pos.x.max(0.0) * self.inv_cell_size) as usize).min(self.cols - 1);
        let cy = ((pos.y.max(0.0) * self.inv_cell_size) as usize).min(self.rows - 1);
        (cx, cy)
    }

    /// Clear all cells and re-insert the given entities.
    pub fn rebuild(&mut self, entries: &[(EntityRef, Vec2)]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for &(entity, pos) in entries {
            let (cx, cy) = self.cell_of(pos);
            self.cells[cy * self.cols + cx].push((entity, pos));
        }
    }

    /// Everything within `radius` of `pos`, nearest first.
    pub fn query_radius(&self, pos: Vec2, radius: f32) -> Vec<Detection> {
        let mut result = Vec::new();
        let radius_sq = radius * radius;

        let cells_range = (radius * self.inv_cell_size).ceil() as i32 + 1;
        let (cx, cy) = self.cell_of(pos);
        let (cx, cy) = (cx as i32, cy as i32);

        for dy in -cells_range..=cells_range {
            for dx in -cells_range..=cells_range {
                let gx = cx + dx;
                let gy = cy + dy;
                if gx < 0 || gx >= self.cols as i32 || gy < 0 || gy >= self.rows as i32 {
                    continue;
                }
                for &(entity, other) in &self.cells[gy as usize * self.cols + gx as usize] {
                    let dist_sq = pos.distance_squared(other);
                    if dist_sq <= radius_sq {
                        result.push(Detection {
                            entity,
                            pos: other,
                            dist_sq,
                        });
                    }
                }
            }
        }

        result.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq));
        result
    }

    /// Query all entities within `radius` of `pos`, excluding one of them.
    pub fn query_radius_excluding(&self, pos: Vec2, radius: f32, exclude: EntityRef) -> Vec<Detection> {
        let mut result = self.query_radius(pos, radius);
        result.retain(|d| d.entity != exclude);
        result
    }
}
