use macroquad::prelude::Vec2;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::entity::EntityId;

/// Safari jeep shuttling between the entrance and the exit along the road.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Jeep {
    pub id: EntityId,
    #[serde(with = "crate::save_load::serde_vec2")]
    pub pos: Vec2,
    pub speed: f32,
    #[serde(with = "crate::save_load::serde_vec2::vec")]
    pub path: Vec<Vec2>,
    pub waypoint: usize,
    /// True while driving back toward the entrance.
    pub returning: bool,
    pub heading: f32,
    pub passengers: Vec<EntityId>,
    pub available: bool,
}

impl Jeep {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            speed: config::JEEP_SPEED,
            path: Vec::new(),
            waypoint: 0,
            returning: false,
            heading: 0.0,
            passengers: Vec::new(),
            available: true,
        }
    }

    pub fn has_room(&self) -> bool {
        self.passengers.len() < config::JEEP_CAPACITY
    }

    pub fn path_finished(&self) -> bool {
        self.waypoint >= self.path.len()
    }

    pub fn set_path(&mut self, path: Vec<Vec2>) {
        self.available = path.is_empty();
        self.path = path;
        self.waypoint = 0;
    }

    pub fn board(&mut self, tourist: EntityId) -> bool {
        if !self.has_room() || self.passengers.contains(&tourist) {
            return false;
        }
        self.passengers.push(tourist);
        true
    }

    /// Drive along the path at constant speed, passing through as many
    /// waypoints as this step covers.
    pub fn advance(&mut self, dt: f32) {
        let mut budget = self.speed * dt;
        while budget > 0.0 && !self.path_finished() {
            let target = self.path[self.waypoint];
            let delta = target - self.pos;
            let dist = delta.length();
            if dist > 1e-6 {
                self.heading = delta.y.atan2(delta.x);
            }
            if dist <= budget {
                self.pos = target;
                budget -= dist;
                self.waypoint += 1;
            } else {
                self.pos += delta / dist * budget;
                budget = 0.0;
            }
        }
        if self.path_finished() {
            self.available = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::prelude::vec2;

    #[test]
    fn advance_walks_waypoints_in_order_and_becomes_available() {
        let mut jeep = Jeep::new(EntityId::new(0, 0), vec2(0.5, 0.5));
        jeep.set_path(vec![vec2(0.5, 0.5), vec2(1.5, 0.5), vec2(2.5, 0.5)]);
        assert!(!jeep.available);

        let mut last = jeep.waypoint;
        for _ in 0..20 {
            jeep.advance(0.1);
            assert!(jeep.waypoint >= last);
            last = jeep.waypoint;
        }
        assert!(jeep.path_finished());
        assert!(jeep.available);
        assert_eq!(jeep.pos, vec2(2.5, 0.5));
    }

    #[test]
    fn capacity_is_four() {
        let mut jeep = Jeep::new(EntityId::new(0, 0), vec2(0.5, 0.5));
        for i in 0..4 {
            assert!(jeep.board(EntityId::new(i, 0)));
        }
        assert!(!jeep.board(EntityId::new(7, 0)));
        assert!(!jeep.has_room());
    }
}
