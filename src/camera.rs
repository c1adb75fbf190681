use macroquad::prelude::*;

use crate::config;
use crate::entity::EntityRef;

/// Pan/zoom view over the board. Positions are in tile units; zoom is
/// pixels per tile.
pub struct CameraController {
    pub target: Vec2,
    pub zoom: f32,
    pub smooth_target: Vec2,
    pub smooth_zoom: f32,
    is_dragging: bool,
    drag_start: Vec2,
    drag_cam_start: Vec2,
}

impl CameraController {
    pub fn new(initial_target: Vec2) -> Self {
        Self {
            target: initial_target,
            zoom: config::CAMERA_ZOOM_DEFAULT,
            smooth_target: initial_target,
            smooth_zoom: config::CAMERA_ZOOM_DEFAULT,
            is_dragging: false,
            drag_start: Vec2::ZERO,
            drag_cam_start: Vec2::ZERO,
        }
    }

    pub fn update(&mut self, dt: f32) {
        let pan_speed = config::CAMERA_PAN_SPEED / self.zoom;
        if is_key_down(KeyCode::W) || is_key_down(KeyCode::Up) {
            self.target.y -= pan_speed * dt;
        }
        if is_key_down(KeyCode::S) || is_key_down(KeyCode::Down) {
            self.target.y += pan_speed * dt;
        }
        if is_key_down(KeyCode::A) || is_key_down(KeyCode::Left) {
            self.target.x -= pan_speed * dt;
        }
        if is_key_down(KeyCode::D) || is_key_down(KeyCode::Right) {
            self.target.x += pan_speed * dt;
        }

        if is_mouse_button_pressed(MouseButton::Middle) {
            self.is_dragging = true;
            self.drag_start = Vec2::from(mouse_position());
            self.drag_cam_start = self.target;
        }
        if is_mouse_button_released(MouseButton::Middle) {
            self.is_dragging = false;
        }
        if self.is_dragging {
            let mouse_pos = Vec2::from(mouse_position());
            self.target = self.drag_cam_start + (self.drag_start - mouse_pos) / self.smooth_zoom;
        }

        let (_, scroll_y) = mouse_wheel();
        if scroll_y != 0.0 {
            let zoom_factor = 1.0 + scroll_y.signum() * config::CAMERA_ZOOM_SPEED;
            self.zoom = (self.zoom * zoom_factor).clamp(config::CAMERA_ZOOM_MIN, config::CAMERA_ZOOM_MAX);
        }

        let smooth = 1.0 - (-config::CAMERA_SMOOTH_SPEED * dt).exp();
        self.smooth_target = self.smooth_target.lerp(self.target, smooth);
        self.smooth_zoom += (self.zoom - self.smooth_zoom) * smooth;
    }

    pub fn to_macroquad_camera(&self) -> Camera2D {
        Camera2D {
            target: self.smooth_target,
            zoom: vec2(
                self.smooth_zoom / screen_width() * 2.0,
                -self.smooth_zoom / screen_height() * 2.0,
            ),
            ..Default::default()
        }
    }

    pub fn screen_to_world(&self, screen_pos: Vec2) -> Vec2 {
        self.screen_to_world_in(screen_pos, vec2(screen_width(), screen_height()))
    }

    /// Screen pixel to board position for a window of `screen` pixels.
    pub fn screen_to_world_in(&self, screen_pos: Vec2, screen: Vec2) -> Vec2 {
        self.smooth_target + (screen_pos - screen * 0.5) / self.smooth_zoom
    }

    /// Closest entity to `world_pos` within `max_dist` tiles.
    pub fn pick_entity(
        &self,
        world_pos: Vec2,
        entities: &[(EntityRef, Vec2)],
        max_dist: f32,
    ) -> Option<EntityRef> {
        entities
            .iter()
            .map(|&(entity, pos)| (entity, pos.distance_squared(world_pos)))
            .filter(|&(_, d)| d < max_dist * max_dist)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(entity, _)| entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, EntityKind};

    #[test]
    fn screen_center_maps_to_target() {
        let cam = CameraController::new(vec2(12.0, 8.0));
        let screen = vec2(1280.0, 800.0);
        assert_eq!(cam.screen_to_world_in(screen * 0.5, screen), vec2(12.0, 8.0));
        let right = cam.screen_to_world_in(vec2(640.0 + config::CAMERA_ZOOM_DEFAULT, 400.0), screen);
        assert!((right.x - 13.0).abs() < 1e-5);
    }

    #[test]
    fn pick_prefers_closest_in_range() {
        let cam = CameraController::new(Vec2::ZERO);
        let a = EntityRef::new(EntityKind::Animal, EntityId::new(0, 0));
        let b = EntityRef::new(EntityKind::Plant, EntityId::new(1, 0));
        let entities = [(a, vec2(1.0, 1.0)), (b, vec2(1.3, 1.0))];
        assert_eq!(cam.pick_entity(vec2(1.25, 1.0), &entities, 0.6), Some(b));
        assert_eq!(cam.pick_entity(vec2(5.0, 5.0), &entities, 0.6), None);
    }
}
