use macroquad::prelude::*;

use crate::animal::{Diet, Species};
use crate::camera::CameraController;
use crate::config;
use crate::entity::EntityRef;
use crate::grid::{Grid, Terrain};
use crate::park::ParkSim;

const BG_COLOR: Color = Color::new(0.05, 0.07, 0.05, 1.0);
const ROAD_COLOR: Color = Color::new(0.62, 0.55, 0.42, 1.0);
const PLANT_COLOR: Color = Color::new(0.30, 0.75, 0.25, 1.0);
const POND_COLOR: Color = Color::new(0.20, 0.45, 0.85, 1.0);
const JEEP_COLOR: Color = Color::new(0.85, 0.70, 0.15, 1.0);
const TOURIST_COLOR: Color = Color::new(0.95, 0.55, 0.75, 1.0);
const RANGER_COLOR: Color = Color::new(0.10, 0.40, 0.20, 1.0);
const POACHER_COLOR: Color = Color::new(0.80, 0.10, 0.10, 1.0);
const SELECT_COLOR: Color = Color::new(1.0, 1.0, 1.0, 0.9);

fn terrain_color(terrain: Terrain, water_level: f32) -> Color {
    match terrain {
        Terrain::Grass => Color::new(
            0.45 - 0.15 * water_level,
            0.60 + 0.10 * water_level,
            0.25,
            1.0,
        ),
        Terrain::Water => Color::new(0.15, 0.35, 0.70, 1.0),
        Terrain::Hill => Color::new(0.50, 0.42, 0.30, 1.0),
        Terrain::Forest => Color::new(0.12, 0.38, 0.15, 1.0),
        Terrain::Road => ROAD_COLOR,
    }
}

fn species_color(species: Species) -> Color {
    match species {
        Species::Lion => Color::new(0.85, 0.60, 0.20, 1.0),
        Species::Leopard => Color::new(0.90, 0.75, 0.30, 1.0),
        Species::Hyena => Color::new(0.55, 0.45, 0.35, 1.0),
        Species::Zebra => Color::new(0.95, 0.95, 0.95, 1.0),
        Species::Giraffe => Color::new(0.95, 0.80, 0.40, 1.0),
        Species::Elephant => Color::new(0.55, 0.55, 0.60, 1.0),
        Species::Gazelle => Color::new(0.80, 0.55, 0.35, 1.0),
    }
}

/// Draw the board and everything on it, then the day/night overlay.
pub fn draw(sim: &ParkSim, camera: &CameraController, selected: Option<EntityRef>) {
    clear_background(BG_COLOR);
    set_camera(&camera.to_macroquad_camera());

    let board = &sim.board;
    draw_grid(&board.grid);

    let r = config::ENTITY_RADIUS;
    for (_, pond) in board.ponds.iter() {
        draw_circle(pond.pos.x, pond.pos.y, r * 1.6, POND_COLOR);
    }
    for (_, plant) in board.plants.iter() {
        let fill = (plant.nutrition / plant.max_nutrition).clamp(0.2, 1.0);
        draw_circle(plant.pos.x, plant.pos.y, r * fill, PLANT_COLOR);
    }
    for (_, animal) in board.animals.iter().filter(|(_, a)| a.alive) {
        draw_circle(animal.pos.x, animal.pos.y, r, species_color(animal.species));
        if animal.diet() == Diet::Carnivore {
            draw_circle_lines(animal.pos.x, animal.pos.y, r, 0.05, BLACK);
        }
    }
    for (_, jeep) in board.jeeps.iter() {
        draw_rectangle_ex(
            jeep.pos.x,
            jeep.pos.y,
            0.7,
            0.4,
            DrawRectangleParams {
                offset: vec2(0.5, 0.5),
                rotation: jeep.heading,
                color: JEEP_COLOR,
            },
        );
    }
    for (_, tourist) in board.tourists.iter().filter(|(_, t)| t.jeep.is_none()) {
        draw_circle(tourist.pos.x, tourist.pos.y, r * 0.5, TOURIST_COLOR);
    }
    for (_, ranger) in board.rangers.iter() {
        draw_circle(ranger.pos.x, ranger.pos.y, r, RANGER_COLOR);
        draw_circle_lines(
            ranger.pos.x,
            ranger.pos.y,
            ranger.vision,
            0.03,
            Color::new(0.2, 0.8, 0.3, 0.25),
        );
    }
    for (_, poacher) in board.poachers.iter().filter(|(_, p)| !p.captured) {
        let alpha = if poacher.visible || !sim.is_night() { 1.0 } else { 0.3 };
        let mut color = POACHER_COLOR;
        color.a = alpha;
        draw_circle(poacher.pos.x, poacher.pos.y, r, color);
    }

    if let Some(selected) = selected {
        if let Some((_, pos)) = board
            .entity_positions()
            .into_iter()
            .find(|(e, _)| *e == selected)
        {
            draw_circle_lines(pos.x, pos.y, r * 1.8, 0.05, SELECT_COLOR);
        }
    }

    draw_night_overlay(&board.grid, sim.day_phase());
    set_default_camera();
}

fn draw_grid(grid: &Grid) {
    for tile in grid.tiles() {
        draw_rectangle(
            tile.pos.x as f32,
            tile.pos.y as f32,
            1.0,
            1.0,
            terrain_color(tile.terrain, tile.water_level),
        );
    }
}

/// Darken the board through the second half of the day.
fn draw_night_overlay(grid: &Grid, phase: f32) {
    let darkness = (-(phase * std::f32::consts::TAU).sin()).max(0.0) * 0.5;
    if darkness <= 0.0 {
        return;
    }
    draw_rectangle(
        0.0,
        0.0,
        grid.width() as f32,
        grid.height() as f32,
        Color::new(0.02, 0.02, 0.10, darkness),
    );
}
