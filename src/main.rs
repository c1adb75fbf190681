use macroquad::prelude::*;

mod animal;
mod animal_ai;
mod board;
mod camera;
mod capital;
mod config;
mod entity;
mod error;
mod events;
mod flora;
mod grid;
mod jeep;
mod park;
mod people;
mod physics;
mod renderer;
mod road;
mod save_load;
mod spatial_hash;
mod tourism;
mod ui;
mod wildlife;

use camera::CameraController;
use config::ParkSettings;
use park::ParkSim;
use ui::{ToolMode, UiState};

const SAVE_PATH: &str = "wildpark_save.bin";

fn window_conf() -> Conf {
    Conf {
        window_title: "Wildpark".to_string(),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn board_center(sim: &ParkSim) -> Vec2 {
    vec2(sim.board.width() as f32, sim.board.height() as f32) * 0.5
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::args().nth(1) {
        Some(path) => match ParkSettings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}; using default settings");
                ParkSettings::default()
            }
        },
        None => ParkSettings::default(),
    };
    let mut sim = match ParkSim::new(&settings) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("could not build park: {e}");
            return;
        }
    };
    let mut camera = CameraController::new(board_center(&sim));
    let mut ui_state = UiState::default();
    let mut accumulator = 0.0f32;

    loop {
        let frame_time = get_frame_time();
        accumulator += frame_time.min(0.1);

        if !sim.paused {
            while accumulator >= config::FIXED_DT {
                sim.tick(config::FIXED_DT, &mut ui_state.feed);
                accumulator -= config::FIXED_DT;
            }
        } else {
            accumulator = 0.0;
        }

        camera.update(frame_time);

        let mut egui_wants_pointer = false;
        egui_macroquad::cfg(|ctx| {
            egui_wants_pointer = ctx.wants_pointer_input();
        });
        if !egui_wants_pointer && is_mouse_button_pressed(MouseButton::Left) {
            let pos = camera.screen_to_world(Vec2::from(mouse_position()));
            match ui_state.tool {
                ToolMode::Select => {
                    let entities = sim.board.entity_positions();
                    ui_state.selected = camera.pick_entity(pos, &entities, config::PICK_RADIUS);
                }
                ToolMode::Place(what) => {
                    if let Err(e) = sim.purchase(what, pos) {
                        log::warn!("purchase refused: {e}");
                        ui_state.feed.push(e.to_string());
                    }
                }
            }
        }

        if is_key_pressed(KeyCode::Escape) {
            ui_state.selected = None;
            ui_state.tool = ToolMode::Select;
        }
        if is_key_pressed(KeyCode::Space) {
            if sim.paused {
                sim.resume();
            } else {
                sim.pause();
            }
        }
        if is_key_pressed(KeyCode::N) {
            sim.toggle_day_night();
        }

        if is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl) {
            if is_key_pressed(KeyCode::S) {
                match save_load::save_to_file(&sim, SAVE_PATH) {
                    Ok(()) => log::info!("saved to {SAVE_PATH}"),
                    Err(e) => log::error!("{e}"),
                }
            }
            if is_key_pressed(KeyCode::L) {
                match save_load::load_from_file(SAVE_PATH) {
                    Ok(loaded) => {
                        sim = loaded;
                        camera = CameraController::new(board_center(&sim));
                        ui_state.selected = None;
                        log::info!("loaded {SAVE_PATH} (tick {})", sim.tick_count);
                    }
                    Err(e) => log::error!("{e}"),
                }
            }
        }

        renderer::draw(&sim, &camera, ui_state.selected);
        ui::draw_ui(&mut sim, &mut ui_state);

        next_frame().await;
    }
}
