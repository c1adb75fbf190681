use egui;

use super::{EventFeed, ToolMode, UiState};
use crate::animal::Species;
use crate::board::Spawn;
use crate::config::{self, Difficulty};
use crate::entity::{EntityKind, EntityRef};
use crate::park::{self, ParkSim};

/// Slim status strip + compact controls.
pub fn draw_toolbar(ctx: &egui::Context, sim: &mut ParkSim, ui_state: &mut UiState) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.add_space(3.0);
        ui.horizontal_wrapped(|ui| {
            title_badge(ui, "WILDPARK");

            ui.separator();
            compact_group(ui, "Sim", |ui| {
                let pause_label = if sim.paused { "Play" } else { "Pause" };
                if ui.button(pause_label).clicked() {
                    if sim.paused {
                        sim.resume();
                    } else {
                        sim.pause();
                    }
                }
                let day_label = if sim.is_night() { "Day" } else { "Night" };
                if ui.button(day_label).clicked() {
                    sim.toggle_day_night();
                }
            });

            compact_group(ui, "Speed", |ui| {
                for (level, speed) in config::SPEED_LEVELS.iter().enumerate() {
                    let selected = sim.speed_level() == level;
                    if ui.selectable_label(selected, format!("{speed}x")).clicked() {
                        sim.set_time_speed(level);
                    }
                }
            });

            compact_group(ui, "Difficulty", |ui| {
                for (level, difficulty) in Difficulty::ALL.iter().enumerate() {
                    let selected = sim.difficulty == *difficulty;
                    if ui.selectable_label(selected, difficulty.label()).clicked() {
                        sim.set_difficulty(level as u8);
                    }
                }
            });
        });

        ui.horizontal_wrapped(|ui| {
            compact_group(ui, "Buy", |ui| {
                tool_button(ui, ui_state, ToolMode::Select, "Select".to_string());
                for spawn in [Spawn::Plant, Spawn::Pond, Spawn::Jeep, Spawn::Ranger] {
                    tool_button(ui, ui_state, ToolMode::Place(spawn), priced_label(spawn));
                }
                ui.separator();
                for species in Species::ALL {
                    let spawn = Spawn::Animal(species);
                    tool_button(ui, ui_state, ToolMode::Place(spawn), priced_label(spawn));
                }
            });
        });

        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            let board = &sim.board;
            let (carnivores, herbivores) = board.diet_counts();
            metric_chip(ui, "Funds", format!("${}", sim.capital.balance));
            metric_chip(
                ui,
                "Last month",
                format!(
                    "+{} / -{}",
                    sim.capital.last_month_income, sim.capital.last_month_expense
                ),
            );
            metric_chip(ui, "Month", format!("{}", sim.clock.months + 1));
            metric_chip(ui, "Carnivores", format!("{carnivores}"));
            metric_chip(ui, "Herbivores", format!("{herbivores}"));
            metric_chip(ui, "Tourists", format!("{}", board.tourists.len()));
            metric_chip(ui, "Rangers", format!("{}", board.rangers.len()));
            metric_chip(ui, "Board", format!("{}x{}", board.width(), board.height()));
            metric_chip(
                ui,
                "Time",
                if sim.is_night() { "Night" } else { "Day" }.to_string(),
            );
            if board.poachers.iter().any(|(_, p)| p.visible) {
                status_chip(ui, "POACHER SPOTTED", egui::Color32::from_rgb(220, 80, 70));
            }
            if let Some(selected) = ui_state.selected {
                metric_chip(ui, "Selected", describe(sim, selected));
            }
        });
        ui.add_space(3.0);
    });
}

/// Recent events, newest first.
pub fn draw_feed(ctx: &egui::Context, feed: &EventFeed) {
    egui::Window::new("Events")
        .anchor(egui::Align2::RIGHT_BOTTOM, [-8.0, -8.0])
        .resizable(false)
        .show(ctx, |ui| {
            for line in feed.iter() {
                ui.label(egui::RichText::new(line).small());
            }
        });
}

fn priced_label(spawn: Spawn) -> String {
    let name = match spawn {
        Spawn::Animal(species) => species.name(),
        Spawn::Plant => "Plant",
        Spawn::Pond => "Pond",
        Spawn::Jeep => "Jeep",
        Spawn::Ranger => "Ranger",
        Spawn::Tourist => "Tourist",
        Spawn::Poacher => "Poacher",
    };
    match park::price(spawn) {
        Some(cost) => format!("{name} ${cost}"),
        None => name.to_string(),
    }
}

fn describe(sim: &ParkSim, entity: EntityRef) -> String {
    let board = &sim.board;
    match entity.kind {
        EntityKind::Animal => board.animals.get(entity.id).map(|a| {
            format!(
                "{} {} age {:.0}/{} hunger {:.1} thirst {:.1} {:?}",
                a.species.name(),
                entity.id,
                a.age,
                a.lifespan,
                a.hunger,
                a.thirst,
                a.state
            )
        }),
        EntityKind::Plant => board
            .plants
            .get(entity.id)
            .map(|p| format!("Plant {:.1}/{:.0}", p.nutrition, p.max_nutrition)),
        EntityKind::Pond => board.ponds.get(entity.id).map(|_| "Pond".to_string()),
        EntityKind::Jeep => board
            .jeeps
            .get(entity.id)
            .map(|j| format!("Jeep {} riders {}", entity.id, j.passengers.len())),
        EntityKind::Tourist => board
            .tourists
            .get(entity.id)
            .map(|t| format!("Tourist saw {}", t.seen_animals.len())),
        EntityKind::Ranger => board
            .rangers
            .get(entity.id)
            .map(|r| format!("Ranger {} caught {}", entity.id, r.poachers_caught)),
        EntityKind::Poacher => board
            .poachers
            .get(entity.id)
            .map(|p| format!("Poacher kills {}", p.kills)),
    }
    .unwrap_or_else(|| "gone".to_string())
}

fn tool_button(ui: &mut egui::Ui, ui_state: &mut UiState, mode: ToolMode, label: String) {
    let selected = ui_state.tool == mode;
    if ui.selectable_label(selected, label).clicked() {
        ui_state.tool = mode;
    }
}

fn title_badge(ui: &mut egui::Ui, label: &str) {
    let text = egui::RichText::new(label)
        .strong()
        .color(egui::Color32::from_rgb(230, 200, 120));
    ui.label(text);
}

fn compact_group(ui: &mut egui::Ui, heading: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(heading)
                    .small()
                    .color(egui::Color32::from_rgb(150, 170, 185)),
            );
            add_contents(ui);
        });
    });
}

fn metric_chip(ui: &mut egui::Ui, key: &str, value: String) {
    let text = egui::RichText::new(format!("{key}: {value}"))
        .small()
        .color(egui::Color32::from_rgb(205, 215, 225));
    ui.group(|ui| {
        ui.label(text);
    });
}

fn status_chip(ui: &mut egui::Ui, label: &str, color: egui::Color32) {
    ui.group(|ui| {
        ui.label(egui::RichText::new(label).small().strong().color(color));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_show_prices_for_purchasable_things() {
        assert_eq!(priced_label(Spawn::Plant), format!("Plant ${}", config::PLANT_PRICE));
        assert_eq!(
            priced_label(Spawn::Animal(Species::Lion)),
            format!("Lion ${}", Species::Lion.value())
        );
        assert_eq!(priced_label(Spawn::Poacher), "Poacher");
    }
}
