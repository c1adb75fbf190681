pub mod toolbar;

use std::collections::VecDeque;

use crate::board::Spawn;
use crate::entity::EntityRef;
use crate::events::{FeedbackSink, LogSink, ParkEvent};
use crate::park::{Outcome, ParkSim};

const FEED_LEN: usize = 8;

/// What a left click on the board does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolMode {
    Select,
    Place(Spawn),
}

/// Recent park events for the status panel. Also logs them.
#[derive(Default)]
pub struct EventFeed {
    log: LogSink,
    recent: VecDeque<String>,
}

impl EventFeed {
    pub fn push(&mut self, message: String) {
        if self.recent.len() == FEED_LEN {
            self.recent.pop_front();
        }
        self.recent.push_back(message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.recent.iter().rev()
    }
}

impl FeedbackSink for EventFeed {
    fn play(&mut self, event: &ParkEvent) {
        self.log.play(event);
        self.push(event.to_string());
    }
}

pub struct UiState {
    pub tool: ToolMode,
    pub selected: Option<EntityRef>,
    pub feed: EventFeed,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tool: ToolMode::Select,
            selected: None,
            feed: EventFeed::default(),
        }
    }
}

/// Draw all egui UI panels.
pub fn draw_ui(sim: &mut ParkSim, ui_state: &mut UiState) {
    egui_macroquad::ui(|ctx| {
        toolbar::draw_toolbar(ctx, sim, ui_state);
        toolbar::draw_feed(ctx, &ui_state.feed);

        let banner = match sim.outcome() {
            Outcome::Playing => None,
            Outcome::Won => Some("The park thrives. You win!"),
            Outcome::Lost => Some("Bankrupt. Game over."),
        };
        if let Some(text) = banner {
            egui::Window::new("outcome")
                .title_bar(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.heading(text);
                });
        }
    });

    egui_macroquad::draw();
}
