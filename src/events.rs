use std::fmt;

use crate::animal::Species;
use crate::entity::EntityId;

/// Why an animal left the park.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathCause {
    OldAge,
    Starvation,
    Predator,
}

/// Something worth telling the player (or the audio layer) about.
#[derive(Clone, Debug, PartialEq)]
pub enum ParkEvent {
    AnimalBorn { animal: EntityId, species: Species },
    AnimalDied { animal: EntityId, species: Species, cause: DeathCause },
    AnimalPoached { poacher: EntityId, animal: EntityId, species: Species },
    PoacherSpawned { poacher: EntityId },
    PoacherCaught { ranger: EntityId, poacher: EntityId, bounty: i64 },
    RangerDismissed { ranger: EntityId },
    TouristsArrived { count: usize },
    TouristDeparted { tourist: EntityId, seen: usize, reward: i64 },
    BoardGrew { width: usize, height: usize },
    MonthClosed { month: u32, balance: i64 },
    Bankrupt,
}

impl fmt::Display for ParkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParkEvent::AnimalBorn { animal, species } => {
                write!(f, "A {} {animal} was born", species.name())
            }
            ParkEvent::AnimalDied {
                animal,
                species,
                cause,
            } => {
                let how = match cause {
                    DeathCause::OldAge => "of old age",
                    DeathCause::Starvation => "of hunger and thirst",
                    DeathCause::Predator => "to a predator",
                };
                write!(f, "{} {animal} died {how}", species.name())
            }
            ParkEvent::AnimalPoached {
                animal, species, ..
            } => write!(f, "{} {animal} was killed by a poacher", species.name()),
            ParkEvent::PoacherSpawned { poacher } => write!(f, "Poacher {poacher} sneaked in"),
            ParkEvent::PoacherCaught { ranger, bounty, .. } => {
                write!(f, "Ranger {ranger} caught a poacher (+${bounty})")
            }
            ParkEvent::RangerDismissed { ranger } => {
                write!(f, "Ranger {ranger} left: salary could not be paid")
            }
            ParkEvent::TouristsArrived { count } => write!(f, "{count} tourist(s) arrived"),
            ParkEvent::TouristDeparted { seen, reward, .. } => {
                write!(f, "Tourist saw {seen} animals -> ${reward}")
            }
            ParkEvent::BoardGrew { width, height } => {
                write!(f, "Park expanded to {width}x{height}")
            }
            ParkEvent::MonthClosed { month, balance } => {
                write!(f, "Month {month} closed with ${balance}")
            }
            ParkEvent::Bankrupt => write!(f, "The park is bankrupt"),
        }
    }
}

/// Consumer of park events: audio, notifications, logs. Delivery is
/// fire-and-forget; the simulation never depends on it.
pub trait FeedbackSink {
    fn play(&mut self, event: &ParkEvent);
}

impl FeedbackSink for Vec<ParkEvent> {
    fn play(&mut self, event: &ParkEvent) {
        self.push(event.clone());
    }
}

/// Writes every event to the log.
#[derive(Default)]
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn play(&mut self, event: &ParkEvent) {
        log::info!("{event}");
    }
}

/// Discards everything.
#[cfg(test)]
pub struct NullSink;

#[cfg(test)]
impl FeedbackSink for NullSink {
    fn play(&mut self, _event: &ParkEvent) {}
}
