use crate::domain::vehicle::VehicleClass;
use crate::error::{ParkingError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Enter,
    Exit,
    Wait,
}

/// One row of a parking scenario.
///
/// `enter` needs a plate and a class, `exit` a plate, `wait` the number of
/// minutes to move the simulation clock forward.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ParkingEvent {
    pub action: EventAction,
    pub plate: Option<String>,
    pub class: Option<VehicleClass>,
    pub minutes: Option<i64>,
}

impl ParkingEvent {
    pub fn plate(&self) -> Result<&str> {
        self.plate
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ParkingError::ValidationError("Event is missing a plate".to_string()))
    }

    pub fn class(&self) -> Result<VehicleClass> {
        self.class.ok_or_else(|| {
            ParkingError::ValidationError("Event is missing a vehicle class".to_string())
        })
    }

    pub fn minutes(&self) -> Result<i64> {
        match self.minutes {
            Some(minutes) if minutes >= 0 => Ok(minutes),
            Some(_) => Err(ParkingError::ValidationError(
                "Wait minutes must not be negative".to_string(),
            )),
            None => Err(ParkingError::ValidationError(
                "Wait event is missing minutes".to_string(),
            )),
        }
    }
}

/// Reads parking events from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<ParkingEvent>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<ParkingEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ParkingError::from))
    }
}
