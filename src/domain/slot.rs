use super::vehicle::VehicleClass;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub Uuid);

impl SlotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A physical parking space.
///
/// Only the slot store flips `occupied`, and only on behalf of the parking
/// engine's entry and exit flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    /// The vehicle class this slot serves.
    pub class: VehicleClass,
    pub floor: u32,
    pub occupied: bool,
}

impl Slot {
    pub fn new(class: VehicleClass, floor: u32) -> Self {
        Self {
            id: SlotId::new(),
            class,
            floor,
            occupied: false,
        }
    }
}
