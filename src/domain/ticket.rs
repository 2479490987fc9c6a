use super::slot::SlotId;
use super::vehicle::VehicleClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParkingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub Uuid);

impl TicketId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TicketId {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| ParkingError::ValidationError(format!("Invalid ticket id: {e}")))
    }
}

/// Lifecycle of a ticket.
///
/// `CheckingOut` is a claim held by exactly one exit flow while the fee is
/// charged. The ticket still counts as active: its slot stays occupied until
/// the claim either completes (`Exited`) or is abandoned (`Active`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Active,
    CheckingOut,
    Exited,
}

/// One vehicle's parking session, from entry to exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub plate: String,
    pub class: VehicleClass,
    pub slot_id: SlotId,
    pub entry_time: DateTime<Utc>,
    pub status: TicketStatus,
}

impl Ticket {
    pub fn issue(
        plate: impl Into<String>,
        class: VehicleClass,
        slot_id: SlotId,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TicketId::new(),
            plate: plate.into(),
            class,
            slot_id,
            entry_time,
            status: TicketStatus::Active,
        }
    }

    /// True until the exit has been paid for.
    pub fn is_active(&self) -> bool {
        self.status != TicketStatus::Exited
    }
}

/// Result of trying to claim a ticket for checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum ExitClaim {
    Claimed(Ticket),
    NotFound,
    AlreadyExited,
    InProgress,
}
