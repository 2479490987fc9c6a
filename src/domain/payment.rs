use super::money::Amount;
use super::ticket::TicketId;
use crate::error::ParkingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        })
    }
}

/// One payment attempt against one gateway.
///
/// Records are appended per attempt and never merged; the status leaves
/// `Pending` exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub ticket_id: TicketId,
    pub amount: Amount,
    pub gateway: String,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn pending(ticket_id: TicketId, amount: Amount, gateway: impl Into<String>) -> Self {
        Self {
            id: PaymentId::new(),
            ticket_id,
            amount,
            gateway: gateway.into(),
            status: PaymentStatus::Pending,
        }
    }

    /// Moves a pending record to its final status.
    pub fn settle(&mut self, succeeded: bool) -> Result<(), ParkingError> {
        if self.status != PaymentStatus::Pending {
            return Err(ParkingError::InvariantViolation(format!(
                "Payment {} already settled as {}",
                self.id, self.status
            )));
        }
        self.status = if succeeded {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        };
        Ok(())
    }
}
