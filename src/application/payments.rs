use crate::domain::money::Amount;
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::ports::{GatewayRef, PaymentLedgerBox};
use crate::domain::ticket::TicketId;
use crate::error::{ParkingError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// The settled record of the attempt that went through.
    Succeeded { record: PaymentRecord, attempts: u32 },
    /// Every attempt was declined.
    Failed { attempts: u32 },
}

/// Drives payment attempts across an ordered list of gateways.
///
/// Attempt `n` (1-based) goes to `gateways[min(n - 1, len - 1)]`: the primary
/// first, then each fallback in turn, the last one serving every remaining
/// attempt. Every attempt appends its own ledger record.
pub struct PaymentOrchestrator {
    ledger: PaymentLedgerBox,
    gateways: Vec<GatewayRef>,
}

impl PaymentOrchestrator {
    /// # Errors
    ///
    /// `ParkingError::ValidationError` when `gateways` is empty.
    pub fn new(ledger: PaymentLedgerBox, gateways: Vec<GatewayRef>) -> Result<Self> {
        if gateways.is_empty() {
            return Err(ParkingError::ValidationError(
                "At least one payment gateway is required".to_string(),
            ));
        }
        Ok(Self { ledger, gateways })
    }

    pub fn ledger(&self) -> &PaymentLedgerBox {
        &self.ledger
    }

    /// The gateway serving attempt `attempt` (1-based).
    pub fn gateway_for_attempt(&self, attempt: u32) -> &GatewayRef {
        let index = (attempt.saturating_sub(1) as usize).min(self.gateways.len() - 1);
        &self.gateways[index]
    }

    pub async fn pay(
        &self,
        ticket_id: TicketId,
        amount: Amount,
        max_attempts: u32,
    ) -> Result<PaymentOutcome> {
        if max_attempts == 0 {
            return Err(ParkingError::ValidationError(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        for attempt in 1..=max_attempts {
            let gateway = self.gateway_for_attempt(attempt);
            let record = PaymentRecord::pending(ticket_id, amount, gateway.name());
            let payment_id = record.id;
            self.ledger.append(record).await?;

            tracing::info!(
                %ticket_id,
                %payment_id,
                gateway = gateway.name(),
                attempt,
                max_attempts,
                %amount,
                "payment attempt"
            );

            let approved = gateway.attempt(ticket_id, amount).await;
            let record = self.ledger.settle(payment_id, approved).await?;

            if record.status == PaymentStatus::Success {
                tracing::info!(
                    %ticket_id,
                    %payment_id,
                    gateway = %record.gateway,
                    attempt,
                    "payment succeeded"
                );
                return Ok(PaymentOutcome::Succeeded {
                    record,
                    attempts: attempt,
                });
            }

            if attempt < max_attempts {
                let next = self.gateway_for_attempt(attempt + 1);
                tracing::warn!(
                    %ticket_id,
                    %payment_id,
                    failed_gateway = gateway.name(),
                    next_gateway = next.name(),
                    attempt,
                    "payment declined, retrying"
                );
            }
        }

        tracing::warn!(%ticket_id, attempts = max_attempts, "payment failed on every attempt");
        Ok(PaymentOutcome::Failed {
            attempts: max_attempts,
        })
    }
}
