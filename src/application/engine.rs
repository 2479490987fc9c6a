use super::fees::{FeeCalculator, FeeQuote};
use super::payments::{PaymentOrchestrator, PaymentOutcome};
use crate::domain::money::Amount;
use crate::domain::payment::{PaymentId, PaymentRecord, PaymentStatus};
use crate::domain::ports::{ClockRef, SlotStoreBox, TicketStoreBox};
use crate::domain::pricing::PricingRule;
use crate::domain::slot::{Slot, SlotId};
use crate::domain::ticket::{ExitClaim, Ticket, TicketId};
use crate::domain::vehicle::VehicleClass;
use crate::error::{ParkingError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_MAX_PAYMENT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Admitted(Ticket),
    NoSlotAvailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitOutcome {
    Exited(ExitReceipt),
    TicketNotFound,
    AlreadyExited,
    /// Another exit flow is charging this ticket right now.
    ExitInProgress,
    /// Every payment attempt was declined. The ticket stays active and the
    /// slot stays occupied, so the exit can be retried.
    PaymentFailed { fee: Amount, attempts: u32 },
}

/// Read-only view of a completed exit, enough to render a receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitReceipt {
    pub ticket_id: TicketId,
    pub plate: String,
    pub class: VehicleClass,
    pub slot_id: SlotId,
    pub floor: Option<u32>,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub billed_hours: u32,
    pub fee: Amount,
    pub payment_id: PaymentId,
    pub gateway: String,
    pub payment_status: PaymentStatus,
    pub payment_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStatus {
    pub class: VehicleClass,
    pub available: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityStatus {
    pub classes: Vec<ClassStatus>,
    pub active_tickets: usize,
}

/// Result of charging a claimed ticket.
enum Charge {
    Paid {
        quote: FeeQuote,
        record: PaymentRecord,
        attempts: u32,
        exit_time: DateTime<Utc>,
    },
    Declined {
        fee: Amount,
        attempts: u32,
    },
}

/// The allocation and billing engine of a parking facility.
///
/// Entry reserves a slot and then issues a ticket bound to it. Exit claims the
/// ticket, prices it, charges it, and only after a successful payment closes
/// the ticket and frees the slot. No store lock is held while a gateway is
/// being called: the claim on the ticket is what keeps a second exit from
/// charging it twice.
pub struct ParkingEngine {
    slots: SlotStoreBox,
    tickets: TicketStoreBox,
    fees: FeeCalculator,
    payments: PaymentOrchestrator,
    clock: ClockRef,
    max_payment_attempts: u32,
}

impl ParkingEngine {
    /// Creates a new `ParkingEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `slots` - Slot inventory and occupancy.
    /// * `tickets` - Ticket records.
    /// * `fees` - Fee calculator over the pricing table.
    /// * `payments` - Payment orchestrator over the ledger and gateways.
    /// * `clock` - Source of entry and exit timestamps.
    pub fn new(
        slots: SlotStoreBox,
        tickets: TicketStoreBox,
        fees: FeeCalculator,
        payments: PaymentOrchestrator,
        clock: ClockRef,
    ) -> Self {
        Self {
            slots,
            tickets,
            fees,
            payments,
            clock,
            max_payment_attempts: DEFAULT_MAX_PAYMENT_ATTEMPTS,
        }
    }

    /// # Errors
    ///
    /// `ParkingError::ValidationError` when `attempts` is zero.
    pub fn with_max_payment_attempts(mut self, attempts: u32) -> Result<Self> {
        if attempts == 0 {
            return Err(ParkingError::ValidationError(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        self.max_payment_attempts = attempts;
        Ok(self)
    }

    pub fn max_payment_attempts(&self) -> u32 {
        self.max_payment_attempts
    }

    /// Admits a vehicle: reserves a free slot of its class and issues a ticket.
    pub async fn enter(&self, plate: &str, class: VehicleClass) -> Result<EntryOutcome> {
        let plate = plate.trim();
        if plate.is_empty() {
            return Err(ParkingError::ValidationError(
                "License plate must not be empty".to_string(),
            ));
        }

        let Some(slot) = self.slots.allocate(class).await? else {
            tracing::info!(plate, %class, "no slot available");
            return Ok(EntryOutcome::NoSlotAvailable);
        };
        tracing::debug!(plate, %class, slot_id = %slot.id, floor = slot.floor, "slot allocated");

        let ticket = match self
            .tickets
            .create(plate, class, slot.id, self.clock.now())
            .await
        {
            Ok(ticket) => ticket,
            Err(e) => {
                self.slots.release(slot.id).await?;
                return Err(e);
            }
        };

        tracing::info!(
            plate,
            %class,
            ticket_id = %ticket.id,
            slot_id = %slot.id,
            floor = slot.floor,
            "ticket issued"
        );
        Ok(EntryOutcome::Admitted(ticket))
    }

    /// Checks a vehicle out: prices and charges the ticket, then frees its slot.
    pub async fn exit(&self, ticket_id: TicketId) -> Result<ExitOutcome> {
        let ticket = match self.tickets.begin_exit(ticket_id).await? {
            ExitClaim::Claimed(ticket) => ticket,
            ExitClaim::NotFound => {
                tracing::info!(%ticket_id, "exit for unknown ticket");
                return Ok(ExitOutcome::TicketNotFound);
            }
            ExitClaim::AlreadyExited => {
                tracing::info!(%ticket_id, "ticket already exited");
                return Ok(ExitOutcome::AlreadyExited);
            }
            ExitClaim::InProgress => {
                tracing::info!(%ticket_id, "exit already in progress");
                return Ok(ExitOutcome::ExitInProgress);
            }
        };

        match self.charge(&ticket).await {
            Ok(Charge::Paid {
                quote,
                record,
                attempts,
                exit_time,
            }) => self.complete_exit(ticket, quote, record, attempts, exit_time).await,
            Ok(Charge::Declined { fee, attempts }) => {
                self.tickets.abandon_exit(ticket_id).await?;
                Ok(ExitOutcome::PaymentFailed { fee, attempts })
            }
            Err(e) => {
                if let Err(abandon) = self.tickets.abandon_exit(ticket_id).await {
                    tracing::error!(%ticket_id, error = %abandon, "failed to reopen ticket");
                }
                Err(e)
            }
        }
    }

    async fn charge(&self, ticket: &Ticket) -> Result<Charge> {
        let exit_time = self.clock.now();
        let quote = self.fees.compute_fee(ticket, exit_time).await?;
        let outcome = self
            .payments
            .pay(ticket.id, quote.amount, self.max_payment_attempts)
            .await?;

        Ok(match outcome {
            PaymentOutcome::Succeeded { record, attempts } => Charge::Paid {
                quote,
                record,
                attempts,
                exit_time,
            },
            PaymentOutcome::Failed { attempts } => Charge::Declined {
                fee: quote.amount,
                attempts,
            },
        })
    }

    /// The paid-for mutation: close the ticket, then free its slot.
    ///
    /// The ticket goes first so that no active ticket ever points at a free
    /// slot another entry could take.
    async fn complete_exit(
        &self,
        ticket: Ticket,
        quote: FeeQuote,
        record: PaymentRecord,
        attempts: u32,
        exit_time: DateTime<Utc>,
    ) -> Result<ExitOutcome> {
        self.tickets.deactivate(ticket.id).await?.ok_or_else(|| {
            ParkingError::InvariantViolation(format!("Ticket {} vanished during exit", ticket.id))
        })?;

        if !self.slots.release(ticket.slot_id).await? {
            tracing::warn!(
                ticket_id = %ticket.id,
                slot_id = %ticket.slot_id,
                "ticket slot no longer exists"
            );
        }
        let floor = self.slots.get(ticket.slot_id).await?.map(|slot| slot.floor);

        tracing::info!(
            ticket_id = %ticket.id,
            plate = %ticket.plate,
            slot_id = %ticket.slot_id,
            fee = %quote.amount,
            gateway = %record.gateway,
            "vehicle exited"
        );

        Ok(ExitOutcome::Exited(ExitReceipt {
            ticket_id: ticket.id,
            plate: ticket.plate,
            class: ticket.class,
            slot_id: ticket.slot_id,
            floor,
            entry_time: ticket.entry_time,
            exit_time,
            billed_hours: quote.billed_hours,
            fee: quote.amount,
            payment_id: record.id,
            gateway: record.gateway,
            payment_status: record.status,
            payment_attempts: attempts,
        }))
    }

    pub async fn count_available(&self, class: VehicleClass) -> Result<usize> {
        self.slots.count_available(class).await
    }

    pub async fn list_active(&self) -> Result<Vec<Ticket>> {
        self.tickets.list_active().await
    }

    pub async fn find_ticket(&self, ticket_id: TicketId) -> Result<Option<Ticket>> {
        self.tickets.find(ticket_id).await
    }

    /// The active ticket for `plate`, if the vehicle is currently parked.
    pub async fn active_ticket_for_plate(&self, plate: &str) -> Result<Option<Ticket>> {
        let plate = plate.trim();
        Ok(self
            .tickets
            .list_active()
            .await?
            .into_iter()
            .filter(|t| t.plate == plate)
            .min_by_key(|t| t.entry_time))
    }

    /// Ledger records for a ticket, oldest first.
    pub async fn payments_for(&self, ticket_id: TicketId) -> Result<Vec<PaymentRecord>> {
        self.payments.ledger().for_ticket(ticket_id).await
    }

    pub async fn status(&self) -> Result<FacilityStatus> {
        let mut classes = Vec::new();
        for class in VehicleClass::ALL {
            let total = self.slots.count_total(class).await?;
            if total == 0 {
                continue;
            }
            classes.push(ClassStatus {
                class,
                available: self.slots.count_available(class).await?,
                total,
            });
        }
        let active_tickets = self.tickets.list_active().await?.len();
        Ok(FacilityStatus {
            classes,
            active_tickets,
        })
    }

    // Admin operations.

    pub async fn add_slot(&self, class: VehicleClass, floor: u32) -> Result<Slot> {
        let slot = Slot::new(class, floor);
        self.slots.add(slot.clone()).await?;
        tracing::debug!(%class, floor, slot_id = %slot.id, "slot added");
        Ok(slot)
    }

    pub async fn add_slots(
        &self,
        class: VehicleClass,
        floor: u32,
        count: usize,
    ) -> Result<Vec<Slot>> {
        let mut added = Vec::with_capacity(count);
        for _ in 0..count {
            added.push(self.add_slot(class, floor).await?);
        }
        tracing::info!(%class, floor, count, "slots provisioned");
        Ok(added)
    }

    /// Inserts or replaces the pricing rule for `class`.
    pub async fn set_pricing_rule(
        &self,
        class: VehicleClass,
        flat_rate: Amount,
        rate_per_hour: Amount,
    ) -> Result<PricingRule> {
        let rule = PricingRule::new(class, flat_rate, rate_per_hour);
        let previous = self.fees.pricing().upsert(rule.clone()).await?;
        tracing::info!(
            %class,
            flat = %flat_rate,
            per_hour = %rate_per_hour,
            replaced = previous.is_some(),
            "pricing rule set"
        );
        Ok(rule)
    }

    pub async fn update_flat_rate(
        &self,
        class: VehicleClass,
        flat_rate: Amount,
    ) -> Result<PricingRule> {
        let rule = self
            .fees
            .pricing()
            .update_rates(class, Some(flat_rate), None)
            .await?;
        tracing::info!(%class, flat = %flat_rate, "flat rate updated");
        Ok(rule)
    }

    pub async fn update_hourly_rate(
        &self,
        class: VehicleClass,
        rate_per_hour: Amount,
    ) -> Result<PricingRule> {
        let rule = self
            .fees
            .pricing()
            .update_rates(class, None, Some(rate_per_hour))
            .await?;
        tracing::info!(%class, per_hour = %rate_per_hour, "hourly rate updated");
        Ok(rule)
    }

    pub async fn pricing_rules(&self) -> Result<Vec<PricingRule>> {
        self.fees.pricing().all().await
    }
}
