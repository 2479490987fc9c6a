use super::money::Amount;
use super::payment::{PaymentId, PaymentRecord};
use super::pricing::PricingRule;
use super::slot::{Slot, SlotId};
use super::ticket::{ExitClaim, Ticket, TicketId};
use super::vehicle::VehicleClass;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Slot inventory and occupancy.
///
/// `allocate` and `release` must be linearizable per slot: two concurrent
/// allocations never hand out the same slot, and `count_available` always
/// matches the number of free slots.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn add(&self, slot: Slot) -> Result<()>;
    /// Marks one free slot of `class` occupied. `None` when the class is full.
    async fn allocate(&self, class: VehicleClass) -> Result<Option<Slot>>;
    /// Marks the slot free. `false` for unknown ids; re-releasing is a no-op.
    async fn release(&self, slot_id: SlotId) -> Result<bool>;
    async fn get(&self, slot_id: SlotId) -> Result<Option<Slot>>;
    async fn count_available(&self, class: VehicleClass) -> Result<usize>;
    async fn count_total(&self, class: VehicleClass) -> Result<usize>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(
        &self,
        plate: &str,
        class: VehicleClass,
        slot_id: SlotId,
        entry_time: DateTime<Utc>,
    ) -> Result<Ticket>;
    async fn find(&self, ticket_id: TicketId) -> Result<Option<Ticket>>;
    /// Atomically moves an active ticket into checkout so only one exit flow
    /// can charge it.
    async fn begin_exit(&self, ticket_id: TicketId) -> Result<ExitClaim>;
    /// Returns a claimed ticket to the active state after a failed checkout.
    async fn abandon_exit(&self, ticket_id: TicketId) -> Result<()>;
    /// Closes the ticket for good. `None` for unknown ids; no-op when already closed.
    async fn deactivate(&self, ticket_id: TicketId) -> Result<Option<Ticket>>;
    async fn list_active(&self) -> Result<Vec<Ticket>>;
}

/// One pricing rule per vehicle class; every write replaces a rule whole.
#[async_trait]
pub trait PricingTable: Send + Sync {
    async fn get(&self, class: VehicleClass) -> Result<Option<PricingRule>>;
    async fn upsert(&self, rule: PricingRule) -> Result<Option<PricingRule>>;
    /// Edits some rates of an existing rule in one step.
    async fn update_rates(
        &self,
        class: VehicleClass,
        flat_rate: Option<Amount>,
        rate_per_hour: Option<Amount>,
    ) -> Result<PricingRule>;
    async fn all(&self) -> Result<Vec<PricingRule>>;
}

/// Append-only log of payment attempts.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn append(&self, record: PaymentRecord) -> Result<()>;
    async fn settle(&self, payment_id: PaymentId, succeeded: bool) -> Result<PaymentRecord>;
    /// Records for a ticket, in the order they were appended.
    async fn for_ticket(&self, ticket_id: TicketId) -> Result<Vec<PaymentRecord>>;
}

/// A payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &str;
    async fn attempt(&self, ticket_id: TicketId, amount: Amount) -> bool;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SlotStoreBox = Box<dyn SlotStore>;
pub type TicketStoreBox = Box<dyn TicketStore>;
pub type PricingTableBox = Box<dyn PricingTable>;
pub type PaymentLedgerBox = Box<dyn PaymentLedger>;
pub type GatewayRef = Arc<dyn PaymentGateway>;
pub type ClockRef = Arc<dyn Clock>;
