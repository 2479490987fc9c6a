use crate::domain::money::Amount;
use crate::domain::payment::{PaymentId, PaymentRecord};
use crate::domain::ports::{PaymentLedger, PricingTable, SlotStore, TicketStore};
use crate::domain::pricing::PricingRule;
use crate::domain::slot::{Slot, SlotId};
use crate::domain::ticket::{ExitClaim, Ticket, TicketId, TicketStatus};
use crate::domain::vehicle::VehicleClass;
use crate::error::{ParkingError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};

/// Allocation order inside a class: lowest floor first, then provisioning order.
type FreeKey = (u32, u64, SlotId);

#[derive(Default)]
struct ClassPool {
    slots: HashMap<SlotId, (u64, Slot)>,
    free: BTreeSet<FreeKey>,
}

impl ClassPool {
    fn insert(&mut self, seq: u64, slot: Slot) {
        if !slot.occupied {
            self.free.insert((slot.floor, seq, slot.id));
        }
        self.slots.insert(slot.id, (seq, slot));
    }

    fn take_free(&mut self) -> Option<Slot> {
        let (_, _, id) = self.free.pop_first()?;
        let (_, slot) = self.slots.get_mut(&id)?;
        slot.occupied = true;
        Some(slot.clone())
    }

    fn free_slot(&mut self, slot_id: SlotId) -> bool {
        let Some((seq, slot)) = self.slots.get_mut(&slot_id) else {
            return false;
        };
        if slot.occupied {
            slot.occupied = false;
            self.free.insert((slot.floor, *seq, slot.id));
        }
        true
    }
}

/// A thread-safe in-memory slot inventory.
///
/// Slots are partitioned into one pool per vehicle class, each behind its own
/// `Mutex`. Allocation and release lock only the pool of the class involved,
/// so classes never contend with each other. The outer `RwLock` is only
/// written when a class gets its first slot.
#[derive(Default, Clone)]
pub struct InMemorySlotStore {
    pools: Arc<RwLock<HashMap<VehicleClass, Arc<Mutex<ClassPool>>>>>,
    index: Arc<RwLock<HashMap<SlotId, VehicleClass>>>,
    seq: Arc<AtomicU64>,
}

impl InMemorySlotStore {
    /// Creates a new, empty in-memory slot store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn pool(&self, class: VehicleClass) -> Option<Arc<Mutex<ClassPool>>> {
        self.pools.read().await.get(&class).cloned()
    }
}

#[async_trait]
impl SlotStore for InMemorySlotStore {
    async fn add(&self, slot: Slot) -> Result<()> {
        {
            let mut index = self.index.write().await;
            if index.contains_key(&slot.id) {
                return Err(ParkingError::ValidationError(format!(
                    "Slot {} already exists",
                    slot.id
                )));
            }
            index.insert(slot.id, slot.class);
        }

        let pool = {
            let mut pools = self.pools.write().await;
            pools.entry(slot.class).or_default().clone()
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        pool.lock().await.insert(seq, slot);
        Ok(())
    }

    async fn allocate(&self, class: VehicleClass) -> Result<Option<Slot>> {
        let Some(pool) = self.pool(class).await else {
            return Ok(None);
        };
        let mut pool = pool.lock().await;
        Ok(pool.take_free())
    }

    async fn release(&self, slot_id: SlotId) -> Result<bool> {
        let class = self.index.read().await.get(&slot_id).copied();
        let Some(class) = class else {
            return Ok(false);
        };
        let Some(pool) = self.pool(class).await else {
            return Ok(false);
        };
        let mut pool = pool.lock().await;
        Ok(pool.free_slot(slot_id))
    }

    async fn get(&self, slot_id: SlotId) -> Result<Option<Slot>> {
        let class = self.index.read().await.get(&slot_id).copied();
        let Some(pool) = (match class {
            Some(class) => self.pool(class).await,
            None => None,
        }) else {
            return Ok(None);
        };
        let pool = pool.lock().await;
        Ok(pool.slots.get(&slot_id).map(|(_, slot)| slot.clone()))
    }

    async fn count_available(&self, class: VehicleClass) -> Result<usize> {
        match self.pool(class).await {
            Some(pool) => Ok(pool.lock().await.free.len()),
            None => Ok(0),
        }
    }

    async fn count_total(&self, class: VehicleClass) -> Result<usize> {
        match self.pool(class).await {
            Some(pool) => Ok(pool.lock().await.slots.len()),
            None => Ok(0),
        }
    }
}

/// A thread-safe in-memory store for tickets.
///
/// Uses `Arc<RwLock<HashMap<TicketId, Ticket>>>`. Every write is a single
/// short critical section; nothing awaits while the lock is held.
#[derive(Default, Clone)]
pub struct InMemoryTicketStore {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
}

impl InMemoryTicketStore {
    /// Creates a new, empty in-memory ticket store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn create(
        &self,
        plate: &str,
        class: VehicleClass,
        slot_id: SlotId,
        entry_time: DateTime<Utc>,
    ) -> Result<Ticket> {
        let ticket = Ticket::issue(plate, class, slot_id, entry_time);
        let mut tickets = self.tickets.write().await;
        tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn find(&self, ticket_id: TicketId) -> Result<Option<Ticket>> {
        let tickets = self.tickets.read().await;
        Ok(tickets.get(&ticket_id).cloned())
    }

    async fn begin_exit(&self, ticket_id: TicketId) -> Result<ExitClaim> {
        let mut tickets = self.tickets.write().await;
        let Some(ticket) = tickets.get_mut(&ticket_id) else {
            return Ok(ExitClaim::NotFound);
        };
        Ok(match ticket.status {
            TicketStatus::Active => {
                ticket.status = TicketStatus::CheckingOut;
                ExitClaim::Claimed(ticket.clone())
            }
            TicketStatus::CheckingOut => ExitClaim::InProgress,
            TicketStatus::Exited => ExitClaim::AlreadyExited,
        })
    }

    async fn abandon_exit(&self, ticket_id: TicketId) -> Result<()> {
        let mut tickets = self.tickets.write().await;
        if let Some(ticket) = tickets.get_mut(&ticket_id)
            && ticket.status == TicketStatus::CheckingOut
        {
            ticket.status = TicketStatus::Active;
        }
        Ok(())
    }

    async fn deactivate(&self, ticket_id: TicketId) -> Result<Option<Ticket>> {
        let mut tickets = self.tickets.write().await;
        Ok(tickets.get_mut(&ticket_id).map(|ticket| {
            ticket.status = TicketStatus::Exited;
            ticket.clone()
        }))
    }

    async fn list_active(&self) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        Ok(tickets.values().filter(|t| t.is_active()).cloned().collect())
    }
}

/// A thread-safe in-memory pricing table keyed by vehicle class.
#[derive(Default, Clone)]
pub struct InMemoryPricingTable {
    rules: Arc<RwLock<HashMap<VehicleClass, PricingRule>>>,
}

impl InMemoryPricingTable {
    /// Creates a new, empty in-memory pricing table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PricingTable for InMemoryPricingTable {
    async fn get(&self, class: VehicleClass) -> Result<Option<PricingRule>> {
        let rules = self.rules.read().await;
        Ok(rules.get(&class).cloned())
    }

    async fn upsert(&self, rule: PricingRule) -> Result<Option<PricingRule>> {
        let mut rules = self.rules.write().await;
        Ok(rules.insert(rule.class, rule))
    }

    async fn update_rates(
        &self,
        class: VehicleClass,
        flat_rate: Option<Amount>,
        rate_per_hour: Option<Amount>,
    ) -> Result<PricingRule> {
        let mut rules = self.rules.write().await;
        let rule = rules
            .get_mut(&class)
            .ok_or(ParkingError::NoPricingRule(class))?;
        if let Some(flat_rate) = flat_rate {
            rule.flat_rate = flat_rate;
        }
        if let Some(rate_per_hour) = rate_per_hour {
            rule.rate_per_hour = rate_per_hour;
        }
        Ok(rule.clone())
    }

    async fn all(&self) -> Result<Vec<PricingRule>> {
        let rules = self.rules.read().await;
        let mut all: Vec<PricingRule> = rules.values().cloned().collect();
        all.sort_by_key(|rule| rule.class);
        Ok(all)
    }
}

#[derive(Default)]
struct LedgerState {
    records: Vec<PaymentRecord>,
    positions: HashMap<PaymentId, usize>,
}

/// A thread-safe, append-only in-memory payment ledger.
#[derive(Default, Clone)]
pub struct InMemoryPaymentLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryPaymentLedger {
    /// Creates a new, empty in-memory payment ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn append(&self, record: PaymentRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.positions.contains_key(&record.id) {
            return Err(ParkingError::InvariantViolation(format!(
                "Payment {} appended twice",
                record.id
            )));
        }
        let position = state.records.len();
        state.positions.insert(record.id, position);
        state.records.push(record);
        Ok(())
    }

    async fn settle(&self, payment_id: PaymentId, succeeded: bool) -> Result<PaymentRecord> {
        let mut state = self.state.write().await;
        let position = *state.positions.get(&payment_id).ok_or_else(|| {
            ParkingError::InvariantViolation(format!("Unknown payment {payment_id}"))
        })?;
        let record = &mut state.records[position];
        record.settle(succeeded)?;
        Ok(record.clone())
    }

    async fn for_ticket(&self, ticket_id: TicketId) -> Result<Vec<PaymentRecord>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| r.ticket_id == ticket_id)
            .cloned()
            .collect())
    }
}
