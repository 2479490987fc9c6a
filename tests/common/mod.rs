#![allow(dead_code)]

use chrono::Utc;
use parkwise::application::engine::{EntryOutcome, ParkingEngine};
use parkwise::application::fees::FeeCalculator;
use parkwise::application::payments::PaymentOrchestrator;
use parkwise::domain::money::Amount;
use parkwise::domain::ports::GatewayRef;
use parkwise::domain::ticket::Ticket;
use parkwise::domain::vehicle::VehicleClass;
use parkwise::infrastructure::clock::ManualClock;
use parkwise::infrastructure::gateway::ScriptedGateway;
use parkwise::infrastructure::in_memory::{
    InMemoryPaymentLedger, InMemoryPricingTable, InMemorySlotStore, InMemoryTicketStore,
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

pub fn approving() -> Vec<GatewayRef> {
    vec![Arc::new(ScriptedGateway::approving("razorpay")) as GatewayRef]
}

/// An engine over fresh in-memory stores with the given gateways and clock.
pub fn engine(gateways: Vec<GatewayRef>, clock: &ManualClock) -> ParkingEngine {
    engine_over(
        InMemorySlotStore::new(),
        InMemoryTicketStore::new(),
        gateways,
        clock,
    )
}

/// Like [`engine`], but over stores the caller keeps handles to.
pub fn engine_over(
    slots: InMemorySlotStore,
    tickets: InMemoryTicketStore,
    gateways: Vec<GatewayRef>,
    clock: &ManualClock,
) -> ParkingEngine {
    ParkingEngine::new(
        Box::new(slots),
        Box::new(tickets),
        FeeCalculator::new(Box::new(InMemoryPricingTable::new())),
        PaymentOrchestrator::new(Box::new(InMemoryPaymentLedger::new()), gateways).unwrap(),
        Arc::new(clock.clone()),
    )
}

pub fn clock() -> ManualClock {
    ManualClock::new(Utc::now())
}

pub async fn admit(engine: &ParkingEngine, plate: &str, class: VehicleClass) -> Ticket {
    match engine.enter(plate, class).await.unwrap() {
        EntryOutcome::Admitted(ticket) => ticket,
        EntryOutcome::NoSlotAvailable => panic!("no slot for {plate}"),
    }
}

pub fn write_scenario(path: &Path, rows: &[[&str; 4]]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["action", "plate", "class", "minutes"])?;
    for row in rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}
