use chrono::{TimeDelta, Utc};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use parkwise::application::engine::{EntryOutcome, ExitOutcome, ParkingEngine};
use parkwise::config::FacilityConfig;
use parkwise::error::ParkingError;
use parkwise::infrastructure::clock::ManualClock;
use parkwise::interfaces::csv::event_reader::{EventAction, EventReader, ParkingEvent};
use parkwise::interfaces::csv::receipt_writer::ReceiptWriter;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario CSV file with columns: action, plate, class, minutes
    input: PathBuf,

    /// Facility configuration (JSON). Uses the built-in demo facility if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured number of payment attempts per exit.
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    parkwise::telemetry::init_tracing();
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => FacilityConfig::from_path(path).into_diagnostic()?,
        None => FacilityConfig::default(),
    };
    if let Some(max_attempts) = cli.max_attempts {
        config.payment.max_attempts = max_attempts;
    }

    // Scenario time only moves on `wait` rows.
    let clock = ManualClock::new(Utc::now());
    let engine = config
        .build_engine(Arc::new(clock.clone()))
        .await
        .into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = ReceiptWriter::new(stdout.lock());

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event_result in reader.events() {
        match event_result {
            Ok(event) => {
                if let Err(e) = process_event(&engine, &clock, &event, &mut writer).await {
                    tracing::error!(?event, "Error processing event: {e}");
                }
            }
            Err(e) => {
                tracing::error!("Error reading event: {e}");
            }
        }
    }
    writer.flush().into_diagnostic()?;

    let status = engine.status().await.into_diagnostic()?;
    for class in &status.classes {
        tracing::info!(
            class = %class.class,
            available = class.available,
            total = class.total,
            "final occupancy"
        );
    }
    tracing::info!(active_tickets = status.active_tickets, "scenario complete");
    Ok(())
}

async fn process_event<W: Write>(
    engine: &ParkingEngine,
    clock: &ManualClock,
    event: &ParkingEvent,
    writer: &mut ReceiptWriter<W>,
) -> parkwise::error::Result<()> {
    match event.action {
        EventAction::Enter => {
            let plate = event.plate()?;
            match engine.enter(plate, event.class()?).await? {
                EntryOutcome::Admitted(ticket) => {
                    tracing::debug!(plate, ticket_id = %ticket.id, "vehicle admitted");
                }
                EntryOutcome::NoSlotAvailable => {
                    tracing::warn!(plate, "Entry rejected: no slot available");
                }
            }
        }
        EventAction::Exit => {
            let plate = event.plate()?;
            let Some(ticket) = engine.active_ticket_for_plate(plate).await? else {
                tracing::warn!(plate, "Exit rejected: no active ticket for plate");
                return Ok(());
            };
            match engine.exit(ticket.id).await? {
                ExitOutcome::Exited(receipt) => writer.write_receipt(&receipt)?,
                ExitOutcome::PaymentFailed { fee, attempts } => {
                    tracing::warn!(plate, %fee, attempts, "Exit rejected: payment failed");
                }
                other => {
                    tracing::warn!(plate, outcome = ?other, "Exit rejected");
                }
            }
        }
        EventAction::Wait => {
            let by = TimeDelta::try_minutes(event.minutes()?).ok_or_else(|| {
                ParkingError::ValidationError("Wait duration is out of range".to_string())
            })?;
            clock.advance(by)?;
        }
    }
    Ok(())
}
