use crate::application::engine::ExitReceipt;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ReceiptRow<'a> {
    ticket: String,
    plate: &'a str,
    class: &'a str,
    floor: Option<u32>,
    entry: String,
    exit: String,
    hours: u32,
    fee: String,
    gateway: &'a str,
    status: String,
    attempts: u32,
}

impl<'a> From<&'a ExitReceipt> for ReceiptRow<'a> {
    fn from(receipt: &'a ExitReceipt) -> Self {
        Self {
            ticket: receipt.ticket_id.to_string(),
            plate: &receipt.plate,
            class: receipt.class.as_str(),
            floor: receipt.floor,
            entry: receipt.entry_time.to_rfc3339(),
            exit: receipt.exit_time.to_rfc3339(),
            hours: receipt.billed_hours,
            fee: receipt.fee.to_string(),
            gateway: &receipt.gateway,
            status: receipt.payment_status.to_string(),
            attempts: receipt.payment_attempts,
        }
    }
}

/// Writes exit receipts as CSV rows, one per completed exit.
pub struct ReceiptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReceiptWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_receipt(&mut self, receipt: &ExitReceipt) -> Result<()> {
        self.writer.serialize(ReceiptRow::from(receipt))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Amount;
    use crate::domain::payment::{PaymentId, PaymentStatus};
    use crate::domain::slot::SlotId;
    use crate::domain::ticket::TicketId;
    use crate::domain::vehicle::VehicleClass;
    use chrono::{TimeDelta, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_header_and_rows() {
        let entry = Utc::now();
        let receipt = ExitReceipt {
            ticket_id: TicketId::new(),
            plate: "ABC123".to_string(),
            class: VehicleClass::Car,
            slot_id: SlotId::new(),
            floor: Some(1),
            entry_time: entry,
            exit_time: entry + TimeDelta::minutes(61),
            billed_hours: 2,
            fee: Amount::new(dec!(40)).unwrap(),
            payment_id: PaymentId::new(),
            gateway: "stripe".to_string(),
            payment_status: PaymentStatus::Success,
            payment_attempts: 2,
        };

        let mut buffer = Vec::new();
        {
            let mut writer = ReceiptWriter::new(&mut buffer);
            writer.write_receipt(&receipt).unwrap();
            writer.flush().unwrap();
        }
        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ticket,plate,class,floor,entry,exit,hours,fee,gateway,status,attempts"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("ABC123,car,1,"));
        assert!(row.ends_with(",2,40.00,stripe,SUCCESS,2"));
    }
}
