use crate::domain::money::Amount;
use crate::domain::ports::PricingTableBox;
use crate::domain::pricing::{PricingRule, billed_hours};
use crate::domain::ticket::Ticket;
use crate::error::{ParkingError, Result};
use chrono::{DateTime, Utc};

/// The fee owed for one session, with the numbers it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeQuote {
    pub rule: PricingRule,
    pub billed_hours: u32,
    pub amount: Amount,
}

/// Prices a ticket against the rule for the ticket's own vehicle class.
pub struct FeeCalculator {
    pricing: PricingTableBox,
}

impl FeeCalculator {
    pub fn new(pricing: PricingTableBox) -> Self {
        Self { pricing }
    }

    pub fn pricing(&self) -> &PricingTableBox {
        &self.pricing
    }

    /// Computes the fee for `ticket` if it exits at `exit_time`.
    ///
    /// # Errors
    ///
    /// `ParkingError::NoPricingRule` when the ticket's class has no rule.
    pub async fn compute_fee(&self, ticket: &Ticket, exit_time: DateTime<Utc>) -> Result<FeeQuote> {
        let rule = self
            .pricing
            .get(ticket.class)
            .await?
            .ok_or(ParkingError::NoPricingRule(ticket.class))?;

        let elapsed = exit_time - ticket.entry_time;
        let hours = billed_hours(elapsed);
        let amount = rule.fee_for(elapsed);

        tracing::info!(
            ticket_id = %ticket.id,
            class = %ticket.class,
            billed_hours = hours,
            flat = %rule.flat_rate,
            per_hour = %rule.rate_per_hour,
            fee = %amount,
            "fee computed"
        );

        Ok(FeeQuote {
            rule,
            billed_hours: hours,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PricingTable;
    use crate::domain::slot::SlotId;
    use crate::domain::vehicle::VehicleClass;
    use crate::infrastructure::in_memory::InMemoryPricingTable;
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    async fn calculator() -> FeeCalculator {
        let table = InMemoryPricingTable::new();
        table
            .upsert(PricingRule::new(
                VehicleClass::Car,
                Amount::new(dec!(25.0)).unwrap(),
                Amount::new(dec!(60.0)).unwrap(),
            ))
            .await
            .unwrap();
        table
            .upsert(PricingRule::new(
                VehicleClass::Ev,
                Amount::new(dec!(50.0)).unwrap(),
                Amount::new(dec!(18.0)).unwrap(),
            ))
            .await
            .unwrap();
        FeeCalculator::new(Box::new(table))
    }

    fn ticket(class: VehicleClass, entry: DateTime<Utc>) -> Ticket {
        Ticket::issue("ABC123", class, SlotId::new(), entry)
    }

    #[tokio::test]
    async fn test_one_hour_car_is_capped_at_flat_rate() {
        let calc = calculator().await;
        let entry = Utc::now();
        let quote = calc
            .compute_fee(&ticket(VehicleClass::Car, entry), entry + TimeDelta::hours(1))
            .await
            .unwrap();
        assert_eq!(quote.billed_hours, 1);
        assert_eq!(quote.amount, Amount::new(dec!(25.0)).unwrap());
    }

    #[tokio::test]
    async fn test_two_hour_ev_pays_hourly() {
        let calc = calculator().await;
        let entry = Utc::now();
        let quote = calc
            .compute_fee(&ticket(VehicleClass::Ev, entry), entry + TimeDelta::hours(2))
            .await
            .unwrap();
        assert_eq!(quote.amount, Amount::new(dec!(36.0)).unwrap());
    }

    // Earlier behaviour priced every ticket as a car; the fee must follow the
    // class recorded on the ticket.
    #[tokio::test]
    async fn test_fee_uses_ticket_vehicle_class_not_a_fixed_one() {
        let calc = calculator().await;
        let entry = Utc::now();
        let exit = entry + TimeDelta::hours(1);

        let car = calc.compute_fee(&ticket(VehicleClass::Car, entry), exit).await.unwrap();
        let ev = calc.compute_fee(&ticket(VehicleClass::Ev, entry), exit).await.unwrap();
        assert_eq!(car.rule.class, VehicleClass::Car);
        assert_eq!(ev.rule.class, VehicleClass::Ev);
        assert_eq!(ev.amount, Amount::new(dec!(18.0)).unwrap());
        assert_ne!(car.amount, ev.amount);
    }

    // The fee is measured from the recorded entry time to the given exit time,
    // not to whenever the calculation happens to run.
    #[tokio::test]
    async fn test_fee_uses_recorded_entry_and_exit_times() {
        let calc = calculator().await;
        let entry = Utc::now() - TimeDelta::days(30);
        let quote = calc
            .compute_fee(&ticket(VehicleClass::Ev, entry), entry + TimeDelta::minutes(10))
            .await
            .unwrap();
        assert_eq!(quote.billed_hours, 1);
        assert_eq!(quote.amount, Amount::new(dec!(18.0)).unwrap());
    }

    #[tokio::test]
    async fn test_missing_rule_is_a_configuration_error() {
        let calc = calculator().await;
        let entry = Utc::now();
        let result = calc
            .compute_fee(&ticket(VehicleClass::Truck, entry), entry)
            .await;
        assert!(matches!(
            result,
            Err(ParkingError::NoPricingRule(VehicleClass::Truck))
        ));
    }
}
