use super::money::Amount;
use super::vehicle::VehicleClass;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// The tariff for one vehicle class.
///
/// `flat_rate` caps the fee for a whole session; `rate_per_hour` is billed in
/// whole started hours with a one hour minimum. A session pays whichever is
/// cheaper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRule {
    pub class: VehicleClass,
    pub flat_rate: Amount,
    pub rate_per_hour: Amount,
}

impl PricingRule {
    pub fn new(class: VehicleClass, flat_rate: Amount, rate_per_hour: Amount) -> Self {
        Self {
            class,
            flat_rate,
            rate_per_hour,
        }
    }

    pub fn hourly_fee(&self, hours: u32) -> Amount {
        self.rate_per_hour * hours
    }

    /// Fee for a session that lasted `elapsed`.
    pub fn fee_for(&self, elapsed: TimeDelta) -> Amount {
        self.flat_rate.min(self.hourly_fee(billed_hours(elapsed)))
    }
}

/// Whole hours to bill for `elapsed`: rounded up, never below one.
pub fn billed_hours(elapsed: TimeDelta) -> u32 {
    let millis = elapsed.num_milliseconds();
    if millis <= MILLIS_PER_HOUR {
        return 1;
    }
    let hours = (millis + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR;
    u32::try_from(hours).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rule(flat: rust_decimal::Decimal, per_hour: rust_decimal::Decimal) -> PricingRule {
        PricingRule::new(
            VehicleClass::Car,
            Amount::new(flat).unwrap(),
            Amount::new(per_hour).unwrap(),
        )
    }

    #[test]
    fn test_billed_hours_rounds_up_with_one_hour_minimum() {
        assert_eq!(billed_hours(TimeDelta::zero()), 1);
        assert_eq!(billed_hours(TimeDelta::minutes(10)), 1);
        assert_eq!(billed_hours(TimeDelta::minutes(59)), 1);
        assert_eq!(billed_hours(TimeDelta::hours(1)), 1);
        assert_eq!(billed_hours(TimeDelta::minutes(61)), 2);
        assert_eq!(billed_hours(TimeDelta::hours(2)), 2);
        assert_eq!(billed_hours(TimeDelta::seconds(2 * 3600 + 1)), 3);
    }

    #[test]
    fn test_billed_hours_negative_elapsed_is_one_hour() {
        assert_eq!(billed_hours(TimeDelta::minutes(-30)), 1);
    }

    #[test]
    fn test_flat_rate_caps_the_hourly_fee() {
        let rule = rule(dec!(25.0), dec!(60.0));
        assert_eq!(rule.fee_for(TimeDelta::hours(1)), Amount::new(dec!(25.0)).unwrap());
    }

    #[test]
    fn test_hourly_fee_below_the_cap() {
        let rule = rule(dec!(50.0), dec!(18.0));
        assert_eq!(rule.fee_for(TimeDelta::hours(2)), Amount::new(dec!(36.0)).unwrap());
    }

    #[test]
    fn test_fee_is_monotonic_in_elapsed_time() {
        let rule = rule(dec!(100.0), dec!(7.5));
        let ten = rule.fee_for(TimeDelta::minutes(10));
        let fifty_nine = rule.fee_for(TimeDelta::minutes(59));
        let sixty_one = rule.fee_for(TimeDelta::minutes(61));
        assert_eq!(ten, fifty_nine);
        assert!(sixty_one >= fifty_nine);
        assert!(rule.fee_for(TimeDelta::days(3)) <= rule.flat_rate);
    }
}
