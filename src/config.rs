//! Facility configuration: floors and their slots, pricing, payment gateways.
//!
//! Loaded from JSON with `serde_json`; `FacilityConfig::default()` describes
//! the demo facility the binary runs when no file is given.

use crate::application::engine::{DEFAULT_MAX_PAYMENT_ATTEMPTS, ParkingEngine};
use crate::application::fees::FeeCalculator;
use crate::application::payments::PaymentOrchestrator;
use crate::domain::money::Amount;
use crate::domain::ports::{ClockRef, GatewayRef};
use crate::domain::vehicle::VehicleClass;
use crate::error::{ParkingError, Result};
use crate::infrastructure::gateway::ScriptedGateway;
use crate::infrastructure::in_memory::{
    InMemoryPaymentLedger, InMemoryPricingTable, InMemorySlotStore, InMemoryTicketStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilityConfig {
    pub floors: Vec<FloorConfig>,
    pub pricing: Vec<PricingConfig>,
    #[serde(default)]
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloorConfig {
    pub number: u32,
    /// Slot count per vehicle class on this floor.
    pub slots: BTreeMap<VehicleClass, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    pub class: VehicleClass,
    pub flat_rate: Decimal,
    pub rate_per_hour: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Tried in order; the last one serves every remaining attempt.
    pub gateways: Vec<GatewayConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub name: String,
    /// Number of leading attempts this gateway declines.
    #[serde(default)]
    pub failures: usize,
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_PAYMENT_ATTEMPTS
}

impl GatewayConfig {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failures: 0,
            latency_ms: 0,
        }
    }

    fn build(&self) -> GatewayRef {
        let mut gateway = ScriptedGateway::failing_first(self.name.clone(), self.failures);
        if self.latency_ms > 0 {
            gateway = gateway.with_latency(Duration::from_millis(self.latency_ms));
        }
        Arc::new(gateway)
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_PAYMENT_ATTEMPTS,
            gateways: vec![GatewayConfig::named("razorpay"), GatewayConfig::named("stripe")],
        }
    }
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            floors: vec![
                FloorConfig {
                    number: 1,
                    slots: BTreeMap::from([
                        (VehicleClass::Car, 10),
                        (VehicleClass::Bike, 10),
                        (VehicleClass::Truck, 2),
                    ]),
                },
                FloorConfig {
                    number: 2,
                    slots: BTreeMap::from([
                        (VehicleClass::Car, 10),
                        (VehicleClass::Bike, 5),
                        (VehicleClass::Ev, 5),
                    ]),
                },
            ],
            pricing: vec![
                PricingConfig {
                    class: VehicleClass::Car,
                    flat_rate: dec!(50.0),
                    rate_per_hour: dec!(20.0),
                },
                PricingConfig {
                    class: VehicleClass::Bike,
                    flat_rate: dec!(20.0),
                    rate_per_hour: dec!(10.0),
                },
                PricingConfig {
                    class: VehicleClass::Truck,
                    flat_rate: dec!(100.0),
                    rate_per_hour: dec!(40.0),
                },
                PricingConfig {
                    class: VehicleClass::Ev,
                    flat_rate: dec!(50.0),
                    rate_per_hour: dec!(18.0),
                },
            ],
            payment: PaymentConfig::default(),
        }
    }
}

fn positive(value: Decimal, what: &str, class: VehicleClass) -> Result<Amount> {
    if value <= Decimal::ZERO {
        return Err(ParkingError::ValidationError(format!(
            "{what} for {class} must be positive"
        )));
    }
    Amount::new(value)
}

impl FacilityConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut floors = HashSet::new();
        for floor in &self.floors {
            if !floors.insert(floor.number) {
                return Err(ParkingError::ValidationError(format!(
                    "Floor {} configured twice",
                    floor.number
                )));
            }
        }

        let mut classes = HashSet::new();
        for rule in &self.pricing {
            if !classes.insert(rule.class) {
                return Err(ParkingError::ValidationError(format!(
                    "Pricing for {} configured twice",
                    rule.class
                )));
            }
            positive(rule.flat_rate, "Flat rate", rule.class)?;
            positive(rule.rate_per_hour, "Rate per hour", rule.class)?;
        }

        if self.payment.max_attempts == 0 {
            return Err(ParkingError::ValidationError(
                "payment.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.payment.gateways.is_empty() {
            return Err(ParkingError::ValidationError(
                "At least one payment gateway is required".to_string(),
            ));
        }
        if self.payment.gateways.iter().any(|g| g.name.trim().is_empty()) {
            return Err(ParkingError::ValidationError(
                "Gateway names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds an in-memory engine and provisions it with this configuration.
    pub async fn build_engine(&self, clock: ClockRef) -> Result<ParkingEngine> {
        self.validate()?;

        let gateways = self.payment.gateways.iter().map(GatewayConfig::build).collect();
        let engine = ParkingEngine::new(
            Box::new(InMemorySlotStore::new()),
            Box::new(InMemoryTicketStore::new()),
            FeeCalculator::new(Box::new(InMemoryPricingTable::new())),
            PaymentOrchestrator::new(Box::new(InMemoryPaymentLedger::new()), gateways)?,
            clock,
        )
        .with_max_payment_attempts(self.payment.max_attempts)?;

        for floor in &self.floors {
            for (class, count) in &floor.slots {
                engine.add_slots(*class, floor.number, *count).await?;
            }
        }
        for rule in &self.pricing {
            engine
                .set_pricing_rule(
                    rule.class,
                    positive(rule.flat_rate, "Flat rate", rule.class)?,
                    positive(rule.rate_per_hour, "Rate per hour", rule.class)?,
                )
                .await?;
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FacilityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{
            "floors": [{ "number": 1, "slots": { "car": 2, "ev": 1 } }],
            "pricing": [{ "class": "car", "flat_rate": 25.0, "rate_per_hour": 60.0 }]
        }"#;
        let config: FacilityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.floors[0].slots[&VehicleClass::Ev], 1);
        assert_eq!(config.pricing[0].rate_per_hour, dec!(60));
        assert_eq!(config.payment, PaymentConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let json = r#"{ "floors": [], "pricing": [], "colour": "blue" }"#;
        assert!(serde_json::from_str::<FacilityConfig>(json).is_err());
    }

    #[test]
    fn test_rejects_duplicate_pricing() {
        let mut config = FacilityConfig::default();
        config.pricing.push(config.pricing[0].clone());
        assert!(matches!(
            config.validate(),
            Err(ParkingError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        let mut config = FacilityConfig::default();
        config.pricing[0].rate_per_hour = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_gateways_and_zero_attempts() {
        let mut config = FacilityConfig::default();
        config.payment.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = FacilityConfig::default();
        config.payment.gateways.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_path_reports_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            FacilityConfig::from_path(file.path()),
            Err(ParkingError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_build_engine_provisions_slots_and_pricing() {
        let engine = FacilityConfig::default()
            .build_engine(Arc::new(SystemClock))
            .await
            .unwrap();
        assert_eq!(engine.count_available(VehicleClass::Car).await.unwrap(), 20);
        assert_eq!(engine.count_available(VehicleClass::Truck).await.unwrap(), 2);
        assert_eq!(engine.pricing_rules().await.unwrap().len(), 4);
        assert_eq!(engine.max_payment_attempts(), 3);
    }
}
