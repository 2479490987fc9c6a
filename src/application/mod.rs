//! Application layer containing the parking facility's orchestration.
//!
//! `ParkingEngine` is the entry point for entries, exits and admin changes. It
//! delegates pricing to `FeeCalculator` and charging to `PaymentOrchestrator`,
//! and only touches slot and ticket state through the store ports.

pub mod engine;
pub mod fees;
pub mod payments;
