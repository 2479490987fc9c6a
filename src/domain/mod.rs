//! Domain model: vehicles, slots, tickets, pricing and payments, plus the
//! ports the application layer talks to.

pub mod money;
pub mod payment;
pub mod ports;
pub mod pricing;
pub mod slot;
pub mod ticket;
pub mod vehicle;
