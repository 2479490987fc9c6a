//! Adapters for the domain ports: in-memory stores, clocks and scripted
//! payment gateways.

pub mod clock;
pub mod gateway;
pub mod in_memory;
