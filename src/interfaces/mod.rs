//! Outer adapters: CSV scenario input and receipt output.

pub mod csv;
