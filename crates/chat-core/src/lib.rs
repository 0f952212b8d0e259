//! Chat core — everything between the UI and the remote services.

pub mod ports;
pub mod event_bus;
pub mod conversation;
pub mod accumulator;
pub mod session;

#[cfg(test)]
mod tests;
