//! Aggregation, chart series and client-side controllers of the agency
//! dashboard.
//!
//! The pure functions (`metrics`, `activity`, `progress`, `series`) work on
//! entity models and never touch the database. `analytics` and `reports` load
//! the rows they need and compose those functions into API payloads. `board`
//! and `roster` hold in-memory UI state on top of a remote gateway.

pub mod activity;
pub mod analytics;
pub mod board;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod metrics;
pub mod progress;
pub mod reports;
pub mod roster;
pub mod series;

#[cfg(test)]
pub(crate) mod testing;

pub use board::{BoardError, PendingMutation, TaskBoard, TaskGateway};
pub use gateway::{Confirm, GatewayError, Outcome};
pub use generation::{Generation, Latest, Ticket};
pub use roster::{ClientGateway, ClientRoster, RosterError};
