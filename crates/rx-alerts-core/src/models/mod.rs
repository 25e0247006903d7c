//! Domain models for the rx-alerts system.

mod alert;
mod appointment;

pub use alert::*;
pub use appointment::*;
