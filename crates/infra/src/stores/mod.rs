//! In-memory implementations of the domain store ports.

pub mod alerts;
pub mod directory;
pub mod finance;
pub mod webhooks;
