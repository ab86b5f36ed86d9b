//! Command-line components for the `boq` estimate ledger.

pub mod cli;
pub mod commands;
pub mod logging;
