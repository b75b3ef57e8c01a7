//! Terminal punch clock. Clock-in and clock-out punches are appended to a history that survives
//! restarts, next to a clock face that refreshes every second.
//!

pub mod cli;
pub mod config;
pub mod ledger;
pub mod storage;
pub mod ticker;
pub mod utils;
pub mod view;
