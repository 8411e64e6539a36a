//! dipwatch: a cron-driven webDiplomacy watcher.
//!
//! Each run logs in to the site, extracts the boards listed on the home
//! page, reconciles them against the last-known snapshot in SQLite and
//! sends a single alert mail when something notable changed. The decision
//! rules live in [`reconcile`]; everything else is adapters around them.

pub mod config;
pub mod db;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod setup;
