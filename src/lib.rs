//! Sorting, single-value filtering, pagination and column visibility over
//! shared, mutable tables.
//!
//! Each view is a controller bound to a [`dom::Table`]. They share the row
//! collection of the table and coordinate only through its event bus.

pub mod config;
pub mod controllers;
pub mod data;
pub mod dom;
pub mod logging;
pub mod preferences;
pub mod state;
pub mod utils;
