//! Adapters: store implementations and the command-line front end.

pub mod cli;
pub mod memory;
pub mod sqlite;
