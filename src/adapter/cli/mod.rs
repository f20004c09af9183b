//! CLI module graph.

mod account;
pub mod command;
mod group;
pub mod output;
pub mod run;
mod stats;
mod trade;

pub use command::Cli;
pub use run::{execute, Journal};
