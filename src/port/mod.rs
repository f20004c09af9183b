//! Ports: the traits the application layer depends on.

pub mod store;

pub use store::{ChangeSet, JournalStore, TradeQuery};
