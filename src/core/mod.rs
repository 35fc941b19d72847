//! Core business logic - framework-agnostic operations shared by the HTTP API
//! and the chat bot. Functions take a database connection (or transaction)
//! and return [`crate::errors::Result`].

pub mod audit;
pub mod catalog;
pub mod dashboard;
pub mod front_door;
pub mod lobby;
pub mod promotion;
pub mod search;
pub mod settings;
pub mod staff;
pub mod submission;
pub mod time;
