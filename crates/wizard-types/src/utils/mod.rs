//! Small helpers shared by the wizard crates.

pub mod constants;
pub mod helpers;

pub use helpers::{current_timestamp, new_id, truncate_id};
