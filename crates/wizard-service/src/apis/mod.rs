//! Request handling behind the HTTP routes.

pub mod clients;
pub mod wizard;
