//! Shared data model of the order wizard.
//!
//! States, events, the typed context, the persisted instance with its
//! history, the collaborator payloads, and the API and configuration-schema
//! types used by every other crate in the workspace.

/// HTTP request/response types and the API error model.
pub mod api;
/// Typed extended state of a wizard run.
pub mod context;
/// Engine notifications for the event bus.
pub mod events;
/// Wizard instance and history.
pub mod instance;
/// Item draft, step payloads and committed items.
pub mod item;
/// Order-level stage data.
pub mod order;
/// Self-registration of pluggable implementations.
pub mod registry;
/// Wizard states and item sub-wizard steps.
pub mod state;
/// Storage namespaces.
pub mod storage;
/// Events and transition requests.
pub mod transition;
pub mod utils;
/// Configuration schema validation.
pub mod validation;

pub use api::*;
pub use context::*;
pub use events::*;
pub use instance::*;
pub use item::*;
pub use order::*;
pub use registry::*;
pub use state::*;
pub use storage::*;
pub use transition::*;
pub use utils::{current_timestamp, new_id, truncate_id};
pub use validation::*;
