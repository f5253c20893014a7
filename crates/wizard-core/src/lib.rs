//! Core of the order wizard.
//!
//! A wizard is a persisted state machine over the dry-cleaning order flow:
//! a main table of stages plus an item sub-wizard nested in
//! `ITEM_MANAGEMENT`. The engine resolves each submitted event to a
//! transition, consults its guard, runs its action against the
//! collaborators, and persists the result under a per-wizard lock.

pub mod actions;
pub mod builder;
pub mod engine;
pub mod guards;
pub mod registry;
pub mod session;
pub mod state;

pub use builder::{BuilderError, WizardBuilder, WizardFactories};
pub use engine::event_bus::EventBus;
pub use engine::{WizardEngine, WizardError};
pub use registry::{OrderRecord, OrderRegistry, OrderRegistryError};
pub use session::{SessionError, SessionStore};
