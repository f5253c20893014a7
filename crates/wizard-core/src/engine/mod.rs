//! Wizard engine.
//!
//! Every request follows the same sequence: take the wizard's lock, load the
//! instance, resolve the transition (guard, then action), persist, release
//! the lock. Rejections and failures are recorded in the history and
//! persisted like accepted transitions; only a terminal instance is left
//! untouched.

pub mod event_bus;
pub mod lifecycle;
pub mod locks;

#[cfg(test)]
mod tests;

use crate::actions::ActionExecutor;
use crate::guards::{GuardInput, GuardLimits};
use crate::registry::OrderRegistry;
use crate::session::{SessionError, SessionStore};
use crate::state::{self, Target};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use wizard_clients::{ClientError, ClientService};
use wizard_config::Config;
use wizard_legal::LegalService;
use wizard_pricing::PricingService;
use wizard_receipt::ReceiptService;
use wizard_storage::StorageService;
use wizard_types::{
	current_timestamp, new_id, truncate_id, Client, EngineEvent, FailureKind, NewClient,
	SubmitOutcome, SubmitResponse, TransitionOutcome, WizardEvent, WizardFailure,
	WizardInstance, WizardSnapshot, WizardState,
};

use event_bus::EventBus;
use locks::LockTable;

#[derive(Debug, Error)]
pub enum WizardError {
	#[error("Event {event} is not allowed at {state}")]
	InvalidTransition { state: String, event: WizardEvent },
	#[error("Wizard {0} is busy with another request")]
	ConcurrencyConflict(String),
	#[error("Persistence error: {0}")]
	Persistence(String),
	#[error("Wizard not found: {0}")]
	NotFound(String),
}

impl From<SessionError> for WizardError {
	fn from(e: SessionError) -> Self {
		match e {
			SessionError::NotFound(id) => WizardError::NotFound(id),
			SessionError::Storage(message) => WizardError::Persistence(message),
		}
	}
}

#[derive(Clone)]
pub struct WizardEngine {
	pub(crate) config: Config,
	pub(crate) storage: Arc<StorageService>,
	pub(crate) sessions: Arc<SessionStore>,
	pub(crate) orders: Arc<OrderRegistry>,
	clients: Arc<ClientService>,
	executor: Arc<ActionExecutor>,
	pub(crate) locks: Arc<LockTable>,
	limits: GuardLimits,
	event_bus: EventBus,
}

impl WizardEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		clients: Arc<ClientService>,
		pricing: Arc<PricingService>,
		legal: Arc<LegalService>,
		receipt: Arc<ReceiptService>,
		event_bus: EventBus,
	) -> Self {
		let sessions = Arc::new(SessionStore::new(storage.clone()));
		let orders = Arc::new(OrderRegistry::new(storage.clone()));
		let executor = Arc::new(ActionExecutor::new(
			clients.clone(),
			pricing,
			legal,
			receipt,
			orders.clone(),
			Duration::from_millis(config.wizard.collaborator_timeout_ms),
		));
		let locks = Arc::new(LockTable::new(
			config.wizard.lock_mode,
			Duration::from_millis(config.wizard.lock_wait_timeout_ms),
		));
		let limits = GuardLimits {
			max_items_per_order: config.wizard.max_items_per_order,
		};

		Self {
			config,
			storage,
			sessions,
			orders,
			clients,
			executor,
			locks,
			limits,
			event_bus,
		}
	}

	/// Starts a new wizard and returns its first snapshot.
	#[instrument(skip_all)]
	pub async fn create(&self) -> Result<WizardSnapshot, WizardError> {
		let mut instance = WizardInstance::new(new_id());
		let _lock = self
			.locks
			.acquire(&instance.id)
			.await
			.map_err(|_| WizardError::ConcurrencyConflict(instance.id.clone()))?;

		let outcome = self
			.apply(&mut instance, WizardEvent::StartOrder, &Value::Null)
			.await?;
		if !outcome.is_accepted() {
			return Err(WizardError::Persistence(format!(
				"Wizard could not be started: {:?}",
				outcome
			)));
		}
		self.sessions.save(&instance).await?;

		tracing::info!(wizard_id = %truncate_id(&instance.id), "Wizard created");
		self.event_bus
			.publish(EngineEvent::Created {
				wizard_id: instance.id.clone(),
			})
			.ok();
		self.publish_last(&instance);
		Ok(instance.snapshot())
	}

	/// Submits one event to the wizard `id`.
	///
	/// Guard rejections and action failures are returned as outcomes; the
	/// errors are invalid transitions, lock conflicts, unknown ids and
	/// storage failures.
	#[instrument(skip_all, fields(wizard_id = %truncate_id(id), event = %event))]
	pub async fn submit(
		&self,
		id: &str,
		event: WizardEvent,
		payload: Value,
	) -> Result<SubmitResponse, WizardError> {
		let _lock = self.locks.acquire(id).await.map_err(|_| {
			tracing::debug!("Wizard busy");
			WizardError::ConcurrencyConflict(id.to_string())
		})?;

		let mut instance = self.sessions.load(id).await?;
		let recorded = instance.history.len();
		let result = self.apply(&mut instance, event, &payload).await;

		if instance.history.len() > recorded {
			self.sessions.save(&instance).await?;
			self.publish_last(&instance);
		}

		let outcome = result?;
		Ok(SubmitResponse {
			wizard_id: instance.id.clone(),
			state: instance.state,
			step: instance.step_label(),
			context: instance.context,
			outcome,
		})
	}

	/// Read-only view of a wizard.
	pub async fn snapshot(&self, id: &str) -> Result<WizardSnapshot, WizardError> {
		Ok(self.sessions.load(id).await?.snapshot())
	}

	/// Client search for the client selection screen.
	pub async fn search_clients(&self, query: &str, limit: usize) -> Result<Vec<Client>, WizardError> {
		self.clients
			.search_clients(query, limit)
			.await
			.map_err(|e| WizardError::Persistence(e.to_string()))
	}

	/// Registers a new client so it can be selected at `CLIENT_SELECTION`.
	pub async fn create_client(&self, client: NewClient) -> Result<Client, ClientError> {
		self.clients.create_client(client).await
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	/// Resolves and applies one event to an instance in memory.
	async fn apply(
		&self,
		instance: &mut WizardInstance,
		event: WizardEvent,
		payload: &Value,
	) -> Result<SubmitOutcome, WizardError> {
		let from = instance.step_label();
		if instance.is_terminal() {
			return Err(WizardError::InvalidTransition { state: from, event });
		}

		let Some(transition) = state::resolve(instance.state, instance.context.item_step(), event)
		else {
			tracing::debug!(from = %from, "Invalid transition");
			instance.record(from.clone(), event, TransitionOutcome::InvalidTransition);
			return Err(WizardError::InvalidTransition { state: from, event });
		};

		if let Some(guard) = transition.guard {
			let input = GuardInput {
				state: instance.state,
				event,
				context: &instance.context,
				payload,
				limits: &self.limits,
			};
			match guard(&input) {
				Ok(verdict) if verdict.allowed => {},
				Ok(verdict) => {
					let reason = verdict.reason.unwrap_or_else(|| "Rejected".to_string());
					tracing::info!(from = %from, reason = %reason, "Guard rejected");
					return Ok(fail(instance, from, event, SubmitOutcome::GuardRejected { reason }));
				},
				Err(e) => {
					tracing::error!(from = %from, error = %e, "Guard failed");
					let outcome = SubmitOutcome::ActionFailed {
						action: "guard".to_string(),
						reason: e.to_string(),
					};
					return Ok(fail(instance, from, event, outcome));
				},
			}
		}

		let mut context = match transition.action {
			Some(action) => {
				match self
					.executor
					.execute(action, &instance.id, &instance.context, payload)
					.await
				{
					Ok(context) => context,
					Err(e) => {
						tracing::warn!(from = %from, action = %action, error = %e, "Action failed");
						let outcome = SubmitOutcome::ActionFailed {
							action: action.to_string(),
							reason: e.to_string(),
						};
						return Ok(fail(instance, from, event, outcome));
					},
				}
			},
			None => instance.context.clone(),
		};
		context.last_error = None;

		match transition.target {
			Target::State(next) => instance.state = next,
			Target::Step(step) => match context.item_wizard.as_mut() {
				Some(session) => session.step = step,
				None => {
					let outcome = SubmitOutcome::ActionFailed {
						action: "enter_step".to_string(),
						reason: format!("No item in progress for step {}", step),
					};
					return Ok(fail(instance, from, event, outcome));
				},
			},
			Target::Stay => {},
		}
		instance.context = context;
		instance.record(from.clone(), event, TransitionOutcome::Accepted);

		tracing::info!(from = %from, to = %instance.step_label(), "Transition accepted");
		Ok(SubmitOutcome::Accepted)
	}

	fn publish_last(&self, instance: &WizardInstance) {
		let Some(entry) = instance.history.last() else {
			return;
		};
		self.event_bus
			.publish(EngineEvent::Transition {
				wizard_id: instance.id.clone(),
				from: entry.from.clone(),
				event: entry.event,
				to: entry.to.clone(),
				outcome: entry.outcome.clone(),
			})
			.ok();

		if entry.outcome != TransitionOutcome::Accepted {
			return;
		}
		match (instance.state, &instance.context.order_id) {
			(WizardState::Completed, Some(order_id)) => {
				self.event_bus
					.publish(EngineEvent::Completed {
						wizard_id: instance.id.clone(),
						order_id: order_id.clone(),
					})
					.ok();
			},
			(WizardState::Cancelled, _) => {
				self.event_bus
					.publish(EngineEvent::Cancelled {
						wizard_id: instance.id.clone(),
					})
					.ok();
			},
			_ => {},
		}
	}
}

/// Records a rejected or failed transition; state and context stay as they
/// were apart from `last_error`.
fn fail(
	instance: &mut WizardInstance,
	from: String,
	event: WizardEvent,
	outcome: SubmitOutcome,
) -> SubmitOutcome {
	let (kind, action, message) = match &outcome {
		SubmitOutcome::GuardRejected { reason } => (FailureKind::GuardRejected, None, reason.clone()),
		SubmitOutcome::ActionFailed { action, reason } => {
			(FailureKind::ActionFailed, Some(action.clone()), reason.clone())
		},
		SubmitOutcome::Accepted => return outcome,
	};
	instance.context.last_error = Some(WizardFailure {
		kind,
		event,
		action,
		message,
		at: current_timestamp(),
	});
	instance.record(from, event, outcome.clone().into());
	outcome
}
