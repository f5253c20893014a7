//! Scenario tests driving the engine through its public API.

use super::*;
use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use wizard_clients::{ClientError, ClientLookupInterface};
use wizard_config::builders::ConfigBuilder;
use wizard_config::LockMode;
use wizard_legal::implementations::basic::{BasicSignature, BasicSignatureConfig};
use wizard_pricing::implementations::price_list::PriceListPricing;
use wizard_receipt::implementations::text::{TextReceipt, TextReceiptConfig};
use wizard_storage::implementations::memory::MemoryStorage;
use wizard_types::{
	ConfigSchema, DraftItem, ItemStep, ItemWizardMode, ItemWizardSession, NewClient, StorageKey,
};

mock! {
	pub Clients {}

	#[async_trait]
	impl ClientLookupInterface for Clients {
		fn config_schema(&self) -> Box<dyn ConfigSchema>;
		async fn find_client(&self, client_id: &str) -> Result<Client, ClientError>;
		async fn search_clients(&self, query: &str, limit: usize) -> Result<Vec<Client>, ClientError>;
		async fn create_client(&self, client: NewClient) -> Result<Client, ClientError>;
	}
}

/// Answers after a fixed delay, for lock and timeout scenarios.
struct SlowClients {
	delay: Duration,
}

#[async_trait]
impl ClientLookupInterface for SlowClients {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		unimplemented!()
	}

	async fn find_client(&self, client_id: &str) -> Result<Client, ClientError> {
		tokio::time::sleep(self.delay).await;
		Ok(Client {
			id: client_id.to_string(),
			..olena()
		})
	}

	async fn search_clients(&self, _query: &str, _limit: usize) -> Result<Vec<Client>, ClientError> {
		Ok(vec![])
	}

	async fn create_client(&self, client: NewClient) -> Result<Client, ClientError> {
		Err(ClientError::Duplicate(client.phone))
	}
}

fn olena() -> Client {
	Client {
		id: "c-001".into(),
		first_name: "Olena".into(),
		last_name: "Koval".into(),
		phone: "+380501112233".into(),
		email: None,
	}
}

fn known_clients() -> MockClients {
	let mut clients = MockClients::new();
	clients.expect_find_client().returning(|id| {
		if id == "c-001" {
			Ok(olena())
		} else {
			Err(ClientError::NotFound(id.to_string()))
		}
	});
	clients
}

fn engine_with(clients: Arc<dyn ClientLookupInterface>, config: Config) -> WizardEngine {
	let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
	WizardEngine::new(
		config,
		storage,
		Arc::new(ClientService::single("test", clients)),
		Arc::new(PricingService::single(
			"price_list",
			Arc::new(PriceListPricing::with_defaults()),
		)),
		Arc::new(LegalService::single(
			"basic",
			Arc::new(BasicSignature::new(BasicSignatureConfig::default())),
		)),
		Arc::new(ReceiptService::single(
			"text",
			Arc::new(TextReceipt::new(TextReceiptConfig::default())),
		)),
		EventBus::new(256),
	)
}

fn engine() -> WizardEngine {
	engine_with(Arc::new(known_clients()), ConfigBuilder::new().build())
}

async fn send(engine: &WizardEngine, id: &str, event: WizardEvent, payload: Value) -> SubmitResponse {
	let response = engine.submit(id, event, payload).await.unwrap();
	assert!(
		response.outcome.is_accepted(),
		"{} rejected: {:?}",
		event,
		response.outcome
	);
	response
}

/// Runs a wizard up to `ITEM_MANAGEMENT` with an empty order.
async fn to_item_management(engine: &WizardEngine) -> String {
	let id = engine.create().await.unwrap().wizard_id;
	send(engine, &id, WizardEvent::ClientSelected, json!({ "client_id": "c-001" })).await;
	send(
		engine,
		&id,
		WizardEvent::OrderInfoCompleted,
		json!({ "tag_number": "TAG-001", "branch_id": "main" }),
	)
	.await;
	id
}

/// Composes one coat through the sub-wizard, skipping photos.
async fn add_coat(engine: &WizardEngine, id: &str) -> SubmitResponse {
	send(engine, id, WizardEvent::AddItem, Value::Null).await;
	send(
		engine,
		id,
		WizardEvent::BasicInfoCompleted,
		json!({ "category_code": "CLOTHING", "item_name": "Coat", "quantity": 1, "unit": "pieces" }),
	)
	.await;
	send(
		engine,
		id,
		WizardEvent::CharacteristicsCompleted,
		json!({ "material": "Wool", "color": "Black", "wear_level": 30 }),
	)
	.await;
	send(engine, id, WizardEvent::DefectsCompleted, json!({ "stains": ["wine"] })).await;
	send(engine, id, WizardEvent::PricingCompleted, json!({ "modifiers": ["MANUAL_CLEANING"] })).await;
	send(engine, id, WizardEvent::SkipPhotos, Value::Null).await;
	send(engine, id, WizardEvent::ItemAdded, Value::Null).await
}

/// Drives an order with committed items from `ITEM_MANAGEMENT` to
/// `RECEIPT_GENERATION`.
async fn to_receipt_generation(engine: &WizardEngine, id: &str) -> SubmitResponse {
	send(engine, id, WizardEvent::ItemsCompleted, Value::Null).await;
	send(engine, id, WizardEvent::ExecutionParamsSet, json!({ "urgency": "URGENT_48H" })).await;
	send(engine, id, WizardEvent::DiscountsApplied, json!({ "kind": "EVERCARD" })).await;
	send(
		engine,
		id,
		WizardEvent::PaymentProcessed,
		json!({ "method": "CASH", "prepayment": "88" }),
	)
	.await;
	send(
		engine,
		id,
		WizardEvent::AdditionalInfoCompleted,
		json!({ "order_notes": "Call before delivery" }),
	)
	.await;
	send(engine, id, WizardEvent::ReviewOrder, Value::Null).await;
	send(engine, id, WizardEvent::OrderApproved, Value::Null).await;
	send(
		engine,
		id,
		WizardEvent::TermsAccepted,
		json!({ "signature_data": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg", "terms_accepted": true }),
	)
	.await
}

async fn stored_instance(engine: &WizardEngine, id: &str) -> WizardInstance {
	engine.sessions.load(id).await.unwrap()
}

#[tokio::test]
async fn test_create_starts_at_client_selection() {
	let engine = engine();
	let snapshot = engine.create().await.unwrap();

	assert_eq!(snapshot.state, WizardState::ClientSelection);
	assert!(snapshot.context.started_at.is_some());
	assert_eq!(snapshot.history.len(), 1);
	assert_eq!(snapshot.history[0].from, "INITIAL");
	assert_eq!(snapshot.history[0].event, WizardEvent::StartOrder);
	assert_eq!(snapshot.history[0].to, "CLIENT_SELECTION");
	assert!(engine.sessions.exists(&snapshot.wizard_id).await.unwrap());
}

#[tokio::test]
async fn test_unknown_wizard_is_not_found() {
	let engine = engine();
	assert!(matches!(
		engine.submit("missing", WizardEvent::GoBack, Value::Null).await,
		Err(WizardError::NotFound(_))
	));
	assert!(matches!(engine.snapshot("missing").await, Err(WizardError::NotFound(_))));
}

#[tokio::test]
async fn test_undefined_pair_is_invalid_and_recorded() {
	let engine = engine();
	let id = engine.create().await.unwrap().wizard_id;
	let before = stored_instance(&engine, &id).await;

	let err = engine
		.submit(&id, WizardEvent::PaymentProcessed, Value::Null)
		.await
		.unwrap_err();
	assert!(matches!(
		err,
		WizardError::InvalidTransition { ref state, event: WizardEvent::PaymentProcessed } if state == "CLIENT_SELECTION"
	));

	let after = stored_instance(&engine, &id).await;
	assert_eq!(after.state, before.state);
	assert_eq!(after.context, before.context);
	assert_eq!(after.history.len(), before.history.len() + 1);
	assert_eq!(
		after.history.last().unwrap().outcome,
		TransitionOutcome::InvalidTransition
	);
}

#[tokio::test]
async fn test_undefined_pairs_leave_instance_untouched() {
	let engine = engine();
	let mut positions: Vec<(WizardState, Option<ItemStep>)> =
		WizardState::ALL.iter().map(|state| (*state, None)).collect();
	positions.extend(
		[
			ItemStep::BasicInfo,
			ItemStep::Characteristics,
			ItemStep::DefectsStains,
			ItemStep::Pricing,
			ItemStep::Photos,
			ItemStep::ItemComplete,
		]
		.map(|step| (WizardState::ItemManagement, Some(step))),
	);

	let mut checked = 0;
	for (state, step) in positions {
		for event in WizardEvent::ALL {
			if crate::state::resolve(state, step, event).is_some() {
				continue;
			}
			let mut instance = WizardInstance::new(new_id());
			instance.state = state;
			instance.context.item_wizard = step.map(|step| ItemWizardSession {
				step,
				mode: ItemWizardMode::Add,
				draft: DraftItem::default(),
			});
			engine.sessions.save(&instance).await.unwrap();
			let label = instance.step_label();

			let result = engine.submit(&instance.id, event, Value::Null).await;
			assert!(
				matches!(
					result,
					Err(WizardError::InvalidTransition { ref state, event: rejected })
						if *state == label && rejected == event
				),
				"{} at {}: {:?}",
				event,
				label,
				result.map(|response| response.outcome)
			);

			let after = stored_instance(&engine, &instance.id).await;
			assert_eq!(after.state, instance.state, "{} at {}", event, label);
			assert_eq!(after.context, instance.context, "{} at {}", event, label);
			checked += 1;
		}
	}
	assert!(checked > WizardState::ALL.len() * 20);
}

#[tokio::test]
async fn test_cancel_from_every_active_state() {
	let engine = engine();
	for state in WizardState::ALL {
		if state.is_terminal() || state == WizardState::Initial {
			continue;
		}
		let mut instance = WizardInstance::new(new_id());
		instance.state = state;
		engine.sessions.save(&instance).await.unwrap();

		let response = send(&engine, &instance.id, WizardEvent::CancelOrder, Value::Null).await;
		assert_eq!(response.state, WizardState::Cancelled, "from {}", state);

		let history = stored_instance(&engine, &instance.id).await.history;
		for event in [WizardEvent::StartOrder, WizardEvent::GoBack, WizardEvent::CancelOrder] {
			assert!(matches!(
				engine.submit(&instance.id, event, Value::Null).await,
				Err(WizardError::InvalidTransition { .. })
			));
		}
		assert_eq!(stored_instance(&engine, &instance.id).await.history, history);
	}
}

#[tokio::test]
async fn test_cancel_inside_item_wizard_discards_draft() {
	let engine = engine();
	let id = to_item_management(&engine).await;
	send(&engine, &id, WizardEvent::AddItem, Value::Null).await;

	let response = send(&engine, &id, WizardEvent::CancelOrder, Value::Null).await;
	assert_eq!(response.state, WizardState::Cancelled);
	assert!(response.context.item_wizard.is_none());
	let last = stored_instance(&engine, &id).await.history.pop().unwrap();
	assert_eq!(last.from, "ITEM_MANAGEMENT/BASIC_INFO");
	assert_eq!(last.to, "CANCELLED");
}

#[tokio::test]
async fn test_item_flow_commits_one_item() {
	let engine = engine();
	let id = to_item_management(&engine).await;

	let entered = send(&engine, &id, WizardEvent::AddItem, Value::Null).await;
	assert_eq!(entered.step, "ITEM_MANAGEMENT/BASIC_INFO");
	send(&engine, &id, WizardEvent::CancelItemWizard, Value::Null).await;

	let response = add_coat(&engine, &id).await;
	assert_eq!(response.state, WizardState::ItemManagement);
	assert_eq!(response.step, "ITEM_MANAGEMENT");
	assert!(response.context.item_wizard.is_none());
	assert!(response.context.draft_item().is_none());
	assert_eq!(response.context.committed_items.len(), 1);

	let item = &response.context.committed_items[0];
	assert_eq!(item.item_name, "Coat");
	assert_eq!(item.pricing.final_total, rust_decimal::Decimal::from(420));
	assert_eq!(
		response.context.totals.as_ref().unwrap().total,
		rust_decimal::Decimal::from(420)
	);
}

#[tokio::test]
async fn test_items_completed_needs_items() {
	let engine = engine();
	let id = to_item_management(&engine).await;

	let response = engine
		.submit(&id, WizardEvent::ItemsCompleted, Value::Null)
		.await
		.unwrap();
	assert_eq!(
		response.outcome,
		SubmitOutcome::GuardRejected {
			reason: "no items".into()
		}
	);
	assert_eq!(response.state, WizardState::ItemManagement);
	let failure = response.context.last_error.unwrap();
	assert_eq!(failure.kind, FailureKind::GuardRejected);

	add_coat(&engine, &id).await;
	let response = send(&engine, &id, WizardEvent::ItemsCompleted, Value::Null).await;
	assert_eq!(response.state, WizardState::ExecutionParams);
	assert!(response.context.last_error.is_none());
}

#[tokio::test]
async fn test_recalculate_price_is_idempotent() {
	let engine = engine();
	let id = to_item_management(&engine).await;
	send(&engine, &id, WizardEvent::AddItem, Value::Null).await;
	send(
		&engine,
		&id,
		WizardEvent::BasicInfoCompleted,
		json!({ "category_code": "LEATHER", "item_name": "Jacket", "quantity": 2, "unit": "pieces" }),
	)
	.await;
	send(
		&engine,
		&id,
		WizardEvent::CharacteristicsCompleted,
		json!({ "material": "Leather", "color": "Brown", "wear_level": 0 }),
	)
	.await;
	send(&engine, &id, WizardEvent::DefectsCompleted, Value::Null).await;

	let first = send(&engine, &id, WizardEvent::RecalculatePrice, Value::Null).await;
	let second = send(&engine, &id, WizardEvent::RecalculatePrice, Value::Null).await;

	assert_eq!(first.step, "ITEM_MANAGEMENT/PRICING");
	assert_eq!(second.step, first.step);
	let pricing = second.context.draft_item().unwrap().pricing.clone().unwrap();
	assert_eq!(Some(&pricing), first.context.draft_item().unwrap().pricing.as_ref());
	assert_eq!(pricing.base_total, rust_decimal::Decimal::from(1800));
}

#[tokio::test]
async fn test_go_back_from_item_complete_lands_on_pricing() {
	let engine = engine();
	let id = to_item_management(&engine).await;
	send(&engine, &id, WizardEvent::AddItem, Value::Null).await;

	let left = send(&engine, &id, WizardEvent::GoBack, Value::Null).await;
	assert_eq!(left.step, "ITEM_MANAGEMENT");
	assert!(left.context.item_wizard.is_none());
	assert!(left.context.committed_items.is_empty());

	send(&engine, &id, WizardEvent::AddItem, Value::Null).await;
	send(
		&engine,
		&id,
		WizardEvent::BasicInfoCompleted,
		json!({ "category_code": "CLOTHING", "item_name": "Dress", "quantity": 1, "unit": "pieces" }),
	)
	.await;
	send(
		&engine,
		&id,
		WizardEvent::CharacteristicsCompleted,
		json!({ "material": "Silk", "color": "Red", "wear_level": 10 }),
	)
	.await;
	send(&engine, &id, WizardEvent::DefectsCompleted, Value::Null).await;
	send(&engine, &id, WizardEvent::PricingCompleted, Value::Null).await;
	let skipped = send(&engine, &id, WizardEvent::SkipPhotos, Value::Null).await;
	assert_eq!(skipped.step, "ITEM_MANAGEMENT/ITEM_COMPLETE");

	let back = send(&engine, &id, WizardEvent::GoBack, Value::Null).await;
	assert_eq!(back.step, "ITEM_MANAGEMENT/PRICING");
	let draft = back.context.draft_item().unwrap();
	assert_eq!(draft.item_name.as_deref(), Some("Dress"));
	assert!(draft.photos_skipped);
}

#[tokio::test]
async fn test_edit_item_replaces_by_id() {
	let engine = engine();
	let id = to_item_management(&engine).await;
	let added = add_coat(&engine, &id).await;
	let item_id = added.context.committed_items[0].id.clone();

	let editing = send(&engine, &id, WizardEvent::EditItem, json!({ "item_id": item_id })).await;
	assert_eq!(editing.context.draft_item().unwrap().item_name.as_deref(), Some("Coat"));

	send(&engine, &id, WizardEvent::BasicInfoCompleted, json!({ "quantity": 3 })).await;
	send(&engine, &id, WizardEvent::CharacteristicsCompleted, Value::Null).await;
	send(&engine, &id, WizardEvent::DefectsCompleted, Value::Null).await;
	send(&engine, &id, WizardEvent::PricingCompleted, Value::Null).await;
	send(&engine, &id, WizardEvent::SkipPhotos, Value::Null).await;
	let response = send(&engine, &id, WizardEvent::ItemAdded, Value::Null).await;

	assert_eq!(response.context.committed_items.len(), 1);
	let item = &response.context.committed_items[0];
	assert_eq!(item.id, item_id);
	assert_eq!(item.quantity, 3);
	assert_eq!(item.stains, vec!["wine".to_string()]);
}

#[tokio::test]
async fn test_delete_item_recomputes_totals() {
	let engine = engine();
	let id = to_item_management(&engine).await;
	add_coat(&engine, &id).await;
	let response = add_coat(&engine, &id).await;
	assert_eq!(response.context.committed_items.len(), 2);
	let first = response.context.committed_items[0].id.clone();

	let missing = engine
		.submit(&id, WizardEvent::DeleteItem, json!({ "item_id": "nope" }))
		.await
		.unwrap();
	assert!(matches!(missing.outcome, SubmitOutcome::GuardRejected { .. }));

	let response = send(&engine, &id, WizardEvent::DeleteItem, json!({ "item_id": first })).await;
	assert_eq!(response.state, WizardState::ItemManagement);
	assert_eq!(response.context.committed_items.len(), 1);
	assert_eq!(
		response.context.totals.unwrap().items_subtotal,
		rust_decimal::Decimal::from(420)
	);
}

#[tokio::test]
async fn test_item_limit_is_enforced() {
	let config = ConfigBuilder::new().max_items_per_order(1).build();
	let engine = engine_with(Arc::new(known_clients()), config);
	let id = to_item_management(&engine).await;
	add_coat(&engine, &id).await;

	let response = engine
		.submit(&id, WizardEvent::StartItemWizard, Value::Null)
		.await
		.unwrap();
	assert!(matches!(response.outcome, SubmitOutcome::GuardRejected { .. }));
	assert_eq!(response.step, "ITEM_MANAGEMENT");
}

#[tokio::test]
async fn test_unknown_client_is_action_failure() {
	let engine = engine();
	let id = engine.create().await.unwrap().wizard_id;

	let response = engine
		.submit(&id, WizardEvent::ClientSelected, json!({ "client_id": "c-404" }))
		.await
		.unwrap();
	match &response.outcome {
		SubmitOutcome::ActionFailed { action, reason } => {
			assert_eq!(action, "select_client");
			assert!(reason.contains("c-404"));
		},
		other => panic!("unexpected outcome {:?}", other),
	}
	assert_eq!(response.state, WizardState::ClientSelection);
	assert!(response.context.client.is_none());

	let retry = send(&engine, &id, WizardEvent::ClientSelected, json!({ "client_id": "c-001" })).await;
	assert_eq!(retry.state, WizardState::OrderInitialization);
	assert!(retry.context.last_error.is_none());
}

#[tokio::test]
async fn test_created_client_can_be_selected() {
	let mut clients = known_clients();
	clients
		.expect_create_client()
		.times(1)
		.returning(|client| {
			Ok(Client {
				id: "c-001".into(),
				first_name: client.first_name,
				last_name: client.last_name,
				phone: client.phone,
				email: client.email,
			})
		});
	let engine = engine_with(Arc::new(clients), ConfigBuilder::new().build());

	let invalid = engine
		.create_client(NewClient {
			first_name: "Olena".into(),
			last_name: "Koval".into(),
			phone: "12".into(),
			email: None,
		})
		.await;
	assert!(matches!(invalid, Err(ClientError::Invalid(_))));

	let created = engine
		.create_client(NewClient {
			first_name: "Olena".into(),
			last_name: "Koval".into(),
			phone: "+380501112233".into(),
			email: None,
		})
		.await
		.unwrap();
	let id = engine.create().await.unwrap().wizard_id;
	let selected = send(&engine, &id, WizardEvent::ClientSelected, json!({ "client_id": created.id })).await;
	assert_eq!(selected.state, WizardState::OrderInitialization);
}

#[tokio::test]
async fn test_collaborator_timeout_releases_lock() {
	let config = ConfigBuilder::new().collaborator_timeout_ms(20).build();
	let slow = SlowClients {
		delay: Duration::from_millis(500),
	};
	let engine = engine_with(Arc::new(slow), config);
	let id = engine.create().await.unwrap().wizard_id;

	let response = engine
		.submit(&id, WizardEvent::ClientSelected, json!({ "client_id": "c-001" }))
		.await
		.unwrap();
	match &response.outcome {
		SubmitOutcome::ActionFailed { action, reason } => {
			assert_eq!(action, "select_client");
			assert!(reason.contains("20ms"));
		},
		other => panic!("unexpected outcome {:?}", other),
	}
	assert_eq!(response.state, WizardState::ClientSelection);

	let back = send(&engine, &id, WizardEvent::GoBack, Value::Null).await;
	assert_eq!(back.state, WizardState::Initial);
}

#[tokio::test]
async fn test_concurrent_submit_fail_fast() {
	let slow = SlowClients {
		delay: Duration::from_millis(200),
	};
	let engine = engine_with(Arc::new(slow), ConfigBuilder::new().build());
	let id = engine.create().await.unwrap().wizard_id;

	let (first, second) = tokio::join!(
		engine.submit(&id, WizardEvent::ClientSelected, json!({ "client_id": "c-001" })),
		async {
			tokio::time::sleep(Duration::from_millis(30)).await;
			engine.submit(&id, WizardEvent::GoBack, Value::Null).await
		}
	);

	assert!(first.unwrap().outcome.is_accepted());
	assert!(matches!(second, Err(WizardError::ConcurrencyConflict(ref busy)) if busy == &id));

	let events: Vec<_> = stored_instance(&engine, &id)
		.await
		.history
		.iter()
		.map(|entry| entry.event)
		.collect();
	assert_eq!(events, vec![WizardEvent::StartOrder, WizardEvent::ClientSelected]);
}

#[tokio::test]
async fn test_concurrent_submit_wait_applies_to_new_state() {
	let slow = SlowClients {
		delay: Duration::from_millis(100),
	};
	let config = ConfigBuilder::new()
		.lock_mode(LockMode::Wait)
		.lock_wait_timeout_ms(2_000)
		.build();
	let engine = engine_with(Arc::new(slow), config);
	let id = engine.create().await.unwrap().wizard_id;

	let (first, second) = tokio::join!(
		engine.submit(&id, WizardEvent::ClientSelected, json!({ "client_id": "c-001" })),
		async {
			tokio::time::sleep(Duration::from_millis(20)).await;
			engine.submit(&id, WizardEvent::GoBack, Value::Null).await
		}
	);

	assert!(first.unwrap().outcome.is_accepted());
	let second = second.unwrap();
	assert_eq!(second.state, WizardState::ClientSelection);

	let history = stored_instance(&engine, &id).await.history;
	let steps: Vec<_> = history
		.iter()
		.map(|entry| (entry.from.as_str(), entry.to.as_str()))
		.collect();
	assert_eq!(
		steps,
		vec![
			("INITIAL", "CLIENT_SELECTION"),
			("CLIENT_SELECTION", "ORDER_INITIALIZATION"),
			("ORDER_INITIALIZATION", "CLIENT_SELECTION"),
		]
	);
}

#[tokio::test]
async fn test_terms_need_signature() {
	let engine = engine();
	let mut instance = WizardInstance::new(new_id());
	instance.state = WizardState::LegalAspects;
	engine.sessions.save(&instance).await.unwrap();

	let response = engine
		.submit(
			&instance.id,
			WizardEvent::TermsAccepted,
			json!({ "signature_data": "", "terms_accepted": true }),
		)
		.await
		.unwrap();
	assert_eq!(
		response.outcome,
		SubmitOutcome::GuardRejected {
			reason: "signature required".into()
		}
	);
	assert_eq!(response.state, WizardState::LegalAspects);
}

#[tokio::test]
async fn test_guard_error_surfaces_as_action_failure() {
	let engine = engine();
	let mut instance = WizardInstance::new(new_id());
	instance.state = WizardState::ReceiptGeneration;
	engine.sessions.save(&instance).await.unwrap();

	let response = engine
		.submit(&instance.id, WizardEvent::ReceiptGenerated, Value::Null)
		.await
		.unwrap();
	assert_eq!(
		response.outcome,
		SubmitOutcome::ActionFailed {
			action: "guard".into(),
			reason: "Required context missing: summary".into()
		}
	);
	assert_eq!(response.state, WizardState::ReceiptGeneration);
}

#[tokio::test]
async fn test_full_order_reaches_completed() {
	let engine = engine();
	let mut events = engine.event_bus().subscribe();
	let id = to_item_management(&engine).await;
	add_coat(&engine, &id).await;

	send(&engine, &id, WizardEvent::ItemsCompleted, Value::Null).await;
	send(&engine, &id, WizardEvent::ExecutionParamsSet, json!({ "urgency": "URGENT_48H" })).await;
	let discounted = send(&engine, &id, WizardEvent::DiscountsApplied, json!({ "kind": "EVERCARD" })).await;
	let totals = discounted.context.totals.unwrap();
	// 420 - 10% + 50% of 420
	assert_eq!(totals.total, rust_decimal::Decimal::from(588));

	send(
		&engine,
		&id,
		WizardEvent::PaymentProcessed,
		json!({ "method": "CASH", "prepayment": "88" }),
	)
	.await;
	send(
		&engine,
		&id,
		WizardEvent::AdditionalInfoCompleted,
		json!({ "order_notes": "Call before delivery" }),
	)
	.await;
	let review = send(&engine, &id, WizardEvent::ReviewOrder, Value::Null).await;
	assert_eq!(review.context.summary.as_ref().unwrap().payment.balance_due, rust_decimal::Decimal::from(500));
	send(&engine, &id, WizardEvent::OrderApproved, Value::Null).await;
	send(
		&engine,
		&id,
		WizardEvent::TermsAccepted,
		json!({ "signature_data": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg", "terms_accepted": true }),
	)
	.await;

	let early = engine
		.submit(&id, WizardEvent::ReceiptGenerated, Value::Null)
		.await
		.unwrap();
	assert_eq!(
		early.outcome,
		SubmitOutcome::GuardRejected {
			reason: "receipt not generated".into()
		}
	);

	let receipt = send(&engine, &id, WizardEvent::GenerateReceipt, json!({ "copies": 2 })).await;
	assert_eq!(receipt.state, WizardState::ReceiptGeneration);
	assert!(receipt.context.receipt.as_ref().unwrap().body.contains("[Copy 2/2]"));

	let done = send(&engine, &id, WizardEvent::ReceiptGenerated, Value::Null).await;
	assert_eq!(done.state, WizardState::Completed);
	let order_id = done.context.order_id.clone().unwrap();

	let record = engine.orders.get_order(&order_id).await.unwrap();
	assert_eq!(record.wizard_id, id);
	assert_eq!(record.summary.items.len(), 1);
	assert!(engine.storage.exists(StorageKey::Orders, &order_id).await.unwrap());

	let history = stored_instance(&engine, &id).await.history;
	assert!(matches!(
		engine.submit(&id, WizardEvent::CancelOrder, Value::Null).await,
		Err(WizardError::InvalidTransition { .. })
	));
	assert_eq!(stored_instance(&engine, &id).await.history, history);

	let mut completed = None;
	while let Ok(event) = events.try_recv() {
		if let EngineEvent::Completed { order_id, .. } = event {
			completed = Some(order_id);
		}
	}
	assert_eq!(completed, Some(order_id));
}

#[tokio::test]
async fn test_changed_order_needs_new_receipt() {
	let engine = engine();
	let id = to_item_management(&engine).await;
	add_coat(&engine, &id).await;
	to_receipt_generation(&engine, &id).await;
	let printed = send(&engine, &id, WizardEvent::GenerateReceipt, json!({ "copies": 1 })).await;
	let first_receipt = printed.context.receipt.unwrap();

	let mut back = printed.step;
	for _ in 0..8 {
		back = send(&engine, &id, WizardEvent::GoBack, Value::Null).await.step;
	}
	assert_eq!(back, "ITEM_MANAGEMENT");
	add_coat(&engine, &id).await;

	let signed = to_receipt_generation(&engine, &id).await;
	assert_eq!(signed.state, WizardState::ReceiptGeneration);
	assert_eq!(signed.context.summary.as_ref().unwrap().items.len(), 2);
	assert!(signed.context.receipt.is_none());
	assert!(signed.context.receipt_config.is_none());

	let stale = engine
		.submit(&id, WizardEvent::ReceiptGenerated, Value::Null)
		.await
		.unwrap();
	assert_eq!(
		stale.outcome,
		SubmitOutcome::GuardRejected {
			reason: "receipt not generated".into()
		}
	);

	let reprinted = send(&engine, &id, WizardEvent::GenerateReceipt, json!({ "copies": 1 })).await;
	assert_ne!(reprinted.context.receipt.as_ref().unwrap().body, first_receipt.body);

	let done = send(&engine, &id, WizardEvent::ReceiptGenerated, Value::Null).await;
	assert_eq!(done.state, WizardState::Completed);
	let record = engine
		.orders
		.get_order(done.context.order_id.as_ref().unwrap())
		.await
		.unwrap();
	assert_eq!(record.summary.items.len(), 2);
}

#[tokio::test]
async fn test_reload_and_save_keeps_stored_bytes() {
	let engine = engine();
	let id = to_item_management(&engine).await;
	add_coat(&engine, &id).await;
	send(&engine, &id, WizardEvent::AddItem, Value::Null).await;

	let before = engine
		.storage
		.retrieve_bytes(StorageKey::Sessions, &id)
		.await
		.unwrap();
	let instance = stored_instance(&engine, &id).await;
	assert_eq!(instance.context.item_step(), Some(ItemStep::BasicInfo));
	engine.sessions.save(&instance).await.unwrap();
	let after = engine
		.storage
		.retrieve_bytes(StorageKey::Sessions, &id)
		.await
		.unwrap();
	assert_eq!(before, after);
}
