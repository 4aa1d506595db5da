use guardsched::AppError;
use guardsched::database::models::{
    ActivateContractRequest, ContractStatus, DomainEvent, TimeOfDay,
};
use guardsched::services::TemplateImportConsumer;
use pretty_assertions::assert_eq;
use uuid::Uuid;

mod common;

use common::{TestContext, TestDataGenerator, date};

fn activatable(ctx: &TestContext, status: ContractStatus) -> Uuid {
    ctx.store.add_contract(TestDataGenerator::aggregate(
        status,
        vec![TestDataGenerator::location()],
        vec![TestDataGenerator::schedule(
            "Morning",
            TimeOfDay::hm(8, 0),
            TimeOfDay::hm(17, 0),
            9.0,
        )],
    ))
}

#[tokio::test]
async fn activation_end_to_end_produces_one_template() {
    let ctx = TestContext::new();
    let contract_id = activatable(&ctx, ContractStatus::PendingApproval);
    let actor = Uuid::new_v4();

    let result = ctx
        .state
        .contract_lifecycle
        .activate(
            contract_id,
            ActivateContractRequest {
                activated_by: Some(actor),
                manager_id: None,
                notes: Some("Go live".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(result.status, ContractStatus::ScheduleShifts);
    assert_eq!(result.location_count, 1);
    assert_eq!(result.schedule_count, 1);
    assert!(result.event_published);

    let stored = ctx.store.contract(contract_id);
    assert_eq!(stored.status, ContractStatus::ScheduleShifts);
    assert_eq!(stored.activated_by, Some(actor));
    assert_eq!(stored.approved_by, Some(actor));
    assert_eq!(stored.approved_at, stored.activated_at);

    let published = ctx.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, result.event_id);
    let DomainEvent::ContractActivated(event) = &published[0].event else {
        panic!("expected ContractActivated, got {:?}", published[0].event);
    };
    assert_eq!(event.shift_schedules.len(), 1);
    assert_eq!(event.locations.len(), 1);
    assert_eq!(event.activated_by, Some(actor));

    // The consumer side only ever sees the event.
    let (_tx, rx) = tokio::sync::broadcast::channel(1);
    let consumer = TemplateImportConsumer::new(
        ctx.state.template_reconciler.clone(),
        ctx.store.clone(),
        rx,
    );
    consumer.handle(&published[0]).await;

    let templates = ctx.store.live_templates();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].template_code, "MORNING-0800-1700");
    assert!(!templates[0].is_night_shift);
    assert_eq!(templates[0].duration_hours, 9.0);
    assert_eq!(templates[0].contract_id, contract_id);
    assert_eq!(templates[0].created_by, Some(actor));
}

#[tokio::test]
async fn already_approved_contract_keeps_its_approval() {
    let ctx = TestContext::new();
    let contract_id = activatable(&ctx, ContractStatus::Draft);
    let approver = Uuid::new_v4();
    {
        let mut state = ctx.store.state();
        let contract = &mut state.contracts.get_mut(&contract_id).unwrap().contract;
        contract.approved_by = Some(approver);
        contract.approved_at = Some(chrono::Utc::now());
    }

    ctx.state
        .contract_lifecycle
        .activate(contract_id, ActivateContractRequest::default())
        .await
        .unwrap();

    assert_eq!(ctx.store.contract(contract_id).approved_by, Some(approver));
}

#[tokio::test]
async fn rejects_live_or_finished_contracts() {
    for status in [
        ContractStatus::Active,
        ContractStatus::Terminated,
        ContractStatus::Expired,
    ] {
        let ctx = TestContext::new();
        let contract_id = activatable(&ctx, status);

        let result = ctx
            .state
            .contract_lifecycle
            .activate(contract_id, ActivateContractRequest::default())
            .await;

        assert!(
            matches!(result, Err(AppError::Conflict(_))),
            "status {} should be rejected",
            status
        );
        assert_eq!(ctx.store.contract(contract_id).status, status);
        assert_eq!(ctx.store.pending_outbox(), 0);
    }
}

#[tokio::test]
async fn reports_every_failed_precondition_together() {
    let ctx = TestContext::new();
    let mut aggregate = TestDataGenerator::aggregate(ContractStatus::Draft, vec![], vec![]);
    aggregate.contract.start_date = date(2025, 6, 1);
    aggregate.contract.end_date = date(2025, 5, 1);
    let contract_id = ctx.store.add_contract(aggregate);

    let result = ctx
        .state
        .contract_lifecycle
        .activate(contract_id, ActivateContractRequest::default())
        .await;

    match result {
        Err(AppError::Validation(messages)) => assert_eq!(messages.len(), 3),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(ctx.store.contract(contract_id).status, ContractStatus::Draft);
    assert!(ctx.publisher.published().is_empty());
}

#[tokio::test]
async fn missing_contract_is_not_found() {
    let ctx = TestContext::new();

    let result = ctx
        .state
        .contract_lifecycle
        .activate(Uuid::new_v4(), ActivateContractRequest::default())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn unreachable_bus_keeps_event_in_outbox() {
    let ctx = TestContext::new();
    let contract_id = activatable(&ctx, ContractStatus::Draft);
    ctx.publisher.set_failing(true);

    let result = ctx
        .state
        .contract_lifecycle
        .activate(contract_id, ActivateContractRequest::default())
        .await
        .unwrap();

    assert!(!result.event_published);
    assert_eq!(ctx.store.contract(contract_id).status, ContractStatus::ScheduleShifts);
    assert_eq!(ctx.store.pending_outbox(), 1);

    ctx.publisher.set_failing(false);
    let report = ctx.state.outbox_relay.relay_pending().await.unwrap();

    assert_eq!(report.dispatched, 1);
    assert_eq!(ctx.store.pending_outbox(), 0);
    assert_eq!(ctx.publisher.count_of("ContractActivated"), 1);
}

#[tokio::test]
async fn second_activation_is_rejected() {
    let ctx = TestContext::new();
    let contract_id = activatable(&ctx, ContractStatus::Draft);

    ctx.state
        .contract_lifecycle
        .activate(contract_id, ActivateContractRequest::default())
        .await
        .unwrap();
    {
        // Whatever picks up the snapshot moves the contract on to active.
        let mut state = ctx.store.state();
        state.contracts.get_mut(&contract_id).unwrap().contract.status = ContractStatus::Active;
    }

    let again = ctx
        .state
        .contract_lifecycle
        .activate(contract_id, ActivateContractRequest::default())
        .await;

    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(ctx.publisher.count_of("ContractActivated"), 1);
}

#[tokio::test]
async fn lagging_consumer_requeues_dropped_activations() {
    let ctx = TestContext::new();
    let (tx, rx) = tokio::sync::broadcast::channel(1);
    let consumer = TemplateImportConsumer::new(
        ctx.state.template_reconciler.clone(),
        ctx.store.clone(),
        rx,
    );

    for _ in 0..2 {
        let contract_id = activatable(&ctx, ContractStatus::Draft);
        ctx.state
            .contract_lifecycle
            .activate(contract_id, ActivateContractRequest::default())
            .await
            .unwrap();
    }
    assert_eq!(ctx.store.pending_outbox(), 0);

    // A one-slot channel keeps only the newest event, so the first is lost.
    for envelope in ctx.publisher.published() {
        tx.send(envelope).unwrap();
    }
    drop(tx);
    consumer.run().await;

    assert_eq!(ctx.store.pending_outbox(), 2);
    assert_eq!(ctx.store.live_templates().len(), 1);

    let report = ctx.state.outbox_relay.relay_pending().await.unwrap();
    assert_eq!(report.dispatched, 2);
    assert_eq!(ctx.publisher.count_of("ContractActivated"), 4);
}
