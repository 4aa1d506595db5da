#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fake::Fake;
use fake::faker::address::en::StreetName;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use uuid::Uuid;

use guardsched::database::models::*;
use guardsched::database::store::{
    ContractStore, DocumentStore, OutboxStore, PrincipalDirectory, ShiftStore, TemplateStore,
};
use guardsched::services::{EventPublisher, LogNotifier, Notifier};
use guardsched::{AppError, AppState, Config, Stores};

/// Everything the in-memory store holds. Tests reach in through [`MemoryStore::state`].
#[derive(Default)]
pub struct MemoryState {
    pub contracts: HashMap<Uuid, ContractAggregate>,
    pub templates: Vec<ShiftTemplate>,
    pub shifts: HashMap<Uuid, Shift>,
    pub documents: HashMap<Uuid, ExpiringDocument>,
    pub outbox: Vec<OutboxMessage>,
    pub outbox_claims: HashMap<Uuid, DateTime<Utc>>,
    pub principals: HashMap<(String, PrincipalRole), Uuid>,
    pub failing_template_codes: HashSet<String>,
    pub failing_documents: HashSet<Uuid>,
}

/// One in-memory implementation of every store boundary, sharing a single state
/// so that cross-table units of work (activation + outbox, expiry + cascade) stay atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            contracts: self.clone(),
            documents: self.clone(),
            templates: self.clone(),
            shifts: self.clone(),
            outbox: self.clone(),
            principals: self.clone(),
        }
    }

    pub fn add_contract(&self, aggregate: ContractAggregate) -> Uuid {
        let id = aggregate.contract.id;
        self.state().contracts.insert(id, aggregate);
        id
    }

    pub fn contract(&self, id: Uuid) -> Contract {
        self.state().contracts[&id].contract.clone()
    }

    pub fn add_document(&self, document: ExpiringDocument) -> Uuid {
        let id = document.id;
        self.state().documents.insert(id, document);
        id
    }

    pub fn document(&self, id: Uuid) -> ExpiringDocument {
        self.state().documents[&id].clone()
    }

    pub fn add_shift(&self, shift: Shift) -> Uuid {
        let id = shift.id;
        self.state().shifts.insert(id, shift);
        id
    }

    pub fn add_principal(&self, email: &str, role: PrincipalRole) -> Uuid {
        let id = Uuid::new_v4();
        self.state().principals.insert((email.to_string(), role), id);
        id
    }

    pub fn live_templates(&self) -> Vec<ShiftTemplate> {
        self.state()
            .templates
            .iter()
            .filter(|t| !t.is_deleted)
            .cloned()
            .collect()
    }

    pub fn outbox_events(&self) -> Vec<EventEnvelope> {
        self.state()
            .outbox
            .iter()
            .map(|m| m.envelope().unwrap())
            .collect()
    }

    pub fn pending_outbox(&self) -> usize {
        self.state()
            .outbox
            .iter()
            .filter(|m| m.dispatched_at.is_none())
            .count()
    }

    fn enqueue(state: &mut MemoryState, envelope: &EventEnvelope) {
        state.outbox.push(OutboxMessage {
            id: envelope.id,
            event_type: envelope.event.event_type().to_string(),
            payload: serde_json::to_value(envelope).unwrap(),
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            dispatched_at: None,
        });
    }
}

fn injected_failure(what: &str) -> AppError {
    AppError::Timeout(format!("injected failure for {}", what))
}

fn apply_draft(template: &mut ShiftTemplate, draft: &ShiftTemplateDraft, actor: Option<Uuid>) {
    template.name = draft.name.clone();
    template.contract_id = draft.contract_id;
    template.schedule_id = draft.schedule_id;
    template.start_time = draft.start_time;
    template.end_time = draft.end_time;
    template.duration_hours = draft.duration_hours;
    template.break_minutes = draft.break_minutes;
    template.is_night_shift = draft.is_night_shift;
    template.is_overnight = draft.is_overnight;
    template.crosses_midnight = draft.crosses_midnight;
    template.day_flags = draft.day_flags;
    template.min_guards = draft.min_guards;
    template.max_guards = draft.max_guards;
    template.optimal_guards = draft.optimal_guards;
    template.location_id = draft.location.as_ref().map(|l| l.location_id);
    template.location_name = draft.location.as_ref().map(|l| l.name.clone());
    template.location_address = draft.location.as_ref().and_then(|l| l.address.clone());
    template.location_lat = draft.location.as_ref().and_then(|l| l.lat);
    template.location_lon = draft.location.as_ref().and_then(|l| l.lon);
    template.effective_from = draft.effective_from;
    template.effective_to = draft.effective_to;
    template.is_active = true;
    template.updated_at = Utc::now();
    template.updated_by = actor;
}

#[async_trait]
impl ShiftStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>, AppError> {
        Ok(self.state().shifts.get(&id).filter(|s| !s.is_deleted).cloned())
    }

    async fn find_by_location_and_dates(
        &self,
        location_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
        exclude_shift_id: Option<Uuid>,
    ) -> Result<Vec<Shift>, AppError> {
        Ok(self
            .state()
            .shifts
            .values()
            .filter(|s| s.location_id == location_id && !s.is_deleted)
            .filter(|s| s.shift_date >= from_date && s.shift_date <= to_date)
            .filter(|s| Some(s.id) != exclude_shift_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, shift: &Shift) -> Result<Shift, AppError> {
        self.state().shifts.insert(shift.id, shift.clone());
        Ok(shift.clone())
    }

    async fn update_versioned(
        &self,
        shift: &Shift,
        expected_version: i32,
    ) -> Result<Option<Shift>, AppError> {
        let mut state = self.state();
        match state.shifts.get_mut(&shift.id) {
            Some(stored) if stored.version == expected_version && !stored.is_deleted => {
                *stored = Shift {
                    version: expected_version + 1,
                    ..shift.clone()
                };
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn upsert_by_code(
        &self,
        draft: &ShiftTemplateDraft,
        actor: Option<Uuid>,
    ) -> Result<UpsertOutcome, AppError> {
        let mut state = self.state();
        let code = draft.template_code.as_str().to_string();
        if state.failing_template_codes.contains(&code) {
            return Err(injected_failure(&code));
        }

        if let Some(existing) = state
            .templates
            .iter_mut()
            .find(|t| t.template_code == code && !t.is_deleted)
        {
            apply_draft(existing, draft, actor);
            return Ok(UpsertOutcome::Updated(existing.clone()));
        }

        let now = Utc::now();
        let mut template = ShiftTemplate {
            id: Uuid::new_v4(),
            template_code: code,
            contract_id: draft.contract_id,
            schedule_id: draft.schedule_id,
            name: draft.name.clone(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            duration_hours: draft.duration_hours,
            break_minutes: draft.break_minutes,
            is_night_shift: draft.is_night_shift,
            is_overnight: draft.is_overnight,
            crosses_midnight: draft.crosses_midnight,
            day_flags: draft.day_flags,
            min_guards: draft.min_guards,
            max_guards: draft.max_guards,
            optimal_guards: draft.optimal_guards,
            location_id: None,
            location_name: None,
            location_address: None,
            location_lat: None,
            location_lon: None,
            effective_from: draft.effective_from,
            effective_to: draft.effective_to,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            created_by: actor,
            updated_by: actor,
        };
        apply_draft(&mut template, draft, actor);
        state.templates.push(template.clone());
        Ok(UpsertOutcome::Created(template))
    }

    async fn find_by_contract(&self, contract_id: Uuid) -> Result<Vec<ShiftTemplate>, AppError> {
        Ok(self
            .state()
            .templates
            .iter()
            .filter(|t| t.contract_id == contract_id && !t.is_deleted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn load_for_activation(
        &self,
        contract_id: Uuid,
    ) -> Result<Option<ContractAggregate>, AppError> {
        Ok(self
            .state()
            .contracts
            .get(&contract_id)
            .filter(|a| !a.contract.is_deleted)
            .cloned())
    }

    async fn commit_activation(
        &self,
        commit: &ActivationCommit,
        event: &EventEnvelope,
    ) -> Result<Contract, AppError> {
        let mut state = self.state();
        let aggregate = state
            .contracts
            .get_mut(&commit.contract_id)
            .ok_or_else(|| AppError::NotFound("Contract not found".to_string()))?;

        let contract = &mut aggregate.contract;
        if contract.status != commit.expected_status {
            return Err(AppError::Conflict(format!(
                "Contract {} changed status concurrently",
                contract.contract_number
            )));
        }

        contract.status = ContractStatus::ScheduleShifts;
        contract.activated_at = Some(commit.activated_at);
        contract.activated_by = commit.activated_by;
        contract.manager_id = commit.manager_id.or(contract.manager_id);
        contract.activation_notes = commit.notes.clone();
        if commit.approve {
            contract.approved_at = Some(commit.activated_at);
            contract.approved_by = commit.activated_by;
        }
        contract.updated_at = commit.activated_at;
        let updated = contract.clone();

        Self::enqueue(&mut state, event);
        Ok(updated)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_due(&self, horizon: NaiveDate) -> Result<Vec<ExpiringDocument>, AppError> {
        let state = self.state();
        let mut due: Vec<ExpiringDocument> = state
            .documents
            .values()
            .filter(|d| d.end_date <= horizon)
            .filter_map(|d| {
                let status = state
                    .contracts
                    .get(&d.contract_id)
                    .map(|a| a.contract.status)
                    .unwrap_or(d.contract_status);
                (status != ContractStatus::Terminated).then(|| ExpiringDocument {
                    contract_status: status,
                    ..d.clone()
                })
            })
            .collect();
        due.sort_by_key(|d| (d.end_date, d.id));
        Ok(due)
    }

    async fn mark_near_expired(&self, document_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state();
        if state.failing_documents.contains(&document_id) {
            return Err(injected_failure("document"));
        }
        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;
        if document.classification == DocumentClassification::NearExpired {
            return Ok(false);
        }
        document.classification = DocumentClassification::NearExpired;
        Ok(true)
    }

    async fn expire(
        &self,
        document_id: Uuid,
        contract_id: Uuid,
        cascade: &[EventEnvelope],
    ) -> Result<ExpiryTransition, AppError> {
        let mut state = self.state();
        if state.failing_documents.contains(&document_id) {
            return Err(injected_failure("document"));
        }

        let status = state
            .contracts
            .get(&contract_id)
            .map(|a| a.contract.status)
            .ok_or_else(|| AppError::NotFound("Contract not found".to_string()))?;
        let transition = status.expire();

        if let Some(document) = state.documents.get_mut(&document_id) {
            document.classification = DocumentClassification::Expired;
        }
        if transition.fires_cascade() {
            if let Some(aggregate) = state.contracts.get_mut(&contract_id) {
                aggregate.contract.status = ContractStatus::Expired;
            }
            for envelope in cascade {
                Self::enqueue(&mut state, envelope);
            }
        }
        Ok(transition)
    }
}

#[async_trait]
impl OutboxStore for MemoryStore {
    async fn claim_pending(
        &self,
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, AppError> {
        let now = Utc::now();
        let lease_end = now + chrono::Duration::from_std(lease).unwrap();
        let mut state = self.state();
        let MemoryState {
            outbox,
            outbox_claims,
            ..
        } = &mut *state;

        let mut pending: Vec<OutboxMessage> = outbox
            .iter()
            .filter(|m| m.dispatched_at.is_none())
            .filter(|m| outbox_claims.get(&m.id).is_none_or(|until| *until < now))
            .cloned()
            .collect();
        pending.sort_by_key(|m| m.created_at);
        pending.truncate(limit as usize);

        for message in &pending {
            outbox_claims.insert(message.id, lease_end);
        }
        Ok(pending)
    }

    async fn mark_dispatched(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(message) = self.state().outbox.iter_mut().find(|m| m.id == id) {
            message.dispatched_at = Some(at);
            message.attempts += 1;
            message.last_error = None;
        }
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> Result<(), AppError> {
        if let Some(message) = self.state().outbox.iter_mut().find(|m| m.id == id) {
            message.attempts += 1;
            message.last_error = Some(error.to_string());
        }
        self.state().outbox_claims.remove(&id);
        Ok(())
    }

    async fn requeue_dispatched(
        &self,
        event_type: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut state = self.state();
        let MemoryState {
            outbox,
            outbox_claims,
            ..
        } = &mut *state;

        let mut requeued = 0;
        for message in outbox.iter_mut() {
            if message.event_type == event_type
                && message.dispatched_at.is_some_and(|at| at >= since)
            {
                message.dispatched_at = None;
                outbox_claims.remove(&message.id);
                requeued += 1;
            }
        }
        Ok(requeued)
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryStore {
    async fn find_principal_id(
        &self,
        email: &str,
        role: PrincipalRole,
    ) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .state()
            .principals
            .get(&(email.to_string(), role))
            .copied())
    }
}

/// Collects published events; can be switched into a failing bus.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<EventEnvelope>>,
    failing: AtomicBool,
    delay: Mutex<Duration>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every publish wait before it records the event.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn published(&self) -> Vec<EventEnvelope> {
        self.published.lock().unwrap().clone()
    }

    pub fn count_of(&self, event_type: &str) -> usize {
        self.published()
            .iter()
            .filter(|e| e.event.event_type() == event_type)
            .count()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), AppError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::EventPublish("bus unavailable".to_string()));
        }
        self.published.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// Notifier that always fails, counting attempts.
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_near_expiry(&self, _document: &ExpiringDocument) -> Result<(), AppError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::InternalServerError(Some(
            "mail relay down".to_string(),
        )))
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    pub sent: AtomicUsize,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify_near_expiry(&self, _document: &ExpiringDocument) -> Result<(), AppError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Notifier that succeeds only after `delay`.
pub struct SlowNotifier {
    pub delay: Duration,
}

#[async_trait]
impl Notifier for SlowNotifier {
    async fn notify_near_expiry(&self, _document: &ExpiringDocument) -> Result<(), AppError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Services wired to the in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(LogNotifier))
    }

    pub fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        let store = MemoryStore::new();
        let publisher = RecordingPublisher::new();
        let state = AppState::new(
            &Config::test_config(),
            store.stores(),
            publisher.clone(),
            notifier,
        )
        .expect("test config has a valid offset");

        Self {
            store,
            publisher,
            state,
        }
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Random but valid domain objects.
pub struct TestDataGenerator;

impl TestDataGenerator {
    pub fn contract(status: ContractStatus) -> Contract {
        let now = Utc::now();
        Contract {
            id: Uuid::new_v4(),
            contract_number: format!("HD-{}", (1000..9999).fake::<i32>()),
            title: format!("{} security services", CompanyName().fake::<String>()),
            customer_id: Uuid::new_v4(),
            manager_id: None,
            status,
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
            auto_generate_shifts: true,
            generate_shifts_advance_days: 30,
            work_on_public_holidays: false,
            work_on_customer_closed_days: false,
            approved_at: None,
            approved_by: None,
            activated_at: None,
            activated_by: None,
            activation_notes: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        }
    }

    pub fn location() -> ContractLocationSnapshot {
        ContractLocationSnapshot {
            location_id: Uuid::new_v4(),
            name: format!("{} Tower", CompanyName().fake::<String>()),
            address: Some(format!(
                "{} {}",
                (1..999).fake::<i32>(),
                StreetName().fake::<String>()
            )),
            code: Some("LOC-01".to_string()),
            guards_required: 2,
            coverage_type: "full_time".to_string(),
            service_start: None,
            service_end: None,
            lat: Some(10.7769),
            lon: Some(106.7009),
            geofence_radius_m: Some(100),
        }
    }

    pub fn schedule(name: &str, start: TimeOfDay, end: TimeOfDay, hours: f64) -> ScheduleDefinition {
        ScheduleDefinition {
            schedule_id: Uuid::new_v4(),
            name: name.to_string(),
            schedule_type: "regular".to_string(),
            location_id: None,
            start_time: start,
            end_time: end,
            crosses_midnight: end <= start,
            duration_hours: hours,
            break_minutes: 60,
            guards_per_shift: 2,
            recurrence_type: "weekly".to_string(),
            day_flags: DayFlags::weekdays(),
            applies_on_public_holidays: false,
            applies_on_weekends: false,
            skip_when_closed: false,
            requires_armed_guard: false,
            requires_supervisor: false,
            min_experience_months: 0,
            effective_from: date(2025, 1, 1),
            effective_to: None,
        }
    }

    pub fn aggregate(
        status: ContractStatus,
        locations: Vec<ContractLocationSnapshot>,
        schedules: Vec<ScheduleDefinition>,
    ) -> ContractAggregate {
        let contract = Self::contract(status);
        ContractAggregate {
            customer: CustomerSummary {
                id: contract.customer_id,
                name: CompanyName().fake(),
            },
            contract,
            locations,
            schedules,
        }
    }

    pub fn document(
        contract: &Contract,
        contract_type: ContractType,
        end_date: NaiveDate,
    ) -> ExpiringDocument {
        ExpiringDocument {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            contract_status: contract.status,
            contract_type,
            classification: DocumentClassification::Normal,
            end_date,
            principal_email: SafeEmail().fake(),
            principal_id: None,
            document_name: Some("Working agreement".to_string()),
            updated_at: Utc::now(),
        }
    }

    pub fn shift_input(location_id: Uuid, day: NaiveDate, start: (u32, u32), end: (u32, u32)) -> ShiftInput {
        ShiftInput {
            location_id,
            contract_id: None,
            template_id: None,
            shift_date: day,
            start_time: chrono::NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            break_minutes: 30,
            required_guards: 1,
            description: None,
        }
    }
}
