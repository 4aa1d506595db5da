pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

pub use config::Config;
pub use error::AppError;

use database::repositories::{
    ContractDocumentRepository, ContractRepository, OutboxRepository, ShiftRepository,
    ShiftTemplateRepository, UserRepository,
};
use database::store::{
    ContractStore, DocumentStore, OutboxStore, PrincipalDirectory, ShiftStore, TemplateStore,
};
use services::{
    ContractLifecycle, EventPublisher, ExpirationSweeper, Notifier, OutboxRelay, ShiftScheduler,
    TemplateReconciler,
};

/// The persistence boundaries every service is built from.
#[derive(Clone)]
pub struct Stores {
    pub contracts: Arc<dyn ContractStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub shifts: Arc<dyn ShiftStore>,
    pub outbox: Arc<dyn OutboxStore>,
    pub principals: Arc<dyn PrincipalDirectory>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            contracts: Arc::new(ContractRepository::new(pool.clone())),
            documents: Arc::new(ContractDocumentRepository::new(pool.clone())),
            templates: Arc::new(ShiftTemplateRepository::new(pool.clone())),
            shifts: Arc::new(ShiftRepository::new(pool.clone())),
            outbox: Arc::new(OutboxRepository::new(pool.clone())),
            principals: Arc::new(UserRepository::new(pool)),
        }
    }
}

pub struct AppState {
    pub contract_lifecycle: ContractLifecycle,
    pub template_reconciler: TemplateReconciler,
    pub templates: Arc<dyn TemplateStore>,
    pub shift_scheduler: ShiftScheduler,
    pub expiration_sweeper: ExpirationSweeper,
    pub outbox_relay: Arc<OutboxRelay>,
}

impl AppState {
    pub fn new(
        config: &Config,
        stores: Stores,
        publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let outbox_relay = Arc::new(OutboxRelay::new(
            stores.outbox.clone(),
            publisher,
            config.outbox_batch_size,
            config.outbox_claim_lease(),
        ));

        Ok(Self {
            contract_lifecycle: ContractLifecycle::new(stores.contracts, outbox_relay.clone()),
            template_reconciler: TemplateReconciler::new(
                stores.templates.clone(),
                config.unit_of_work_timeout(),
            ),
            templates: stores.templates,
            shift_scheduler: ShiftScheduler::new(stores.shifts),
            expiration_sweeper: ExpirationSweeper::new(
                stores.documents,
                stores.principals,
                notifier,
                outbox_relay.clone(),
                config.local_offset()?,
                config.near_expiry_days,
                config.unit_of_work_timeout(),
            ),
            outbox_relay,
        })
    }
}
