pub mod contract_lifecycle;
pub mod event_bus;
pub mod expiration_sweeper;
pub mod notifier;
pub mod outbox_relay;
pub mod overlap_detector;
pub mod shift_scheduler;
pub mod template_import_consumer;
pub mod template_reconciler;
pub mod time_validator;

pub use contract_lifecycle::ContractLifecycle;
pub use event_bus::{ChannelPublisher, EventPublisher};
pub use expiration_sweeper::{ExpirationSweeper, SweepResult};
pub use notifier::{LogNotifier, Notifier};
pub use outbox_relay::OutboxRelay;
pub use overlap_detector::OverlapDetector;
pub use shift_scheduler::ShiftScheduler;
pub use template_import_consumer::TemplateImportConsumer;
pub use template_reconciler::{ImportResult, ImportTemplatesRequest, TemplateReconciler};
pub use time_validator::{TimeValidationInput, TimeValidationResult};
