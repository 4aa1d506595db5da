pub mod contract;
pub mod contract_document;
pub mod outbox;
pub mod shift;
pub mod shift_template;
pub mod user;

// Re-export all repositories for easy importing
pub use contract::ContractRepository;
pub use contract_document::ContractDocumentRepository;
pub use outbox::OutboxRepository;
pub use shift::ShiftRepository;
pub use shift_template::ShiftTemplateRepository;
pub use user::UserRepository;
