pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{
    ChatHistoryPage, ChatHistoryRepository, ChatMessageRecord, ChatRole, CompanyProfileRecord,
    CompanyProfileRepository, PersonaRecord, PersonaRepository, RepositoryError,
    TargetMarketRecord, TargetMarketRepository, TenantRecord, TenantRepository,
};
