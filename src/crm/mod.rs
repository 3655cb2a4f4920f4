pub mod accounts;
pub mod agents;
pub mod assignment;
pub mod categories;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod leads;
pub mod memory;
pub mod pg;
pub mod scope;
pub mod store;
pub mod types;

use std::sync::Arc;

pub use accounts::AccountService;
pub use agents::AgentService;
pub use assignment::AssignmentService;
pub use categories::CategoryService;
pub use error::{CrmError, CrmResult};
pub use handlers::configure_crm_routes;
pub use leads::LeadService;
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use scope::{CollectionKind, ScopedCollection, TenantScope};
pub use store::CrmStore;

use crate::email::NotificationDispatcher;
use crate::security::jwt::JwtManager;
use crate::security::password::CredentialHasher;

/// All CRM operations over one store.
#[derive(Clone)]
pub struct CrmServices {
    pub store: Arc<dyn CrmStore>,
    pub scope: TenantScope,
    pub leads: LeadService,
    pub assignment: AssignmentService,
    pub agents: AgentService,
    pub categories: CategoryService,
    pub accounts: AccountService,
}

impl CrmServices {
    pub fn new(
        store: Arc<dyn CrmStore>,
        notifier: NotificationDispatcher,
        hasher: CredentialHasher,
        jwt: Arc<JwtManager>,
    ) -> Self {
        Self {
            scope: TenantScope::new(Arc::clone(&store)),
            leads: LeadService::new(Arc::clone(&store), notifier.clone()),
            assignment: AssignmentService::new(Arc::clone(&store), notifier.clone()),
            agents: AgentService::new(Arc::clone(&store), hasher.clone(), notifier),
            categories: CategoryService::new(Arc::clone(&store)),
            accounts: AccountService::new(Arc::clone(&store), hasher, jwt),
            store,
        }
    }
}
