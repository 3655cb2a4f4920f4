pub mod core;
pub mod crm;
pub mod email;
pub mod main_module;
pub mod security;

pub use crate::core::config::AppConfig;
pub use crate::core::shared::state::AppState;
pub use crate::crm::{CrmError, CrmResult, CrmServices};
