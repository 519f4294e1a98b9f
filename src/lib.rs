pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{
    crm::CrmLeadPublisher, http::HttpApplicationStore, memory::InMemoryApplicationStore,
};
pub use config::AppConfig;
pub use core::{
    calculator::calculate,
    lifecycle::{filter_applications, AdminBoard, ApplicationStats},
    submission::{ApplicationDesk, ApplicationForm, FormField, Submitter},
};
pub use utils::error::{LoanDeskError, Result};
