pub mod calculator;
pub mod export;
pub mod lifecycle;
pub mod submission;

pub use crate::domain::model::{
    ApplicantInfo, ApplicationStatus, CalculationResult, LoanApplication, LoanParameters,
    LoanQuote, StatusFilter,
};
pub use crate::domain::ports::{ApplicationStore, LeadPublisher};
pub use crate::utils::error::Result;
