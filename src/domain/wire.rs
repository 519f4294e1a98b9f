//! Request and response envelopes exchanged with the application store.

use serde::{Deserialize, Serialize};

use super::model::{
    ApplicantInfo, ApplicationStatus, CalculationResult, LoanApplication, LoanParameters,
    LoanQuote,
};

/// POST body. Flattened so the store sees a single snake_case object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(flatten)]
    pub applicant: ApplicantInfo,
    #[serde(flatten)]
    pub loan: LoanParameters,
    #[serde(flatten)]
    pub calculation: CalculationResult,
}

impl SubmissionRequest {
    pub fn new(applicant: ApplicantInfo, quote: &LoanQuote) -> Self {
        Self {
            applicant,
            loan: quote.parameters,
            calculation: quote.result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub application_number: String,
    #[serde(default)]
    pub application_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub status: Option<ApplicationStatus>,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub applications: Vec<LoanApplication>,
}

/// PUT body. `comment` is sent as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: i64,
    pub status: ApplicationStatus,
    pub comment: Option<String>,
}

fn acknowledged() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateAck {
    #[serde(default = "acknowledged")]
    pub success: bool,
}
