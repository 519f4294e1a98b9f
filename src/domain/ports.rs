use crate::domain::model::{LeadDraft, LoanApplication, PublishedLead};
use crate::domain::wire::{ListQuery, StatusUpdate, SubmissionReceipt, SubmissionRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Remote application store: the only persistence this crate talks to.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt>;
    async fn list(&self, query: &ListQuery) -> Result<Vec<LoanApplication>>;
    async fn update_status(&self, update: &StatusUpdate) -> Result<()>;
}

#[async_trait]
pub trait LeadPublisher: Send + Sync {
    async fn publish(&self, lead: &LeadDraft) -> Result<PublishedLead>;
}
