use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, Local};

use crate::domain::model::{ApplicationStatus, LoanApplication, PaymentSnapshot};
use crate::domain::ports::ApplicationStore;
use crate::domain::wire::{ListQuery, StatusUpdate, SubmissionReceipt, SubmissionRequest};
use crate::utils::error::{LoanDeskError, Result};

/// Listing size the remote store applies when the request carries no limit.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// One recorded interaction with the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Submit,
    List(ListQuery),
    UpdateStatus(StatusUpdate),
}

#[derive(Default)]
struct StoreState {
    applications: Vec<LoanApplication>,
    next_id: i64,
    sequence: u32,
    calls: Vec<StoreCall>,
    failure: Option<String>,
}

/// Application store kept in process memory. Assigns ids and
/// `APP-<year>-<sequence>` numbers the way the remote store does.
#[derive(Default)]
pub struct InMemoryApplicationStore {
    state: Mutex<StoreState>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_applications(applications: Vec<LoanApplication>) -> Self {
        let next_id = applications.iter().map(|a| a.id).max().unwrap_or(0);
        let sequence = applications.len() as u32;
        Self {
            state: Mutex::new(StoreState {
                applications,
                next_id,
                sequence,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next store operation fail with a non-success answer.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state().failure = Some(message.into());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn applications(&self) -> Vec<LoanApplication> {
        self.state().applications.clone()
    }

    fn record(state: &mut StoreState, call: StoreCall) -> Result<()> {
        state.calls.push(call);
        match state.failure.take() {
            Some(body) => Err(LoanDeskError::RemoteStatus { status: 500, body }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt> {
        let mut state = self.state();
        Self::record(&mut state, StoreCall::Submit)?;

        let now = Local::now();
        state.next_id += 1;
        state.sequence += 1;
        let id = state.next_id;
        let application_number = format!("APP-{}-{:06}", now.year(), state.sequence);

        state.applications.push(LoanApplication {
            id,
            application_number: application_number.clone(),
            applicant: request.applicant.clone(),
            loan: request.loan,
            payments: PaymentSnapshot {
                monthly_payment: Some(request.calculation.monthly_payment as f64),
                total_payment: Some(request.calculation.total_payment as f64),
                overpayment: Some(request.calculation.overpayment as f64),
            },
            status: ApplicationStatus::Pending,
            created_at: now.naive_local(),
            processed_at: None,
            comment: None,
        });

        Ok(SubmissionReceipt {
            application_number,
            application_id: Some(id),
        })
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<LoanApplication>> {
        let mut state = self.state();
        Self::record(&mut state, StoreCall::List(*query))?;

        let mut selected: Vec<LoanApplication> = state
            .applications
            .iter()
            .filter(|app| query.status.map_or(true, |status| app.status == status))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        selected.truncate(query.limit.map_or(DEFAULT_LIST_LIMIT, |l| l as usize));
        Ok(selected)
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<()> {
        let mut state = self.state();
        Self::record(&mut state, StoreCall::UpdateStatus(update.clone()))?;

        let app = state
            .applications
            .iter_mut()
            .find(|app| app.id == update.id)
            .ok_or(LoanDeskError::UnknownApplication { id: update.id })?;
        app.status = update.status;
        app.comment = update.comment.clone();
        app.processed_at = Some(Local::now().naive_local());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ApplicantInfo, CalculationResult, LoanParameters, LoanQuote};

    fn request(first_name: &str) -> SubmissionRequest {
        SubmissionRequest::new(
            ApplicantInfo {
                first_name: first_name.to_string(),
                last_name: "Петров".to_string(),
                phone: "+79001234567".to_string(),
                ..Default::default()
            },
            &LoanQuote {
                parameters: LoanParameters {
                    principal: 200_000.0,
                    term_months: 24,
                    annual_rate: 12.0,
                },
                result: CalculationResult {
                    monthly_payment: 9_415,
                    total_payment: 225_960,
                    overpayment: 25_960,
                },
            },
        )
    }

    #[tokio::test]
    async fn test_assigns_sequential_numbers() {
        let store = InMemoryApplicationStore::new();
        let first = store.submit(&request("Иван")).await.unwrap();
        let second = store.submit(&request("Анна")).await.unwrap();

        let year = Local::now().year();
        assert_eq!(first.application_number, format!("APP-{}-000001", year));
        assert_eq!(second.application_number, format!("APP-{}-000002", year));
        assert_eq!(second.application_id, Some(2));
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_limit() {
        let store = InMemoryApplicationStore::new();
        for name in ["Иван", "Анна", "Олег"] {
            store.submit(&request(name)).await.unwrap();
        }
        store
            .update_status(&StatusUpdate {
                id: 2,
                status: ApplicationStatus::Approved,
                comment: Some("ok".to_string()),
            })
            .await
            .unwrap();

        let approved = store
            .list(&ListQuery {
                status: Some(ApplicationStatus::Approved),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].applicant.first_name, "Анна");
        assert!(approved[0].processed_at.is_some());

        let limited = store
            .list(&ListQuery {
                status: None,
                limit: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, 3);
    }

    #[tokio::test]
    async fn test_unknown_id_and_injected_failure() {
        let store = InMemoryApplicationStore::new();
        let err = store
            .update_status(&StatusUpdate {
                id: 42,
                status: ApplicationStatus::Rejected,
                comment: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LoanDeskError::UnknownApplication { id: 42 }));

        store.fail_next("down");
        assert!(store.list(&ListQuery::default()).await.unwrap_err().is_remote_failure());
        assert!(store.list(&ListQuery::default()).await.is_ok());
        assert_eq!(store.calls().len(), 3);
    }
}
