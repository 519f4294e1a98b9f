use crate::domain::model::{ApplicationStatus, LoanApplication, StatusFilter};
use crate::domain::ports::ApplicationStore;
use crate::domain::wire::{ListQuery, StatusUpdate};
use crate::utils::error::{LoanDeskError, Result};

impl ApplicationStatus {
    /// Any status may move to any other status; only a move onto itself is refused.
    pub fn can_transition_to(&self, target: ApplicationStatus) -> bool {
        *self != target
    }

    pub fn transitions(&self) -> Vec<ApplicationStatus> {
        Self::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(*target))
            .collect()
    }
}

pub fn validate_transition(application: &LoanApplication, target: ApplicationStatus) -> Result<()> {
    if application.status.can_transition_to(target) {
        Ok(())
    } else {
        Err(LoanDeskError::SameStatus {
            id: application.id,
            status: target.to_string(),
        })
    }
}

/// Client-side search over application number, names and phone.
/// Text fields match case-insensitively; an empty term keeps everything.
pub fn filter_applications<'a>(
    applications: &'a [LoanApplication],
    term: &str,
) -> Vec<&'a LoanApplication> {
    let term = term.trim();
    if term.is_empty() {
        return applications.iter().collect();
    }
    let needle = term.to_lowercase();

    applications
        .iter()
        .filter(|app| {
            app.application_number.to_lowercase().contains(&needle)
                || app.applicant.first_name.to_lowercase().contains(&needle)
                || app.applicant.last_name.to_lowercase().contains(&needle)
                || phone_matches(&app.applicant.phone, term)
        })
        .collect()
}

fn phone_matches(phone: &str, term: &str) -> bool {
    if phone.contains(term) {
        return true;
    }
    let looks_like_phone = term
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
    let digits: String = term.chars().filter(char::is_ascii_digit).collect();
    if !looks_like_phone || digits.is_empty() {
        return false;
    }
    let phone_digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    phone_digits.contains(&digits)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub approved: usize,
    pub rejected: usize,
    pub completed: usize,
}

impl ApplicationStats {
    pub fn from_applications(applications: &[LoanApplication]) -> Self {
        applications.iter().fold(Self::default(), |mut stats, app| {
            stats.total += 1;
            match app.status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::Processing => stats.processing += 1,
                ApplicationStatus::Approved => stats.approved += 1,
                ApplicationStatus::Rejected => stats.rejected += 1,
                ApplicationStatus::Completed => stats.completed += 1,
            }
            stats
        })
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        match status {
            ApplicationStatus::Pending => self.pending,
            ApplicationStatus::Processing => self.processing,
            ApplicationStatus::Approved => self.approved,
            ApplicationStatus::Rejected => self.rejected,
            ApplicationStatus::Completed => self.completed,
        }
    }
}

/// Admin view over the store: fetched collection, status filter, search term
/// and the comment typed for the next status change.
pub struct AdminBoard<S: ApplicationStore> {
    store: S,
    status_filter: StatusFilter,
    list_limit: Option<u32>,
    search_term: String,
    comment_draft: String,
    applications: Vec<LoanApplication>,
}

impl<S: ApplicationStore> AdminBoard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            status_filter: StatusFilter::All,
            list_limit: None,
            search_term: String::new(),
            comment_draft: String::new(),
            applications: Vec::new(),
        }
    }

    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = Some(limit);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn applications(&self) -> &[LoanApplication] {
        &self.applications
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn comment_draft(&self) -> &str {
        &self.comment_draft
    }

    pub fn find(&self, id: i64) -> Option<&LoanApplication> {
        self.applications.iter().find(|app| app.id == id)
    }

    /// Reloads the collection. A failed load leaves the board empty.
    pub async fn refresh(&mut self) -> Result<usize> {
        let query = ListQuery {
            status: self.status_filter.status(),
            limit: self.list_limit,
        };
        tracing::debug!("Loading applications (status filter: {})", self.status_filter);

        match self.store.list(&query).await {
            Ok(applications) => {
                self.applications = applications;
                tracing::info!("Loaded {} applications", self.applications.len());
                Ok(self.applications.len())
            }
            Err(e) => {
                tracing::warn!("Failed to load applications: {}", e);
                self.applications.clear();
                Err(e)
            }
        }
    }

    /// Changing the status filter always refetches.
    pub async fn set_status_filter(&mut self, filter: StatusFilter) -> Result<usize> {
        self.status_filter = filter;
        self.refresh().await
    }

    /// Changing the search term never refetches.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment_draft = comment.into();
    }

    pub fn visible(&self) -> Vec<&LoanApplication> {
        filter_applications(&self.applications, &self.search_term)
    }

    /// Counts over the fetched collection, regardless of the search term.
    pub fn stats(&self) -> ApplicationStats {
        ApplicationStats::from_applications(&self.applications)
    }

    /// Persists a status change with the drafted comment, then reloads the
    /// whole collection. The comment draft is cleared once the store accepts.
    pub async fn transition(&mut self, id: i64, target: ApplicationStatus) -> Result<()> {
        let loaded = self.applications.len();
        let application = self
            .find(id)
            .ok_or(LoanDeskError::ApplicationNotLoaded { id, loaded })?;
        validate_transition(application, target).inspect_err(|e| {
            tracing::warn!("Status change refused: {}", e);
        })?;

        let comment = self.comment_draft.trim();
        let update = StatusUpdate {
            id,
            status: target,
            comment: (!comment.is_empty()).then(|| comment.to_string()),
        };
        self.store.update_status(&update).await?;
        tracing::info!("Application {} moved to '{}'", id, target);

        self.comment_draft.clear();
        if let Err(e) = self.refresh().await {
            tracing::warn!("Status saved but reload failed: {}", e);
        }
        Ok(())
    }
}
