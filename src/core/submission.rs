use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::calculator;
use crate::domain::model::{ApplicantInfo, CalculationResult, LoanParameters, LoanQuote};
use crate::domain::ports::ApplicationStore;
use crate::domain::wire::{SubmissionReceipt, SubmissionRequest};
use crate::utils::error::{LoanDeskError, Result};
use crate::utils::validation::{validate_present, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    FirstName,
    LastName,
    Phone,
    Email,
    MonthlyIncome,
    EmploymentType,
    LoanPurpose,
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::MonthlyIncome => "monthly_income",
            Self::EmploymentType => "employment_type",
            Self::LoanPurpose => "loan_purpose",
        }
    }
}

/// Raw application form input. Updates return a new value; nothing is mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationForm {
    first_name: String,
    last_name: String,
    phone: String,
    email: String,
    monthly_income: String,
    employment_type: String,
    loan_purpose: String,
}

impl ApplicationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(&self, field: FormField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            FormField::FirstName => next.first_name = value,
            FormField::LastName => next.last_name = value,
            FormField::Phone => next.phone = value,
            FormField::Email => next.email = value,
            FormField::MonthlyIncome => next.monthly_income = value,
            FormField::EmploymentType => next.employment_type = value,
            FormField::LoanPurpose => next.loan_purpose = value,
        }
        next
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Phone => &self.phone,
            FormField::Email => &self.email,
            FormField::MonthlyIncome => &self.monthly_income,
            FormField::EmploymentType => &self.employment_type,
            FormField::LoanPurpose => &self.loan_purpose,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Mirrors the submit button: enabled once every required field has text.
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }

    /// Converts the raw input into applicant details; blank optional fields become `None`.
    pub fn to_applicant(&self) -> Result<ApplicantInfo> {
        self.validate()?;

        let monthly_income = match optional(&self.monthly_income) {
            Some(raw) => Some(calculator::parse_decimal(raw).ok_or_else(|| {
                LoanDeskError::ValidationError {
                    message: format!("Monthly income is not a number: {}", raw),
                }
            })?),
            None => None,
        };
        let employment_type = optional(&self.employment_type)
            .map(|raw| raw.parse())
            .transpose()?;

        Ok(ApplicantInfo {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: optional(&self.email).map(str::to_string),
            monthly_income,
            employment_type,
            loan_purpose: optional(&self.loan_purpose).map(str::to_string),
        })
    }
}

impl Validate for ApplicationForm {
    fn validate(&self) -> Result<()> {
        for field in [FormField::FirstName, FormField::LastName, FormField::Phone] {
            validate_present(field.name(), self.get(field))?;
        }
        Ok(())
    }
}

fn optional(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LoanDeskError::SubmissionInFlight)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Sends applications to the store, one at a time.
pub struct Submitter<S: ApplicationStore> {
    store: S,
    in_flight: AtomicBool,
}

impl<S: ApplicationStore> Submitter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True while a submission round trip is outstanding.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(
        &self,
        form: &ApplicationForm,
        quote: Option<&LoanQuote>,
    ) -> Result<SubmissionReceipt> {
        let _guard = InFlightGuard::acquire(&self.in_flight).inspect_err(|_| {
            tracing::warn!("Submission ignored: another submission is still pending");
        })?;

        let quote = quote.ok_or(LoanDeskError::MissingCalculation)?;
        let applicant = form.to_applicant()?;
        let request = SubmissionRequest::new(applicant, quote);

        tracing::debug!(
            "Submitting application: amount={}, term={} months",
            request.loan.principal,
            request.loan.term_months
        );

        match self.store.submit(&request).await {
            Ok(receipt) => {
                tracing::info!("Application accepted: {}", receipt.application_number);
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!("Application submission failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Form state plus the latest calculation, as seen by one client session.
pub struct ApplicationDesk<S: ApplicationStore> {
    submitter: Submitter<S>,
    form: ApplicationForm,
    quote: Option<LoanQuote>,
}

impl<S: ApplicationStore> ApplicationDesk<S> {
    pub fn new(store: S) -> Self {
        Self {
            submitter: Submitter::new(store),
            form: ApplicationForm::default(),
            quote: None,
        }
    }

    pub fn form(&self) -> &ApplicationForm {
        &self.form
    }

    pub fn quote(&self) -> Option<&LoanQuote> {
        self.quote.as_ref()
    }

    pub fn submitter(&self) -> &Submitter<S> {
        &self.submitter
    }

    pub fn is_pending(&self) -> bool {
        self.submitter.is_pending()
    }

    pub fn edit(&mut self, field: FormField, value: impl Into<String>) {
        self.form = self.form.with(field, value);
    }

    /// Replaces the current calculation. Parameters that are not calculable clear it.
    pub fn calculate(&mut self, params: LoanParameters) -> Option<CalculationResult> {
        self.quote = calculator::quote(params);
        self.quote.map(|q| q.result)
    }

    /// On success the form is cleared; on any failure it is left untouched.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt> {
        let receipt = self
            .submitter
            .submit(&self.form, self.quote.as_ref())
            .await?;
        self.form = ApplicationForm::default();
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryApplicationStore, StoreCall};
    use crate::domain::model::EmploymentType;

    fn filled_form() -> ApplicationForm {
        ApplicationForm::new()
            .with(FormField::FirstName, "Иван")
            .with(FormField::LastName, "Петров")
            .with(FormField::Phone, "+7 900 123-45-67")
    }

    fn params() -> LoanParameters {
        LoanParameters {
            principal: 500_000.0,
            term_months: 12,
            annual_rate: 12.0,
        }
    }

    #[test]
    fn test_with_returns_new_value() {
        let empty = ApplicationForm::new();
        let named = empty.with(FormField::FirstName, "Иван");

        assert!(empty.is_empty());
        assert_eq!(named.get(FormField::FirstName), "Иван");
        assert!(!named.is_submittable());
        assert!(filled_form().is_submittable());
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let applicant = filled_form()
            .with(FormField::Email, "   ")
            .to_applicant()
            .unwrap();

        assert_eq!(applicant.email, None);
        assert_eq!(applicant.monthly_income, None);
        assert_eq!(applicant.employment_type, None);
        assert_eq!(applicant.loan_purpose, None);
    }

    #[test]
    fn test_optional_fields_are_parsed() {
        let applicant = filled_form()
            .with(FormField::MonthlyIncome, "80 000")
            .with(FormField::EmploymentType, "pensioner")
            .with(FormField::LoanPurpose, "ремонт квартиры")
            .to_applicant()
            .unwrap();

        assert_eq!(applicant.monthly_income, Some(80_000.0));
        assert_eq!(applicant.employment_type, Some(EmploymentType::Pensioner));
        assert_eq!(applicant.loan_purpose.as_deref(), Some("ремонт квартиры"));
    }

    #[test]
    fn test_non_finite_income_is_rejected() {
        for raw in ["NaN", "inf", "-infinity", "12abc"] {
            let result = filled_form()
                .with(FormField::MonthlyIncome, raw)
                .to_applicant();
            assert!(
                matches!(result, Err(LoanDeskError::ValidationError { .. })),
                "{}",
                raw
            );
        }
        let applicant = filled_form()
            .with(FormField::MonthlyIncome, "95000,50")
            .to_applicant()
            .unwrap();
        assert_eq!(applicant.monthly_income, Some(95_000.5));
    }

    #[test]
    fn test_missing_required_field() {
        let form = filled_form().with(FormField::Phone, "");
        assert!(matches!(
            form.to_applicant(),
            Err(LoanDeskError::MissingField { field }) if field == "phone"
        ));
    }

    #[tokio::test]
    async fn test_submit_without_calculation_makes_no_call() {
        let mut desk = ApplicationDesk::new(InMemoryApplicationStore::new());
        desk.edit(FormField::FirstName, "Иван");
        desk.edit(FormField::LastName, "Петров");
        desk.edit(FormField::Phone, "+79001234567");

        let err = desk.submit().await.unwrap_err();

        assert!(matches!(err, LoanDeskError::MissingCalculation));
        assert!(desk.submitter().store().calls().is_empty());
        assert!(!desk.form().is_empty());
        assert!(!desk.is_pending());
    }

    #[tokio::test]
    async fn test_successful_submission_clears_form() {
        let mut desk = ApplicationDesk::new(InMemoryApplicationStore::new());
        desk.edit(FormField::FirstName, "Иван");
        desk.edit(FormField::LastName, "Петров");
        desk.edit(FormField::Phone, "+79001234567");
        assert_eq!(desk.calculate(params()).unwrap().monthly_payment, 44_424);

        let receipt = desk.submit().await.unwrap();

        assert!(receipt.application_number.starts_with("APP-"));
        assert!(desk.form().is_empty());
        assert!(desk.quote().is_some());
        assert_eq!(desk.submitter().store().calls(), vec![StoreCall::Submit]);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_form() {
        let store = InMemoryApplicationStore::new();
        store.fail_next("store unavailable");
        let mut desk = ApplicationDesk::new(store);
        desk.edit(FormField::FirstName, "Иван");
        desk.edit(FormField::LastName, "Петров");
        desk.edit(FormField::Phone, "+79001234567");
        desk.calculate(params());

        let err = desk.submit().await.unwrap_err();

        assert!(err.is_remote_failure());
        assert_eq!(desk.form().get(FormField::FirstName), "Иван");

        // retry succeeds with the preserved input
        desk.submit().await.unwrap();
        assert!(desk.form().is_empty());
    }

    #[tokio::test]
    async fn test_uncalculable_parameters_clear_quote() {
        let mut desk = ApplicationDesk::new(InMemoryApplicationStore::new());
        desk.calculate(params());
        assert!(desk.quote().is_some());

        let cleared = desk.calculate(LoanParameters {
            principal: 0.0,
            ..params()
        });
        assert!(cleared.is_none());
        assert!(desk.quote().is_none());
    }
}
