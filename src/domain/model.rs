use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::LoanDeskError;

pub const DEFAULT_INTEREST_RATE: f64 = 12.0;

/// Terms (in months) offered by the calculator form.
pub const OFFERED_TERMS: [u32; 5] = [12, 24, 36, 60, 120];

fn default_interest_rate() -> f64 {
    DEFAULT_INTEREST_RATE
}

/// Loan parameters as entered by the user. Field names follow the store's wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    #[serde(rename = "loan_amount")]
    pub principal: f64,
    #[serde(rename = "loan_term_months")]
    pub term_months: u32,
    /// Annual rate in percent.
    #[serde(rename = "interest_rate", default = "default_interest_rate")]
    pub annual_rate: f64,
}

/// Rounded figures produced by the amortization calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub monthly_payment: u64,
    pub total_payment: u64,
    pub overpayment: i64,
}

/// A calculation together with the parameters it was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanQuote {
    pub parameters: LoanParameters,
    pub result: CalculationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    Employed,
    SelfEmployed,
    Pensioner,
    Student,
    Unemployed,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employed => "employed",
            Self::SelfEmployed => "self_employed",
            Self::Pensioner => "pensioner",
            Self::Student => "student",
            Self::Unemployed => "unemployed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Employed => "Работаю по найму",
            Self::SelfEmployed => "Индивидуальный предприниматель",
            Self::Pensioner => "Пенсионер",
            Self::Student => "Студент",
            Self::Unemployed => "Временно не работаю",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = LoanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "employed" => Ok(Self::Employed),
            "self_employed" => Ok(Self::SelfEmployed),
            "pensioner" => Ok(Self::Pensioner),
            "student" => Ok(Self::Student),
            "unemployed" => Ok(Self::Unemployed),
            other => Err(LoanDeskError::ValidationError {
                message: format!("Unknown employment type: {}", other),
            }),
        }
    }
}

/// Applicant details. Optional fields serialize as explicit `null` when absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicantInfo {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub loan_purpose: Option<String>,
}

impl ApplicantInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Processing,
    Approved,
    Rejected,
    Completed,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Approved,
        Self::Rejected,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Ожидает",
            Self::Processing => "В обработке",
            Self::Approved => "Одобрена",
            Self::Rejected => "Отклонена",
            Self::Completed => "Завершена",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = LoanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| LoanDeskError::ValidationError {
                message: format!("Unknown application status: {}", s),
            })
    }
}

/// Server-side listing restriction: everything, or a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn status(&self) -> Option<ApplicationStatus> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(*status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = LoanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{}", status),
        }
    }
}

/// Payment figures stored with an application. The listing endpoint only
/// returns the monthly payment, so every figure is optional here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    #[serde(default)]
    pub monthly_payment: Option<f64>,
    #[serde(default)]
    pub total_payment: Option<f64>,
    #[serde(default)]
    pub overpayment: Option<f64>,
}

/// A submitted application as held by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: i64,
    pub application_number: String,
    #[serde(flatten)]
    pub applicant: ApplicantInfo,
    #[serde(flatten)]
    pub loan: LoanParameters,
    #[serde(flatten)]
    pub payments: PaymentSnapshot,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub processed_at: Option<NaiveDateTime>,
    #[serde(default, alias = "manager_comment")]
    pub comment: Option<String>,
}

/// Contact + lead pair forwarded to the CRM.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadDraft {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub loan_amount: f64,
    pub loan_term_months: u32,
    pub monthly_payment: u64,
    pub total_payment: u64,
    pub monthly_income: Option<f64>,
}

impl LeadDraft {
    pub fn new(applicant: &ApplicantInfo, quote: &LoanQuote) -> Self {
        Self {
            full_name: applicant.full_name(),
            phone: applicant.phone.clone(),
            email: applicant.email.clone(),
            loan_amount: quote.parameters.principal,
            loan_term_months: quote.parameters.term_months,
            monthly_payment: quote.result.monthly_payment,
            total_payment: quote.result.total_payment,
            monthly_income: applicant.monthly_income,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedLead {
    pub lead_id: i64,
    pub contact_id: i64,
}
