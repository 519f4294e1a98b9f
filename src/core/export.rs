use std::io::Write;

use serde::Serialize;

use crate::domain::model::LoanApplication;
use crate::utils::error::Result;

/// Flat row for spreadsheet export of the admin listing.
#[derive(Debug, Serialize)]
pub struct ApplicationRow<'a> {
    pub id: i64,
    pub application_number: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub loan_amount: f64,
    pub loan_term_months: u32,
    pub monthly_payment: Option<f64>,
    pub status: &'static str,
    pub created_at: String,
    pub processed_at: String,
}

impl<'a> From<&'a LoanApplication> for ApplicationRow<'a> {
    fn from(app: &'a LoanApplication) -> Self {
        Self {
            id: app.id,
            application_number: &app.application_number,
            first_name: &app.applicant.first_name,
            last_name: &app.applicant.last_name,
            phone: &app.applicant.phone,
            email: app.applicant.email.as_deref().unwrap_or(""),
            loan_amount: app.loan.principal,
            loan_term_months: app.loan.term_months,
            monthly_payment: app.payments.monthly_payment,
            status: app.status.as_str(),
            created_at: app.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            processed_at: app
                .processed_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }
}

pub fn write_csv<W: Write>(applications: &[&LoanApplication], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for app in applications {
        csv_writer.serialize(ApplicationRow::from(*app))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        ApplicantInfo, ApplicationStatus, LoanParameters, PaymentSnapshot,
    };
    use chrono::NaiveDate;

    #[test]
    fn test_csv_has_header_and_rows() {
        let app = LoanApplication {
            id: 5,
            application_number: "APP-2025-000005".to_string(),
            applicant: ApplicantInfo {
                first_name: "Иван".to_string(),
                last_name: "Петров".to_string(),
                phone: "+79001234567".to_string(),
                ..Default::default()
            },
            loan: LoanParameters {
                principal: 500_000.0,
                term_months: 12,
                annual_rate: 12.0,
            },
            payments: PaymentSnapshot {
                monthly_payment: Some(44_424.0),
                ..Default::default()
            },
            status: ApplicationStatus::Approved,
            created_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .unwrap(),
            processed_at: None,
            comment: None,
        };

        let mut out = Vec::new();
        write_csv(&[&app], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,application_number,first_name,last_name,phone,email,loan_amount,loan_term_months,monthly_payment,status,created_at,processed_at"
        );
        assert_eq!(
            lines.next().unwrap(),
            "5,APP-2025-000005,Иван,Петров,+79001234567,,500000.0,12,44424.0,approved,2025-03-01 09:30:00,"
        );
    }
}
