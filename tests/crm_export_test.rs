use anyhow::Result;
use httpmock::prelude::*;
use loan_desk::core::calculator;
use loan_desk::domain::model::{ApplicantInfo, LeadDraft, LoanParameters};
use loan_desk::domain::ports::LeadPublisher;
use loan_desk::CrmLeadPublisher;
use serde_json::json;

fn lead() -> LeadDraft {
    let quote = calculator::quote(LoanParameters {
        principal: 500_000.0,
        term_months: 12,
        annual_rate: 12.0,
    })
    .expect("calculable");
    let applicant = ApplicantInfo {
        first_name: "Иван".to_string(),
        last_name: "Петров".to_string(),
        phone: "+79001234567".to_string(),
        email: Some("ivan@example.com".to_string()),
        monthly_income: Some(120_000.0),
        ..Default::default()
    };
    LeadDraft::new(&applicant, &quote)
}

#[tokio::test]
async fn test_publishes_contact_then_lead() -> Result<()> {
    let server = MockServer::start();

    let contacts = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v4/contacts")
            .header("authorization", "Bearer secret-token")
            .body_contains("Иван Петров");
        then.status(200)
            .json_body(json!({"_embedded": {"contacts": [{"id": 501}]}}));
    });
    let leads = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v4/leads")
            .header("authorization", "Bearer secret-token")
            .body_contains(r#""price":500000"#)
            .body_contains(r#""contacts":[{"id":501}]"#);
        then.status(200)
            .json_body(json!({"_embedded": {"leads": [{"id": 9001}]}}));
    });

    let publisher = CrmLeadPublisher::new(server.base_url(), "secret-token")?;
    let published = publisher.publish(&lead()).await?;

    contacts.assert();
    leads.assert();
    assert_eq!(published.contact_id, 501);
    assert_eq!(published.lead_id, 9001);
    Ok(())
}

#[tokio::test]
async fn test_crm_error_stops_before_lead() -> Result<()> {
    let server = MockServer::start();
    let contacts = server.mock(|when, then| {
        when.method(POST).path("/api/v4/contacts");
        then.status(401).body(r#"{"title": "Unauthorized"}"#);
    });
    let leads = server.mock(|when, then| {
        when.method(POST).path("/api/v4/leads");
        then.status(200);
    });

    let publisher = CrmLeadPublisher::new(server.base_url(), "expired")?;
    let err = publisher.publish(&lead()).await.unwrap_err();

    contacts.assert();
    assert_eq!(leads.hits(), 0);
    assert!(err.is_remote_failure());
    Ok(())
}

#[tokio::test]
async fn test_empty_contact_list_is_unexpected() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v4/contacts");
        then.status(200)
            .json_body(json!({"_embedded": {"contacts": []}}));
    });

    let publisher = CrmLeadPublisher::new(server.base_url(), "token")?;
    let err = publisher.publish(&lead()).await.unwrap_err();

    assert!(matches!(
        err,
        loan_desk::LoanDeskError::UnexpectedResponse { .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_publisher_from_config_section() -> Result<()> {
    let server = MockServer::start();
    let contacts = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v4/contacts")
            .header("authorization", "Bearer from-config");
        then.status(200)
            .json_body(json!({"_embedded": {"contacts": [{"id": 7}]}}));
    });
    let leads = server.mock(|when, then| {
        when.method(POST).path("/api/v4/leads");
        then.status(200)
            .json_body(json!({"_embedded": {"leads": [{"id": 8}]}}));
    });

    let config = loan_desk::AppConfig::from_toml_str(&format!(
        r#"
[store]
endpoint = "https://example.com/.netlify/functions/loan-applications"

[crm]
base_url = "{}"
access_token = "from-config"
"#,
        server.base_url()
    ))?;

    let published = config.crm_publisher()?.publish(&lead()).await?;

    contacts.assert();
    leads.assert();
    assert_eq!((published.lead_id, published.contact_id), (8, 7));
    Ok(())
}
