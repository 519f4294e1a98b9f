use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::model::{LeadDraft, PublishedLead};
use crate::domain::ports::LeadPublisher;
use crate::utils::error::{LoanDeskError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url};

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    #[serde(rename = "_embedded")]
    embedded: T,
}

#[derive(Debug, Deserialize)]
struct Contacts {
    contacts: Vec<EntityRef>,
}

#[derive(Debug, Deserialize)]
struct Leads {
    leads: Vec<EntityRef>,
}

#[derive(Debug, Deserialize)]
struct EntityRef {
    id: i64,
}

/// Forwards applications to an amoCRM account (v4 API) as a contact plus a lead.
#[derive(Debug, Clone)]
pub struct CrmLeadPublisher {
    client: Client,
    base_url: String,
    access_token: String,
}

impl CrmLeadPublisher {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let access_token = access_token.into();
        validate_url("crm.base_url", &base_url)?;
        validate_non_empty_string("crm.access_token", &access_token)?;

        Ok(Self {
            client: Client::new(),
            base_url,
            access_token,
        })
    }

    /// `https://<domain>` for a bare account domain such as `example.amocrm.ru`.
    pub fn for_domain(domain: &str, access_token: impl Into<String>) -> Result<Self> {
        Self::new(format!("https://{}", domain.trim()), access_token)
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, path: &str, payload: &Value) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoanDeskError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl LeadPublisher for CrmLeadPublisher {
    async fn publish(&self, lead: &LeadDraft) -> Result<PublishedLead> {
        let contacts: Embedded<Contacts> = self
            .post("/api/v4/contacts", &contact_payload(lead))
            .await?;
        let contact_id = first_id(contacts.embedded.contacts, "contacts")?;

        let leads: Embedded<Leads> = self
            .post("/api/v4/leads", &lead_payload(lead, contact_id))
            .await?;
        let lead_id = first_id(leads.embedded.leads, "leads")?;

        tracing::info!("CRM lead {} created for contact {}", lead_id, contact_id);
        Ok(PublishedLead {
            lead_id,
            contact_id,
        })
    }
}

fn first_id(entities: Vec<EntityRef>, kind: &str) -> Result<i64> {
    entities
        .first()
        .map(|e| e.id)
        .ok_or_else(|| LoanDeskError::UnexpectedResponse {
            message: format!("CRM returned no {}", kind),
        })
}

fn rubles(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0} руб.", amount)
    } else {
        format!("{:.2} руб.", amount)
    }
}

fn text_field(name: &str, value: String) -> Value {
    json!({ "field_name": name, "values": [{ "value": value }] })
}

pub fn contact_payload(lead: &LeadDraft) -> Value {
    json!([{
        "name": lead.full_name,
        "custom_fields_values": [
            {
                "field_code": "PHONE",
                "values": [{ "value": lead.phone, "enum_code": "WORK" }]
            },
            {
                "field_code": "EMAIL",
                "values": [{ "value": lead.email.clone().unwrap_or_default(), "enum_code": "WORK" }]
            }
        ]
    }])
}

pub fn lead_payload(lead: &LeadDraft, contact_id: i64) -> Value {
    json!([{
        "name": format!("Заявка на кредит {} - {}", rubles(lead.loan_amount), lead.full_name),
        "price": lead.loan_amount.trunc() as i64,
        "custom_fields_values": [
            text_field("Сумма кредита", rubles(lead.loan_amount)),
            text_field("Срок кредита", format!("{} мес.", lead.loan_term_months)),
            text_field("Ежемесячный платеж", rubles(lead.monthly_payment as f64)),
            text_field("Общая выплата", rubles(lead.total_payment as f64)),
            text_field("Доход", rubles(lead.monthly_income.unwrap_or(0.0))),
        ],
        "_embedded": { "contacts": [{ "id": contact_id }] }
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> LeadDraft {
        LeadDraft {
            full_name: "Иван Петров".to_string(),
            phone: "+79001234567".to_string(),
            email: None,
            loan_amount: 500_000.0,
            loan_term_months: 12,
            monthly_payment: 44_424,
            total_payment: 533_088,
            monthly_income: Some(120_000.0),
        }
    }

    #[test]
    fn test_lead_payload_embeds_contact() {
        let payload = lead_payload(&draft(), 77);
        let lead = &payload[0];

        assert_eq!(lead["name"], "Заявка на кредит 500000 руб. - Иван Петров");
        assert_eq!(lead["price"], 500000);
        assert_eq!(lead["_embedded"]["contacts"][0]["id"], 77);
        assert_eq!(lead["custom_fields_values"][2]["values"][0]["value"], "44424 руб.");
        assert_eq!(lead["custom_fields_values"][1]["values"][0]["value"], "12 мес.");
    }

    #[test]
    fn test_contact_payload_blank_email() {
        let payload = contact_payload(&draft());
        assert_eq!(payload[0]["name"], "Иван Петров");
        assert_eq!(payload[0]["custom_fields_values"][1]["values"][0]["value"], "");
    }

    #[test]
    fn test_requires_token() {
        assert!(CrmLeadPublisher::for_domain("example.amocrm.ru", "").is_err());
        assert!(CrmLeadPublisher::for_domain("example.amocrm.ru", "token").is_ok());
    }
}
