use crate::adapters::crm::CrmLeadPublisher;
use crate::adapters::http::HttpApplicationStore;
use crate::domain::model::{DEFAULT_INTEREST_RATE, OFFERED_TERMS};
use crate::utils::error::{LoanDeskError, Result};
use crate::utils::validation::{
    validate_positive_number, validate_range, validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "loan-desk.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub calculator: CalculatorConfig,
    pub crm: Option<CrmConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub list_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculatorConfig {
    pub default_rate: Option<f64>,
    pub offered_terms: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmConfig {
    pub domain: Option<String>,
    /// Overrides `https://<domain>`; handy for sandboxes.
    pub base_url: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub verbose: Option<bool>,
    pub json_logs: Option<bool>,
}

impl AppConfig {
    /// Reads `path` when given; otherwise `loan-desk.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LoanDeskError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LoanDeskError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn default_rate(&self) -> f64 {
        self.calculator.default_rate.unwrap_or(DEFAULT_INTEREST_RATE)
    }

    pub fn offered_terms(&self) -> Vec<u32> {
        self.calculator
            .offered_terms
            .clone()
            .unwrap_or_else(|| OFFERED_TERMS.to_vec())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.store.timeout_seconds.map(Duration::from_secs)
    }

    pub fn http_store(&self) -> Result<HttpApplicationStore> {
        let endpoint = validate_required_field("store.endpoint", &self.store.endpoint)?;
        HttpApplicationStore::with_timeout(endpoint.as_str(), self.timeout())
    }

    /// CRM publisher from the `[crm]` section, falling back to
    /// `AMOCRM_DOMAIN` / `AMOCRM_ACCESS_TOKEN`.
    pub fn crm_publisher(&self) -> Result<CrmLeadPublisher> {
        let section = self.crm.clone().unwrap_or_default();
        let from_env = |name: &str| std::env::var(name).ok();

        let token = resolved(section.access_token)
            .or_else(|| from_env("AMOCRM_ACCESS_TOKEN"))
            .ok_or_else(|| LoanDeskError::MissingConfigError {
                field: "crm.access_token".to_string(),
            })?;

        if let Some(base_url) = resolved(section.base_url) {
            return CrmLeadPublisher::new(base_url, token);
        }
        let domain = resolved(section.domain)
            .or_else(|| from_env("AMOCRM_DOMAIN"))
            .ok_or_else(|| LoanDeskError::MissingConfigError {
                field: "crm.domain".to_string(),
            })?;
        CrmLeadPublisher::for_domain(&domain, token)
    }
}

/// Drops blank values and placeholders whose variable was not set.
fn resolved(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && !v.contains("${"))
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.store.endpoint {
            validate_url("store.endpoint", endpoint)?;
        }
        if let Some(limit) = self.store.list_limit {
            validate_positive_number("store.list_limit", limit as usize, 1)?;
        }
        validate_range("calculator.default_rate", self.default_rate(), 0.0, 100.0)?;

        let terms = self.offered_terms();
        if terms.is_empty() || terms.contains(&0) {
            return Err(LoanDeskError::InvalidConfigValueError {
                field: "calculator.offered_terms".to_string(),
                value: format!("{:?}", terms),
                reason: "Offered terms must be a non-empty list of positive months".to_string(),
            });
        }
        Ok(())
    }
}
