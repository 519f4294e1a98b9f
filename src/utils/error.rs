use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoanDeskError {
    #[error("No loan calculation present; calculate the loan before submitting")]
    MissingCalculation,

    #[error("Required field is empty: {field}")]
    MissingField { field: String },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Application {id} is already in status '{status}'")]
    SameStatus { id: i64, status: String },

    #[error("Application {id} is not known to the application store")]
    UnknownApplication { id: i64 },

    #[error("Application {id} is not among the {loaded} loaded applications")]
    ApplicationNotLoaded { id: i64, loaded: usize },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote store answered {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Unexpected response from remote store: {message}")]
    UnexpectedResponse { message: String },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, LoanDeskError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected locally before any network call.
    Precondition,
    /// Transport failure or non-success answer from a remote collaborator.
    Remote,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LoanDeskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingCalculation
            | Self::MissingField { .. }
            | Self::SubmissionInFlight
            | Self::SameStatus { .. }
            | Self::UnknownApplication { .. }
            | Self::ApplicationNotLoaded { .. }
            | Self::ValidationError { .. } => ErrorCategory::Precondition,
            Self::Transport(_) | Self::RemoteStatus { .. } | Self::UnexpectedResponse { .. } => {
                ErrorCategory::Remote
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::Csv(_) | Self::Io(_) | Self::Serialization(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Precondition => match self {
                Self::SubmissionInFlight | Self::SameStatus { .. } => ErrorSeverity::Low,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Transport failures and non-success answers are reported the same way.
    pub fn is_remote_failure(&self) -> bool {
        self.category() == ErrorCategory::Remote
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingCalculation => "Сначала рассчитайте параметры кредита".to_string(),
            Self::MissingField { field } => format!("Заполните обязательное поле: {}", field),
            Self::SubmissionInFlight => "Заявка уже отправляется, дождитесь ответа".to_string(),
            Self::SameStatus { status, .. } => {
                format!("Заявка уже находится в статусе \"{}\"", status)
            }
            Self::UnknownApplication { id } => format!("Заявка {} не найдена", id),
            Self::ApplicationNotLoaded { id, loaded } => format!(
                "Заявка {} не найдена среди {} загруженных заявок",
                id, loaded
            ),
            Self::ValidationError { message } => message.clone(),
            _ if self.is_remote_failure() => {
                "Не удалось выполнить запрос. Попробуйте позже или свяжитесь с нами по телефону."
                    .to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Precondition => match self {
                Self::MissingCalculation => "Run the calculation first, then submit again",
                Self::SubmissionInFlight => "Wait for the pending submission to finish",
                Self::UnknownApplication { .. } => "Refresh the application list",
                Self::ApplicationNotLoaded { .. } => {
                    "Load more applications (raise --limit) or narrow the status filter"
                }
                _ => "Correct the input and retry",
            },
            ErrorCategory::Remote => "Check connectivity to the application store and retry",
            ErrorCategory::Configuration => "Check the configuration file and environment",
            ErrorCategory::Data => "Inspect the data being read or written",
        }
    }
}
