use clap::Parser;
use loan_desk::config::cli::{ApplyArgs, Command, ListArgs, LoanArgs, OutputFormat, SetStatusArgs};
use loan_desk::core::calculator;
use loan_desk::core::export::write_csv;
use loan_desk::domain::model::{LeadDraft, LoanApplication, LoanParameters};
use loan_desk::domain::ports::LeadPublisher;
use loan_desk::utils::error::ErrorSeverity;
use loan_desk::utils::{logger, validation::Validate};
use loan_desk::{
    AdminBoard, AppConfig, ApplicationDesk, CliConfig, FormField, HttpApplicationStore,
    LoanDeskError, Result,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();
    let config = load_config(&cli);

    let monitoring = config
        .as_ref()
        .ok()
        .and_then(|c| c.monitoring.clone())
        .unwrap_or_default();
    let verbose = cli.verbose || monitoring.verbose.unwrap_or(false);
    if cli.json_logs || monitoring.json_logs.unwrap_or(false) {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let outcome = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        std::process::exit(exit_code(e.severity()));
    }
}

/// Every refused or failed command exits non-zero.
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn load_config(cli: &CliConfig) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(endpoint) = &cli.endpoint {
        config.store.endpoint = Some(endpoint.clone());
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: CliConfig, config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Calculate(args) => calculate(&args, &config),
        Command::Apply(args) => apply(args, &config).await,
        Command::List(args) => list(args, &config).await,
        Command::SetStatus(args) => set_status(args, &config).await,
        Command::Health => health(&config).await,
    }
}

fn loan_parameters(args: &LoanArgs, config: &AppConfig) -> Result<LoanParameters> {
    let rate = args
        .rate
        .clone()
        .unwrap_or_else(|| config.default_rate().to_string());
    let params = calculator::parse_form(&args.amount, &args.term, &rate).ok_or_else(|| {
        LoanDeskError::ValidationError {
            message: "Укажите сумму, срок и ставку числами".to_string(),
        }
    })?;

    if !config.offered_terms().contains(&params.term_months) {
        tracing::warn!(
            "Term {} months is not among the offered terms {:?}",
            params.term_months,
            config.offered_terms()
        );
    }
    Ok(params)
}

fn not_calculable() -> LoanDeskError {
    LoanDeskError::ValidationError {
        message: "Параметры кредита не позволяют выполнить расчёт".to_string(),
    }
}

fn calculate(args: &LoanArgs, config: &AppConfig) -> Result<()> {
    let params = loan_parameters(args, config)?;
    let result = calculator::calculate(&params).ok_or_else(not_calculable)?;

    println!("Сумма кредита:       {} ₽", params.principal);
    println!("Срок:                {} мес.", params.term_months);
    println!("Ставка:              {} %", params.annual_rate);
    println!("Ежемесячный платёж:  {} ₽", result.monthly_payment);
    println!("Общая сумма:         {} ₽", result.total_payment);
    println!("Переплата:           {} ₽", result.overpayment);
    Ok(())
}

async fn apply(args: ApplyArgs, config: &AppConfig) -> Result<()> {
    let params = loan_parameters(&args.loan, config)?;
    let mut desk = ApplicationDesk::new(config.http_store()?);

    let result = desk.calculate(params).ok_or_else(not_calculable)?;
    println!("Ежемесячный платёж: {} ₽", result.monthly_payment);

    desk.edit(FormField::FirstName, args.first_name);
    desk.edit(FormField::LastName, args.last_name);
    desk.edit(FormField::Phone, args.phone);
    let optional = [
        (FormField::Email, args.email),
        (FormField::MonthlyIncome, args.income),
        (FormField::EmploymentType, args.employment),
        (FormField::LoanPurpose, args.purpose),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            desk.edit(field, value);
        }
    }

    // CRM settings are checked before anything is stored
    let publisher = args
        .export_crm
        .then(|| config.crm_publisher())
        .transpose()?;
    let lead = match (&publisher, desk.quote()) {
        (Some(_), Some(quote)) => Some(LeadDraft::new(&desk.form().to_applicant()?, quote)),
        _ => None,
    };

    let receipt = desk.submit().await?;
    println!(
        "✅ Заявка отправлена! Номер заявки: {}. Мы свяжемся с вами в ближайшее время.",
        receipt.application_number
    );

    if let (Some(publisher), Some(lead)) = (publisher, lead) {
        let published = publisher.publish(&lead).await?;
        println!(
            "📨 Лид {} создан в CRM (контакт {})",
            published.lead_id, published.contact_id
        );
    }
    Ok(())
}

fn admin_board(config: &AppConfig, limit: Option<u32>) -> Result<AdminBoard<HttpApplicationStore>> {
    let board = AdminBoard::new(config.http_store()?);
    Ok(match limit.or(config.store.list_limit) {
        Some(limit) => board.with_list_limit(limit),
        None => board,
    })
}

async fn list(args: ListArgs, config: &AppConfig) -> Result<()> {
    let mut board = admin_board(config, args.limit)?;
    board.set_status_filter(args.status).await?;
    if let Some(term) = args.search {
        board.set_search_term(term);
    }

    let visible = board.visible();
    match args.format {
        OutputFormat::Table => print_table(&visible),
        OutputFormat::Csv => write_csv(&visible, std::io::stdout().lock())?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&visible)?),
    }

    let stats = board.stats();
    eprintln!(
        "Всего: {}  Ожидают: {}  Одобрено: {}  Отклонено: {}",
        stats.total, stats.pending, stats.approved, stats.rejected
    );
    Ok(())
}

fn print_table(applications: &[&LoanApplication]) {
    println!(
        "{:<6} {:<18} {:<28} {:<18} {:>12} {:>5} {:>12} {:<12} {:<19}",
        "ID", "Номер", "Клиент", "Телефон", "Сумма", "Срок", "Платёж", "Статус", "Создана"
    );
    for app in applications {
        println!(
            "{:<6} {:<18} {:<28} {:<18} {:>12.0} {:>5} {:>12} {:<12} {:<19}",
            app.id,
            app.application_number,
            app.applicant.full_name(),
            app.applicant.phone,
            app.loan.principal,
            app.loan.term_months,
            app.payments
                .monthly_payment
                .map(|p| format!("{:.0}", p))
                .unwrap_or_else(|| "-".to_string()),
            app.status.label(),
            app.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

async fn set_status(args: SetStatusArgs, config: &AppConfig) -> Result<()> {
    let mut board = admin_board(config, args.limit)?;
    board.refresh().await?;
    if let Some(comment) = args.comment {
        board.set_comment(comment);
    }

    board.transition(args.id, args.status).await?;
    println!(
        "✅ Заявка переведена в статус \"{}\"",
        args.status.label()
    );
    Ok(())
}

async fn health(config: &AppConfig) -> Result<()> {
    let health = config.http_store()?.health().await?;
    if health.is_healthy() {
        println!("✅ {} is healthy", health.service.as_deref().unwrap_or("store"));
        Ok(())
    } else {
        Err(LoanDeskError::UnexpectedResponse {
            message: format!("store reported status '{}'", health.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn apply_args(extra: &[&str]) -> ApplyArgs {
        let mut argv = vec![
            "loan-desk", "apply", "--amount", "500000", "--term", "12", "--first-name", "Иван",
            "--last-name", "Петров", "--phone", "+79001234567",
        ];
        argv.extend_from_slice(extra);
        match CliConfig::try_parse_from(argv).unwrap().command {
            Command::Apply(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_every_failure_exits_non_zero() {
        for severity in [
            ErrorSeverity::Low,
            ErrorSeverity::Medium,
            ErrorSeverity::High,
            ErrorSeverity::Critical,
        ] {
            assert_ne!(exit_code(severity), 0, "{:?}", severity);
        }

        let same = LoanDeskError::SameStatus {
            id: 1,
            status: "approved".to_string(),
        };
        assert_ne!(exit_code(same.severity()), 0);
    }

    #[tokio::test]
    async fn test_apply_checks_crm_settings_before_submitting() {
        let server = MockServer::start();
        let store = server.mock(|when, then| {
            when.method(POST).path("/loan-applications");
            then.status(201)
                .json_body(serde_json::json!({"application_number": "APP-2025-000001"}));
        });

        let config = AppConfig::from_toml_str(&format!(
            r#"
[store]
endpoint = "{}"

[crm]
base_url = "not a url"
access_token = "token"
"#,
            server.url("/loan-applications")
        ))
        .unwrap();

        let err = apply(apply_args(&["--export-crm"]), &config)
            .await
            .unwrap_err();
        assert_eq!(err.category(), loan_desk::utils::error::ErrorCategory::Configuration);
        assert_eq!(store.hits(), 0);

        apply(apply_args(&[]), &config).await.unwrap();
        store.assert_hits(1);
    }
}
