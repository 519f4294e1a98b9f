use crate::domain::model::{ApplicationStatus, StatusFilter};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "loan-desk")]
#[command(about = "Loan calculator, application intake and admin review")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "LOAN_DESK_ENDPOINT", help = "Application store URL")]
    pub endpoint: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Compute monthly payment, total and overpayment
    Calculate(LoanArgs),
    /// Calculate and submit a loan application
    Apply(ApplyArgs),
    /// List submitted applications
    List(ListArgs),
    /// Move an application to another status
    SetStatus(SetStatusArgs),
    /// Check that the application store answers
    Health,
}

#[derive(Debug, Clone, Args)]
pub struct LoanArgs {
    #[arg(long, help = "Loan amount")]
    pub amount: String,

    #[arg(long, help = "Term in months")]
    pub term: String,

    #[arg(long, help = "Annual interest rate, percent")]
    pub rate: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long, help = "Monthly income")]
    pub income: Option<String>,

    #[arg(long, help = "employed, self_employed, pensioner, student or unemployed")]
    pub employment: Option<String>,

    #[arg(long)]
    pub purpose: Option<String>,

    #[arg(long, help = "Also forward the application to the CRM")]
    pub export_crm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long, default_value = "all", help = "all, pending, processing, approved, rejected or completed")]
    pub status: StatusFilter,

    #[arg(long, help = "Search by number, name or phone")]
    pub search: Option<String>,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct SetStatusArgs {
    #[arg(long)]
    pub id: i64,

    #[arg(long)]
    pub status: ApplicationStatus,

    #[arg(long)]
    pub comment: Option<String>,

    #[arg(long, help = "How many recent applications to load when looking up the id")]
    pub limit: Option<u32>,
}
