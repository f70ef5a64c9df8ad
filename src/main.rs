use std::collections::BTreeSet;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use controlclose::auth::Session;
use controlclose::cli::{
    handle_audit_command, handle_close_command, handle_company_command, handle_config_command,
    handle_dashboard_command, handle_export_command, handle_payment_command, handle_store_command,
    handle_user_command, AuditArgs, CliContext, CloseCommands, CompanyCommands, ConfigCommands,
    DashboardCommands, ExportCommands, PaymentCommands, StoreCommands, UserCommands,
};
use controlclose::config::{ControlClosePaths, Settings};
use controlclose::models::Role;
use controlclose::services::{CompanyService, ProfileService};
use controlclose::storage::{initialize_storage, Storage};

/// Environment variable holding the log filter (e.g. `controlclose=debug`)
const LOG_ENV: &str = "CONTROLCLOSE_LOG";

#[derive(Parser)]
#[command(
    name = "controlclose",
    version,
    about = "Daily cash-register close reconciliation for retail stores",
    long_about = "ControlClose records each store's end-of-day cash close, works out \
                  the theoretical cash fund from sales, payments, expenses and bank \
                  withdrawals, and flags any difference against the counted cash."
)]
struct Cli {
    /// Act as this user (username or ID); without it the local owner has full access
    #[arg(long = "as", global = true, env = "CONTROLCLOSE_USER", value_name = "USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize ControlClose with the default payment methods
    Init {
        /// Company name shown on reports
        #[arg(long)]
        company: Option<String>,
        /// Create a super admin with this username
        #[arg(long)]
        admin: Option<String>,
    },

    /// Settings and data locations
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Store management commands
    #[command(subcommand)]
    Store(StoreCommands),

    /// Payment method commands
    #[command(subcommand)]
    Payment(PaymentCommands),

    /// Record and review cash closes
    #[command(subcommand)]
    Close(CloseCommands),

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Company name and logo
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Aggregated views over closes
    #[command(subcommand)]
    Dashboard(DashboardCommands),

    /// Export closes or the whole database
    #[command(subcommand)]
    Export(ExportCommands),

    /// View the audit log
    Audit(AuditArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = ControlClosePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let Some(command) = cli.command else {
        println!("ControlClose - daily cash close reconciliation");
        println!();
        println!("Run 'controlclose --help' for usage information.");
        if !paths.is_initialized() {
            println!("Run 'controlclose init' to get started.");
        }
        return Ok(());
    };

    if !matches!(command, Commands::Init { .. }) && !paths.is_initialized() {
        bail!("ControlClose is not initialized. Run 'controlclose init' first.");
    }

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    let mut session = Session::new(&storage);
    session.subscribe(|event| debug!(?event, "auth event"));
    if let Some(user) = cli.user.as_deref() {
        session.sign_in(user)?;
    }

    let ctx = CliContext {
        storage: &storage,
        settings: &settings,
        session,
    };

    match command {
        Commands::Init { company, admin } => run_init(&paths, &settings, company, admin)?,
        Commands::Config(cmd) => handle_config_command(&ctx, cmd)?,
        Commands::Store(cmd) => handle_store_command(&ctx, cmd)?,
        Commands::Payment(cmd) => handle_payment_command(&ctx, cmd)?,
        Commands::Close(cmd) => handle_close_command(&ctx, cmd)?,
        Commands::User(cmd) => handle_user_command(&ctx, cmd)?,
        Commands::Company(cmd) => handle_company_command(&ctx, cmd)?,
        Commands::Dashboard(cmd) => handle_dashboard_command(&ctx, cmd)?,
        Commands::Export(cmd) => handle_export_command(&ctx, cmd)?,
        Commands::Audit(args) => handle_audit_command(&ctx, args)?,
    }

    Ok(())
}

fn run_init(
    paths: &ControlClosePaths,
    settings: &Settings,
    company: Option<String>,
    admin: Option<String>,
) -> Result<()> {
    println!("Initializing ControlClose at: {}", paths.base_dir().display());
    initialize_storage(paths)?;
    let mut settings = settings.clone();
    settings.setup_completed = true;
    settings.save(paths)?;

    // Reopen so the seeded payment methods are loaded
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;
    if let Some(name) = company {
        CompanyService::new(&storage).upsert(Some(&name), None)?;
        println!("Company: {}", name);
    }
    if let Some(username) = admin {
        let profile =
            ProfileService::new(&storage).create(&username, Role::SuperAdmin, None, BTreeSet::new())?;
        println!("Super admin created: {}", profile.username);
    }

    println!("Initialization complete!");
    println!();
    println!("Payment methods 'Contanti' (cash) and 'POS' have been created.");
    println!("Run 'controlclose store create <NAME>' to add your first store.");
    Ok(())
}
