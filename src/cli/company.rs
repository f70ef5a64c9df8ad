//! Company settings CLI commands

use clap::Subcommand;

use crate::auth::Route;
use crate::error::CloseResult;
use crate::services::CompanyService;

use super::CliContext;

#[derive(Subcommand)]
pub enum CompanyCommands {
    /// Show the company name and logo
    Show,
    /// Set the company name and/or logo
    Set {
        #[arg(short, long)]
        name: Option<String>,
        /// Logo URL; pass "" to remove it
        #[arg(short, long)]
        logo: Option<String>,
    },
}

pub fn handle_company_command(ctx: &CliContext, cmd: CompanyCommands) -> CloseResult<()> {
    let service = CompanyService::new(ctx.storage);

    match cmd {
        CompanyCommands::Show => match service.get()? {
            Some(company) => {
                println!("Company: {}", company.company_name);
                println!("  Logo:    {}", company.logo_url.as_deref().unwrap_or("-"));
                println!(
                    "  Updated: {}",
                    company.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            None => println!("Company settings not set. Use 'controlclose company set --name <NAME>'."),
        },
        CompanyCommands::Set { name, logo } => {
            ctx.authorize(Route::Admin)?;
            if name.is_none() && logo.is_none() {
                println!("No changes specified. Use --name or --logo.");
                return Ok(());
            }
            let company = service.upsert(name.as_deref(), logo.as_deref())?;
            println!("Company settings saved: {}", company.company_name);
        }
    }

    Ok(())
}
