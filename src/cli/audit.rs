//! Audit log CLI command

use clap::Args;

use crate::audit::{AuditFilter, EntityType};
use crate::auth::Route;
use crate::error::{CloseError, CloseResult};

use super::CliContext;

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// store, payment_method, close, profile or company
    #[arg(short = 't', long)]
    pub entity_type: Option<String>,
    /// Entity ID as shown in listings
    #[arg(short = 'i', long)]
    pub entity_id: Option<String>,
    /// Show only the last N entries
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

pub fn handle_audit_command(ctx: &CliContext, args: AuditArgs) -> CloseResult<()> {
    ctx.authorize(Route::Admin)?;

    let entity_type = args
        .entity_type
        .as_deref()
        .map(|t| {
            EntityType::parse(t)
                .ok_or_else(|| CloseError::Validation(format!("Unknown entity type '{}'", t)))
        })
        .transpose()?;

    let entries = ctx.storage.audit().query(&AuditFilter {
        entity_type,
        entity_id: args.entity_id,
        limit: Some(args.limit),
    })?;

    if entries.is_empty() {
        println!("No audit entries found.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
