//! CLI commands for data export
//!
//! The CSV close report and the receipt photos for a date range, and full
//! JSON/YAML dumps of the database that can be verified later.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::auth::Route;
use crate::error::{CloseError, CloseResult};
use crate::export::{
    export_closes_csv, export_full_json, export_full_yaml, export_receipts, read_json_export,
    read_yaml_export, report_file_name, FullExport, ReportRange,
};
use crate::models::Store;
use crate::services::StoreService;

use super::{parse_date, CliContext};

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Close report for a date range as CSV
    Csv {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: String,
        /// Limit the report to one store
        #[arg(short, long)]
        store: Option<String>,
        /// Output file; defaults to closes_<store>_<from>_to_<to>.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Copy the receipt photos of a date range into per-store folders
    Receipts {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        store: Option<String>,
        /// Target directory, created when missing
        dir: PathBuf,
    },

    /// Full database as JSON
    Json {
        output: PathBuf,
        /// Single-line output
        #[arg(long)]
        compact: bool,
    },

    /// Full database as YAML
    Yaml { output: PathBuf },

    /// Check that a JSON or YAML export reads back consistently
    Verify { file: PathBuf },

    /// Show what a full export would contain without writing files
    Info,
}

/// Handle export commands
pub fn handle_export_command(ctx: &CliContext, cmd: ExportCommands) -> CloseResult<()> {
    ctx.authorize(Route::Dashboard)?;

    match cmd {
        ExportCommands::Csv {
            from,
            to,
            store,
            output,
        } => handle_export_csv(ctx, &from, &to, store.as_deref(), output),
        ExportCommands::Receipts {
            from,
            to,
            store,
            dir,
        } => {
            let (range, _) = parse_range(ctx, &from, &to, store.as_deref())?;
            let result = export_receipts(ctx.storage, ctx.settings, &range, &dir)?;
            println!("Copied {} receipts to: {}", result.copied, dir.display());
            for id in &result.missing {
                eprintln!("Warning: receipt of close {} is missing", id);
            }
            Ok(())
        }
        ExportCommands::Json { output, compact } => {
            let mut writer = create_file(&output)?;
            export_full_json(ctx.storage, &mut writer, !compact)?;
            finish(writer)?;
            println!("Full database exported to: {}", output.display());
            Ok(())
        }
        ExportCommands::Yaml { output } => {
            let mut writer = create_file(&output)?;
            export_full_yaml(ctx.storage, &mut writer)?;
            finish(writer)?;
            println!("Full database exported to: {}", output.display());
            Ok(())
        }
        ExportCommands::Verify { file } => handle_verify(&file),
        ExportCommands::Info => {
            print_summary(&FullExport::from_storage(ctx.storage)?);
            Ok(())
        }
    }
}

fn parse_range(
    ctx: &CliContext,
    from: &str,
    to: &str,
    store: Option<&str>,
) -> CloseResult<(ReportRange, Option<Store>)> {
    let start = parse_date(from)?;
    let end = parse_date(to)?;
    if start > end {
        return Err(CloseError::Validation(format!(
            "Range starts after it ends ({} > {})",
            start, end
        )));
    }

    let store = store
        .map(|s| StoreService::new(ctx.storage).resolve(s))
        .transpose()?;
    let range = ReportRange {
        start,
        end,
        store_id: store.as_ref().map(|s| s.id),
    };
    Ok((range, store))
}

fn handle_export_csv(
    ctx: &CliContext,
    from: &str,
    to: &str,
    store: Option<&str>,
    output: Option<PathBuf>,
) -> CloseResult<()> {
    let (range, store) = parse_range(ctx, from, to, store)?;

    // Build in memory so an empty range leaves no file behind
    let mut buffer = Vec::new();
    let rows = export_closes_csv(ctx.storage, ctx.settings, &range, &mut buffer)?;

    let output = output.unwrap_or_else(|| {
        PathBuf::from(report_file_name(store.as_ref().map(|s| s.name.as_str()), &range))
    });
    let mut writer = create_file(&output)?;
    writer
        .write_all(&buffer)
        .map_err(|e| CloseError::Export(e.to_string()))?;
    finish(writer)?;

    println!("Exported {} closes to: {}", rows, output.display());
    Ok(())
}

fn handle_verify(file: &Path) -> CloseResult<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| CloseError::Export(format!("Failed to read {}: {}", file.display(), e)))?;

    let is_yaml = file
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let export = if is_yaml {
        read_yaml_export(&content)?
    } else {
        read_json_export(&content)?
    };

    println!("Export is valid: {}", file.display());
    print_summary(&export);
    Ok(())
}

fn print_summary(export: &FullExport) {
    let meta = &export.metadata;
    println!("  Schema version:  {}", export.schema_version);
    println!("  Exported at:     {}", export.exported_at.format("%Y-%m-%d %H:%M"));
    println!("  Stores:          {}", meta.store_count);
    println!("  Payment methods: {}", meta.payment_method_count);
    println!("  Closes:          {}", meta.close_count);
    println!("  Users:           {}", meta.profile_count);
    println!("  Receipts:        {}", meta.receipt_count);
    if let (Some(first), Some(last)) = (&meta.earliest_close, &meta.latest_close) {
        println!("  Close dates:     {} to {}", first, last);
    }
}

fn create_file(path: &Path) -> CloseResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        CloseError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

fn finish(mut writer: BufWriter<File>) -> CloseResult<()> {
    writer
        .flush()
        .map_err(|e| CloseError::Export(e.to_string()))
}
