//! YAML Export functionality
//!
//! Same content as the JSON dump, readable by people.

use std::io::Write;

use crate::error::{CloseError, CloseResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

pub fn export_full_yaml<W: Write>(storage: &Storage, mut writer: W) -> CloseResult<()> {
    let export = FullExport::from_storage(storage)?;
    let company = export
        .company
        .as_ref()
        .map(|c| c.company_name.as_str())
        .unwrap_or("ControlClose");

    let header = format!(
        "# {} cash close export\n# Generated: {}\n# App Version: {}\n\n",
        company, export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| CloseError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| CloseError::Export(e.to_string()))?;
    Ok(())
}

/// Read a YAML export back and validate it; comment lines are ignored
pub fn read_yaml_export(yaml_str: &str) -> CloseResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| CloseError::Export(e.to_string()))?;
    export.validate().map_err(CloseError::Export)?;
    Ok(export)
}
