//! Export module for ControlClose
//!
//! - CSV: close report with one column per payment method
//! - JSON / YAML: full database dump with schema version and counts
//! - Receipts: the photos of a range copied into per-store folders

pub mod csv;
pub mod json;
pub mod receipts;
pub mod yaml;

pub use csv::{export_closes_csv, report_file_name, ReportRange};
pub use json::{export_full_json, read_json_export, ExportMetadata, FullExport, EXPORT_SCHEMA_VERSION};
pub use receipts::{export_receipts, receipt_file_name, ReceiptExport};
pub use yaml::{export_full_yaml, read_yaml_export};
