//! Concrete implementations of the outward-facing ports.

pub mod csv_store;
pub mod eastmoney;
pub mod file_config_adapter;
pub mod markdown_report;
pub mod report_scan;
